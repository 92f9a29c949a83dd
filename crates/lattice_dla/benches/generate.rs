use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use lattice_dla::prelude::*;

fn bench_generate_2d(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_2d");
    for &n in &[500usize, 2_000] {
        group.bench_function(format!("square_point_{n}"), |b| {
            b.iter_batched(
                || {
                    Aggregate2d::try_new(LatticeKind::Square, AttractorKind::Point, 0, 1.0)
                        .expect("valid configuration")
                        .with_seed(42)
                },
                |mut aggregate| black_box(aggregate.generate(n)),
                BatchSize::SmallInput,
            )
        });
    }
    group.bench_function("triangle_point_500_sticky_half", |b| {
        b.iter_batched(
            || {
                Aggregate2d::try_new(LatticeKind::Triangle, AttractorKind::Point, 0, 0.5)
                    .expect("valid configuration")
                    .with_seed(42)
            },
            |mut aggregate| black_box(aggregate.generate(500)),
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_generate_3d(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate_3d");
    group.bench_function("square_point_500", |b| {
        b.iter_batched(
            || {
                Aggregate3d::try_new(LatticeKind::Square, AttractorKind::Point, 0, 1.0)
                    .expect("valid configuration")
                    .with_seed(42)
            },
            |mut aggregate| black_box(aggregate.generate(500)),
            BatchSize::SmallInput,
        )
    });
    group.bench_function("square_plane_500", |b| {
        b.iter_batched(
            || {
                Aggregate3d::try_new(LatticeKind::Square, AttractorKind::Plane, 24, 1.0)
                    .expect("valid configuration")
                    .with_seed(42)
            },
            |mut aggregate| black_box(aggregate.generate(500)),
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_generate_2d, bench_generate_3d);
criterion_main!(benches);
