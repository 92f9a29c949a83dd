//! Grows a line-seeded aggregate on one thread while a consumer drains the
//! stream buffer with a cursor, the way a visualisation front-end would.
use std::thread;
use std::time::Duration;

use lattice_dla::prelude::*;
use lattice_dla_examples::init_tracing;
use tracing::info;

const TARGET: usize = 20_000;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut aggregate =
        Aggregate2d::try_new(LatticeKind::Square, AttractorKind::Line, 200, 1.0)?.with_seed(7);
    let handle = aggregate.handle();

    let producer = thread::spawn(move || {
        let report = aggregate.generate(TARGET);
        (aggregate, report)
    });

    let mut cursor = 0;
    let mut batches = 0;
    while cursor < TARGET {
        let slice = handle.consume_buffer(cursor);
        if slice.is_empty() {
            thread::sleep(Duration::from_millis(1));
            continue;
        }
        cursor += slice.len();
        batches += 1;
        if batches % 50 == 0 {
            info!(
                "Streamed {} particles in {} batches, span {}.",
                cursor,
                batches,
                handle.span()
            );
        }
    }

    let (aggregate, report) = producer.join().expect("producer thread");
    info!(
        "Producer finished with {} particles; consumer drained {} in {} batches.",
        report.size, cursor, batches
    );
    assert_eq!(cursor, aggregate.size());
    Ok(())
}
