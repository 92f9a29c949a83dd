//! Deposition onto a plane seed: walkers spawn only above the substrate and
//! the run records its bounding-height history.
use lattice_dla::prelude::*;
use lattice_dla_examples::{create_output, init_tracing};
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut aggregate =
        Aggregate3d::try_new(LatticeKind::Square, AttractorKind::Plane, 64, 0.8)?.with_seed(11);
    aggregate.set_spawn_source(true, false)?;
    aggregate.set_radii_samples(25);

    let report = aggregate.generate(10_000);
    info!(
        "Deposited {} particles, peak height {}, {} failed stick draws.",
        report.size,
        aggregate.span(),
        report.failed_stick_draws
    );

    let mut surface = create_output("plane-3d-growth.tsv")?;
    aggregate.write(&mut surface, true)?;

    let mut history = create_output("plane-3d-growth-heights.tsv")?;
    aggregate.write_radii_history(&mut history)?;

    Ok(())
}
