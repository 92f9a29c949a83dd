use lattice_dla::prelude::*;
use lattice_dla_examples::{create_output, init_tracing};
use tracing::info;

fn main() -> anyhow::Result<()> {
    init_tracing();

    let mut aggregate = Aggregate2d::try_new(LatticeKind::Square, AttractorKind::Point, 0, 1.0)?
        .with_seed(2025);
    let report = aggregate.generate(5_000);
    info!(
        "Grew {} particles, span {}, fractal dimension {:.3}.",
        report.size,
        aggregate.span(),
        aggregate.estimate_fractal_dimension()
    );

    // Growth order, one coordinate per line: replayable by a renderer.
    let mut sorted = create_output("point-2d-basic-sorted.tsv")?;
    aggregate.write(&mut sorted, true)?;

    // Indexed dump of the membership map.
    let mut indexed = create_output("point-2d-basic.tsv")?;
    aggregate.write(&mut indexed, false)?;

    Ok(())
}
