//! Shared helpers for the demo binaries.
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Initialises a tracing subscriber for the demo binaries. Respects
/// `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Buffered writer for a demo output file.
pub fn create_output(path: impl AsRef<Path>) -> anyhow::Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}
