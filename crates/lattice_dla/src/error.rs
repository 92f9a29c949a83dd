//! Error types and result alias for the crate.
//!
//! All fallible setters validate their arguments before touching any state,
//! so an [`enum@Error`] never leaves an aggregate half-configured.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    #[error("stickiness coefficient {0} is outside (0, 1]")]
    StickinessOutOfRange(f64),

    #[error("plane attractors require a three-dimensional lattice")]
    PlaneRequiresThreeDimensions,

    #[error("at least one spawn half-space must stay enabled")]
    EmptySpawnSource,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
