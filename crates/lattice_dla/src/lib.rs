#![forbid(unsafe_code)]
//! lattice_dla: diffusion-limited aggregation on 2D and 3D integer lattices.
//!
//! Modules:
//! - geometry: lattice, attractor, and spawn half-space tags
//! - cell: coordinate capabilities (step, reflect, spawn, metric) for 2D and 3D cells
//! - rng: the uniform random source owned by each aggregate
//! - heap: max-heap over cells with a runtime-selectable distance metric
//! - store: membership, insertion order, extremum, and stream buffer
//! - aggregate: the growth driver, facade, and consumer streaming
pub mod aggregate;
pub mod cell;
pub mod error;
pub mod geometry;
pub mod heap;
pub mod rng;
pub mod store;

/// Convenient re-exports for common types. Import with `use lattice_dla::prelude::*;`.
pub mod prelude {
    pub use crate::aggregate::{
        Aggregate, Aggregate2d, Aggregate3d, AggregateHandle, GrowthReport,
    };
    pub use crate::cell::Cell;
    pub use crate::error::{Error, Result};
    pub use crate::geometry::{AttractorKind, LatticeKind, SpawnSource};
    pub use crate::heap::MetricHeap;
    pub use crate::rng::UniformSource;
}
