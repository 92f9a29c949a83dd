//! Geometry tags selecting the walk neighbourhood, the seed structure, and
//! the spawn half-spaces.
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Neighbourhood used by the random-walk stepper.
///
/// `Square` is a square lattice in 2D and cubic in 3D; `Triangle` is a
/// triangular lattice in 2D and its prism extension (the six in-plane moves
/// plus the two vertical ones) in 3D.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LatticeKind {
    #[default]
    Square,
    Triangle,
}

/// Seed geometry the walkers aggregate onto.
///
/// The attractor also selects the distance metric used for the aggregate
/// extremum: squared Euclidean distance to the origin for `Point`, squared
/// distance to the x-axis for `Line`, and the z-coordinate for `Plane`.
/// `Plane` is only valid for three-dimensional aggregates.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AttractorKind {
    #[default]
    Point,
    Line,
    Plane,
}

impl AttractorKind {
    /// Converts a metric value into the bounding radius it represents:
    /// the square root for the squared metrics, the value itself for `Plane`.
    pub fn radius_of_metric(self, metric: i64) -> f64 {
        match self {
            AttractorKind::Point | AttractorKind::Line => (metric as f64).sqrt(),
            AttractorKind::Plane => metric as f64,
        }
    }
}

/// Which half-spaces of the spawn envelope may emit walkers.
///
/// Constructed through [`SpawnSource::new`] so at least one half-space is
/// always enabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnSource {
    above: bool,
    below: bool,
}

impl Default for SpawnSource {
    fn default() -> Self {
        Self {
            above: true,
            below: true,
        }
    }
}

impl SpawnSource {
    pub fn new(above: bool, below: bool) -> Result<Self> {
        if !above && !below {
            return Err(Error::EmptySpawnSource);
        }
        Ok(Self { above, below })
    }

    #[inline]
    pub fn above(self) -> bool {
        self.above
    }

    #[inline]
    pub fn below(self) -> bool {
        self.below
    }

    /// Whether spawning is unrestricted.
    #[inline]
    pub fn is_full(self) -> bool {
        self.above && self.below
    }
}
