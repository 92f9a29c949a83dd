//! Coordinate capabilities for 2D and 3D lattice cells.
//!
//! The engine is generic over the coordinate tuple; everything that depends
//! on dimensionality (the step table, the reflection envelope, spawn
//! placement, attractor seeding, the distance metric) lives behind [`Cell`],
//! implemented for [`glam::IVec2`] and [`glam::IVec3`]. The tag matches stay
//! branch-local so the hot walk loop inlines cleanly.
use std::fmt::Debug;
use std::hash::Hash;
use std::io::{self, Write};

use glam::{IVec2, IVec3};

use crate::geometry::{AttractorKind, LatticeKind, SpawnSource};
use crate::rng::UniformSource;

/// Walkers may stray this many lattice units past the spawn bound before
/// being reflected.
const REFLECT_EPSILON: i32 = 2;
/// Offset added to the spawn diameter so walkers never spawn directly onto
/// the aggregate.
const SPAWN_OFFSET: i32 = 16;

/// Capability set for an integer lattice coordinate.
pub trait Cell: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Lattice dimensionality (2 or 3).
    const DIMENSION: u32;

    /// Interop point type handed to renderers and other math stacks.
    type Point: Copy + Debug + Send;

    fn origin() -> Self;

    /// Whether this dimensionality supports the given attractor geometry.
    fn supports_attractor(attractor: AttractorKind) -> bool;

    /// Cells occupied by the attractor seed structure itself.
    fn attractor_cells(attractor: AttractorKind, size: u32) -> Vec<Self>;

    /// Attractor-dependent distance metric: squared Euclidean distance to
    /// the origin for `Point`, squared distance to the x-axis for `Line`,
    /// the raw z-coordinate for `Plane`.
    fn metric(self, attractor: AttractorKind) -> i64;

    /// One unbiased random-walk step, computed from the single draw `u`.
    fn step(self, lattice: LatticeKind, u: f64) -> Self;

    /// Snaps the walker back to `previous` if it left the allowed envelope.
    /// Returns the (possibly reflected) position and whether a reflection
    /// occurred. Never consumes randomness.
    fn reflect(
        self,
        previous: Self,
        attractor: AttractorKind,
        attractor_size: u32,
        spawn_diameter: i32,
    ) -> (Self, bool);

    /// Places a walker uniformly on the spawn envelope sized for
    /// `max_radius`, honouring the spawn half-space restriction. Returns the
    /// spawn position and the envelope diameter.
    fn spawn(
        source: &mut UniformSource,
        attractor: AttractorKind,
        attractor_size: u32,
        spawn: SpawnSource,
        max_radius: f64,
    ) -> (Self, i32);

    fn to_point(self) -> Self::Point;

    /// Writes the cell as tab-separated axis values, without a newline.
    fn write_tsv<W: Write>(self, writer: &mut W) -> io::Result<()>;
}

/// Envelope diameter for the current aggregate extent: twice the truncated
/// bounding radius plus the spawn offset.
#[inline]
fn envelope_diameter(max_radius: f64) -> i32 {
    2 * max_radius as i32 + SPAWN_OFFSET
}

/// Uniform integer in [-extent, extent].
#[inline]
fn symmetric_span(source: &mut UniformSource, extent: i32) -> i32 {
    (2.0 * extent as f64 * (source.next_probability() - 0.5)) as i32
}

/// Uniform integer over the allowed portion of [-extent, extent]: the full
/// range when both half-spaces spawn, otherwise only the permitted half.
#[inline]
fn restricted_span(source: &mut UniformSource, extent: i32, spawn: SpawnSource) -> i32 {
    if spawn.is_full() {
        symmetric_span(source, extent)
    } else if spawn.above() {
        (extent as f64 * source.next_probability()) as i32
    } else {
        -((extent as f64 * source.next_probability()) as i32)
    }
}

/// Uniform integer along the attractor segment, [-size/2, size/2].
#[inline]
fn segment_span(source: &mut UniformSource, size: u32) -> i32 {
    (size as f64 * (source.next_probability() - 0.5)) as i32
}

/// Sign of the normal-axis face, with disabled half-spaces folded onto the
/// allowed side.
#[inline]
fn face_sign(positive: bool, spawn: SpawnSource) -> i32 {
    if !spawn.below() {
        1
    } else if !spawn.above() {
        -1
    } else if positive {
        1
    } else {
        -1
    }
}

impl Cell for IVec2 {
    const DIMENSION: u32 = 2;
    type Point = mint::Point2<i32>;

    fn origin() -> Self {
        IVec2::ZERO
    }

    fn supports_attractor(attractor: AttractorKind) -> bool {
        !matches!(attractor, AttractorKind::Plane)
    }

    fn attractor_cells(attractor: AttractorKind, size: u32) -> Vec<Self> {
        match attractor {
            AttractorKind::Point => vec![IVec2::ZERO],
            // Plane is rejected for 2D aggregates before reaching here.
            AttractorKind::Line | AttractorKind::Plane => {
                let half = size as i32 / 2;
                (-half..=half).map(|x| IVec2::new(x, 0)).collect()
            }
        }
    }

    fn metric(self, attractor: AttractorKind) -> i64 {
        let x = self.x as i64;
        let y = self.y as i64;
        match attractor {
            AttractorKind::Point => x * x + y * y,
            AttractorKind::Line | AttractorKind::Plane => y * y,
        }
    }

    fn step(self, lattice: LatticeKind, u: f64) -> Self {
        let IVec2 { mut x, mut y } = self;
        match lattice {
            LatticeKind::Square => {
                if u < 0.25 {
                    x += 1;
                } else if u < 0.5 {
                    x -= 1;
                } else if u < 0.75 {
                    y += 1;
                } else {
                    y -= 1;
                }
            }
            LatticeKind::Triangle => {
                if u < 1.0 / 6.0 {
                    x += 1;
                } else if u < 2.0 / 6.0 {
                    x -= 1;
                } else if u < 3.0 / 6.0 {
                    x += 1;
                    y += 1;
                } else if u < 4.0 / 6.0 {
                    x += 1;
                    y -= 1;
                } else if u < 5.0 / 6.0 {
                    x -= 1;
                    y += 1;
                } else {
                    x -= 1;
                    y -= 1;
                }
            }
        }
        IVec2::new(x, y)
    }

    fn reflect(
        self,
        previous: Self,
        attractor: AttractorKind,
        attractor_size: u32,
        spawn_diameter: i32,
    ) -> (Self, bool) {
        let escaped = match attractor {
            AttractorKind::Point => {
                let bound = spawn_diameter / 2 + REFLECT_EPSILON;
                self.x.abs() > bound || self.y.abs() > bound
            }
            AttractorKind::Line | AttractorKind::Plane => {
                self.x.abs() > attractor_size as i32 / 2 + REFLECT_EPSILON
                    || self.y.abs() > spawn_diameter + REFLECT_EPSILON
            }
        };
        if escaped {
            (previous, true)
        } else {
            (self, false)
        }
    }

    fn spawn(
        source: &mut UniformSource,
        attractor: AttractorKind,
        attractor_size: u32,
        spawn: SpawnSource,
        max_radius: f64,
    ) -> (Self, i32) {
        let diameter = envelope_diameter(max_radius);
        let face = source.next_probability();
        let cell = match attractor {
            AttractorKind::Point => {
                let half = diameter / 2;
                if face < 0.25 {
                    IVec2::new(symmetric_span(source, half), half * face_sign(true, spawn))
                } else if face < 0.5 {
                    IVec2::new(symmetric_span(source, half), half * face_sign(false, spawn))
                } else if face < 0.75 {
                    IVec2::new(half, restricted_span(source, half, spawn))
                } else {
                    IVec2::new(-half, restricted_span(source, half, spawn))
                }
            }
            AttractorKind::Line | AttractorKind::Plane => {
                let sign = face_sign(face < 0.5, spawn);
                IVec2::new(segment_span(source, attractor_size), diameter * sign)
            }
        };
        (cell, diameter)
    }

    fn to_point(self) -> Self::Point {
        self.into()
    }

    fn write_tsv<W: Write>(self, writer: &mut W) -> io::Result<()> {
        write!(writer, "{}\t{}", self.x, self.y)
    }
}

impl Cell for IVec3 {
    const DIMENSION: u32 = 3;
    type Point = mint::Point3<i32>;

    fn origin() -> Self {
        IVec3::ZERO
    }

    fn supports_attractor(_attractor: AttractorKind) -> bool {
        true
    }

    fn attractor_cells(attractor: AttractorKind, size: u32) -> Vec<Self> {
        let half = size as i32 / 2;
        match attractor {
            AttractorKind::Point => vec![IVec3::ZERO],
            AttractorKind::Line => (-half..=half).map(|x| IVec3::new(x, 0, 0)).collect(),
            AttractorKind::Plane => (-half..=half)
                .flat_map(|x| (-half..=half).map(move |y| IVec3::new(x, y, 0)))
                .collect(),
        }
    }

    fn metric(self, attractor: AttractorKind) -> i64 {
        let x = self.x as i64;
        let y = self.y as i64;
        let z = self.z as i64;
        match attractor {
            AttractorKind::Point => x * x + y * y + z * z,
            AttractorKind::Line => y * y + z * z,
            AttractorKind::Plane => z,
        }
    }

    fn step(self, lattice: LatticeKind, u: f64) -> Self {
        let IVec3 { mut x, mut y, mut z } = self;
        match lattice {
            LatticeKind::Square => {
                if u < 1.0 / 6.0 {
                    x += 1;
                } else if u < 2.0 / 6.0 {
                    x -= 1;
                } else if u < 3.0 / 6.0 {
                    y += 1;
                } else if u < 4.0 / 6.0 {
                    y -= 1;
                } else if u < 5.0 / 6.0 {
                    z += 1;
                } else {
                    z -= 1;
                }
            }
            LatticeKind::Triangle => {
                if u < 1.0 / 8.0 {
                    x += 1;
                } else if u < 2.0 / 8.0 {
                    x -= 1;
                } else if u < 3.0 / 8.0 {
                    x += 1;
                    y += 1;
                } else if u < 4.0 / 8.0 {
                    x += 1;
                    y -= 1;
                } else if u < 5.0 / 8.0 {
                    x -= 1;
                    y += 1;
                } else if u < 6.0 / 8.0 {
                    x -= 1;
                    y -= 1;
                } else if u < 7.0 / 8.0 {
                    z += 1;
                } else {
                    z -= 1;
                }
            }
        }
        IVec3::new(x, y, z)
    }

    fn reflect(
        self,
        previous: Self,
        attractor: AttractorKind,
        attractor_size: u32,
        spawn_diameter: i32,
    ) -> (Self, bool) {
        let segment_bound = attractor_size as i32 / 2 + REFLECT_EPSILON;
        let walk_bound = spawn_diameter + REFLECT_EPSILON;
        let escaped = match attractor {
            AttractorKind::Point => {
                let bound = spawn_diameter / 2 + REFLECT_EPSILON;
                self.x.abs() > bound || self.y.abs() > bound || self.z.abs() > bound
            }
            AttractorKind::Line => {
                self.x.abs() > segment_bound
                    || self.y.abs() > walk_bound
                    || self.z.abs() > walk_bound
            }
            AttractorKind::Plane => {
                self.x.abs() > segment_bound
                    || self.y.abs() > segment_bound
                    || self.z.abs() > walk_bound
            }
        };
        if escaped {
            (previous, true)
        } else {
            (self, false)
        }
    }

    fn spawn(
        source: &mut UniformSource,
        attractor: AttractorKind,
        attractor_size: u32,
        spawn: SpawnSource,
        max_radius: f64,
    ) -> (Self, i32) {
        let diameter = envelope_diameter(max_radius);
        let face = source.next_probability();
        let cell = match attractor {
            AttractorKind::Point => {
                let half = diameter / 2;
                if face < 1.0 / 6.0 {
                    let x = symmetric_span(source, half);
                    let y = symmetric_span(source, half);
                    IVec3::new(x, y, half * face_sign(false, spawn))
                } else if face < 2.0 / 6.0 {
                    let x = symmetric_span(source, half);
                    let y = symmetric_span(source, half);
                    IVec3::new(x, y, half * face_sign(true, spawn))
                } else if face < 3.0 / 6.0 {
                    let y = symmetric_span(source, half);
                    let z = restricted_span(source, half, spawn);
                    IVec3::new(-half, y, z)
                } else if face < 4.0 / 6.0 {
                    let y = symmetric_span(source, half);
                    let z = restricted_span(source, half, spawn);
                    IVec3::new(half, y, z)
                } else if face < 5.0 / 6.0 {
                    let x = symmetric_span(source, half);
                    let z = restricted_span(source, half, spawn);
                    IVec3::new(x, -half, z)
                } else {
                    let x = symmetric_span(source, half);
                    let z = restricted_span(source, half, spawn);
                    IVec3::new(x, half, z)
                }
            }
            AttractorKind::Line => {
                let x = segment_span(source, attractor_size);
                if face < 0.25 {
                    IVec3::new(x, diameter, restricted_span(source, diameter, spawn))
                } else if face < 0.5 {
                    IVec3::new(x, -diameter, restricted_span(source, diameter, spawn))
                } else {
                    let sign = face_sign(face < 0.75, spawn);
                    IVec3::new(x, symmetric_span(source, diameter), diameter * sign)
                }
            }
            AttractorKind::Plane => {
                let x = segment_span(source, attractor_size);
                let y = segment_span(source, attractor_size);
                let sign = face_sign(face < 0.5, spawn);
                IVec3::new(x, y, diameter * sign)
            }
        };
        (cell, diameter)
    }

    fn to_point(self) -> Self::Point {
        self.into()
    }

    fn write_tsv<W: Write>(self, writer: &mut W) -> io::Result<()> {
        write!(writer, "{}\t{}\t{}", self.x, self.y, self.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draws(seed: u64) -> UniformSource {
        UniformSource::seeded(seed)
    }

    #[test]
    fn square_step_moves_to_a_four_neighbour() {
        let origin = IVec2::ZERO;
        for step in [0.1, 0.3, 0.6, 0.9] {
            let next = origin.step(LatticeKind::Square, step);
            assert_eq!((next - origin).abs().element_sum(), 1);
        }
    }

    #[test]
    fn square_step_covers_all_four_directions() {
        let moved: Vec<IVec2> = [0.0, 0.25, 0.5, 0.75]
            .iter()
            .map(|&u| IVec2::ZERO.step(LatticeKind::Square, u))
            .collect();
        assert_eq!(
            moved,
            vec![
                IVec2::new(1, 0),
                IVec2::new(-1, 0),
                IVec2::new(0, 1),
                IVec2::new(0, -1)
            ]
        );
    }

    #[test]
    fn triangle_step_covers_all_six_directions_2d() {
        let mut seen = std::collections::HashSet::new();
        for i in 0..6 {
            let u = (i as f64 + 0.5) / 6.0;
            seen.insert(IVec2::ZERO.step(LatticeKind::Triangle, u));
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn cubic_step_covers_all_six_directions_3d() {
        let mut seen = std::collections::HashSet::new();
        for i in 0..6 {
            let u = (i as f64 + 0.5) / 6.0;
            let next = IVec3::ZERO.step(LatticeKind::Square, u);
            assert_eq!(next.abs().element_sum(), 1);
            seen.insert(next);
        }
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn triangle_step_covers_all_eight_directions_3d() {
        let mut seen = std::collections::HashSet::new();
        for i in 0..8 {
            let u = (i as f64 + 0.5) / 8.0;
            seen.insert(IVec3::ZERO.step(LatticeKind::Triangle, u));
        }
        assert_eq!(seen.len(), 8);
    }

    #[test]
    fn reflect_snaps_back_outside_point_envelope() {
        let previous = IVec2::new(10, 0);
        let walked = IVec2::new(11, 0);
        // Diameter 16 allows |x| <= 10.
        let (cell, reflected) = walked.reflect(previous, AttractorKind::Point, 0, 16);
        assert!(reflected);
        assert_eq!(cell, previous);

        let inside = IVec2::new(9, 0);
        let (cell, reflected) = inside.reflect(previous, AttractorKind::Point, 0, 16);
        assert!(!reflected);
        assert_eq!(cell, inside);
    }

    #[test]
    fn reflect_line_envelope_clamps_both_axes() {
        let previous = IVec3::new(0, 0, 0);
        let escaped_x = IVec3::new(8, 0, 0);
        let (cell, reflected) = escaped_x.reflect(previous, AttractorKind::Line, 10, 40);
        assert!(reflected);
        assert_eq!(cell, previous);

        let escaped_z = IVec3::new(0, 0, 43);
        let (_, reflected) = escaped_z.reflect(previous, AttractorKind::Line, 10, 40);
        assert!(reflected);
    }

    #[test]
    fn point_spawn_lands_on_the_envelope_surface() {
        let mut source = draws(11);
        for _ in 0..200 {
            let (cell, diameter) =
                <IVec2 as Cell>::spawn(&mut source, AttractorKind::Point, 0, SpawnSource::default(), 5.0);
            assert_eq!(diameter, 26);
            let half = diameter / 2;
            assert!(cell.x.abs() == half || cell.y.abs() == half);
            assert!(cell.x.abs() <= half && cell.y.abs() <= half);
        }
    }

    #[test]
    fn empty_aggregate_spawns_on_the_offset_envelope() {
        let mut source = draws(3);
        let (_, diameter) =
            <IVec3 as Cell>::spawn(&mut source, AttractorKind::Point, 0, SpawnSource::default(), 0.0);
        assert_eq!(diameter, 16);
    }

    #[test]
    fn above_only_spawn_never_emits_below_the_plane() {
        let mut source = draws(17);
        let spawn = SpawnSource::new(true, false).expect("valid source");
        for _ in 0..500 {
            let (cell, diameter) =
                <IVec3 as Cell>::spawn(&mut source, AttractorKind::Plane, 20, spawn, 12.0);
            assert_eq!(cell.z, diameter);
            assert!(cell.x.abs() <= 10 && cell.y.abs() <= 10);
        }
    }

    #[test]
    fn below_only_spawn_keeps_point_walkers_in_the_lower_half() {
        let mut source = draws(23);
        let spawn = SpawnSource::new(false, true).expect("valid source");
        for _ in 0..500 {
            let (cell, _) =
                <IVec3 as Cell>::spawn(&mut source, AttractorKind::Point, 0, spawn, 10.0);
            assert!(cell.z <= 0);
        }
    }

    #[test]
    fn line_spawn_3d_sits_on_an_envelope_face() {
        let mut source = draws(29);
        for _ in 0..500 {
            let (cell, diameter) =
                <IVec3 as Cell>::spawn(&mut source, AttractorKind::Line, 30, SpawnSource::default(), 9.0);
            assert!(cell.y.abs() == diameter || cell.z.abs() == diameter);
            assert!(cell.x.abs() <= 15);
        }
    }

    #[test]
    fn attractor_cells_match_the_geometry() {
        let line = <IVec2 as Cell>::attractor_cells(AttractorKind::Line, 10);
        assert_eq!(line.len(), 11);
        assert!(line.contains(&IVec2::new(-5, 0)) && line.contains(&IVec2::new(5, 0)));

        let plane = <IVec3 as Cell>::attractor_cells(AttractorKind::Plane, 4);
        assert_eq!(plane.len(), 25);
        assert!(plane.iter().all(|c| c.z == 0));
    }

    #[test]
    fn metrics_follow_the_attractor() {
        let cell = IVec3::new(3, 4, -2);
        assert_eq!(cell.metric(AttractorKind::Point), 29);
        assert_eq!(cell.metric(AttractorKind::Line), 20);
        assert_eq!(cell.metric(AttractorKind::Plane), -2);

        let flat = IVec2::new(3, -4);
        assert_eq!(flat.metric(AttractorKind::Point), 25);
        assert_eq!(flat.metric(AttractorKind::Line), 16);
    }

    #[test]
    fn tsv_writes_tab_separated_axes() {
        let mut out = Vec::new();
        IVec3::new(1, -2, 3).write_tsv(&mut out).expect("write");
        assert_eq!(out, b"1\t-2\t3");
    }

    #[test]
    fn cells_convert_to_mint_points() {
        let p2 = IVec2::new(4, -1).to_point();
        assert_eq!((p2.x, p2.y), (4, -1));
        let p3 = IVec3::new(1, 2, 3).to_point();
        assert_eq!((p3.x, p3.y, p3.z), (1, 2, 3));
    }
}
