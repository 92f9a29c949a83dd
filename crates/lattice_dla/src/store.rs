//! The mutable aggregate itself: O(1) membership, insertion order, the
//! attractor-aware extremum, and the append-only stream buffer.
use std::collections::{HashMap, HashSet};

use crate::cell::Cell;
use crate::geometry::AttractorKind;
use crate::heap::MetricHeap;

/// Outcome of one stick test against the aggregate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collision {
    /// The stick draw came up tails; the walker keeps walking.
    FailedDraw,
    /// The walker collided with the aggregate and was absorbed.
    Stuck,
    /// No collision; the walker keeps walking.
    Clear,
}

/// Backing storage for a growing aggregate.
///
/// `members` and `buffer` always agree: `buffer[i]` is the cell whose
/// insertion index is `i`. Attractor cells live in their own set and never
/// appear in the buffer.
#[derive(Clone, Debug)]
pub struct AggregateStore<C: Cell> {
    members: HashMap<C, usize>,
    attractor_cells: HashSet<C>,
    extremum: MetricHeap<C>,
    buffer: Vec<C>,
}

impl<C: Cell> AggregateStore<C> {
    pub fn new(attractor: AttractorKind) -> Self {
        Self {
            members: HashMap::new(),
            attractor_cells: HashSet::new(),
            extremum: MetricHeap::new(attractor),
            buffer: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    #[inline]
    pub fn has_attractor_cells(&self) -> bool {
        !self.attractor_cells.is_empty()
    }

    /// Whether `cell` belongs to the aggregate or its attractor.
    #[inline]
    pub fn contains(&self, cell: C) -> bool {
        self.members.contains_key(&cell) || self.attractor_cells.contains(&cell)
    }

    /// Insertion index of a member cell, if it stuck.
    pub fn index_of(&self, cell: C) -> Option<usize> {
        self.members.get(&cell).copied()
    }

    /// The append-only stream of members in insertion order.
    #[inline]
    pub fn buffer(&self) -> &[C] {
        &self.buffer
    }

    pub fn members(&self) -> impl Iterator<Item = (C, usize)> + '_ {
        self.members.iter().map(|(cell, index)| (*cell, *index))
    }

    /// Metric of the farthest member under the current attractor, 0 while
    /// the aggregate is empty.
    pub fn span_metric(&self) -> i64 {
        self.extremum.top_metric().unwrap_or(0)
    }

    pub fn reserve(&mut self, additional: usize) {
        self.members.reserve(additional);
        self.extremum.reserve(additional);
        self.buffer.reserve(additional);
    }

    /// Drops all members while preserving the attractor structure.
    pub fn clear(&mut self) {
        self.members.clear();
        self.extremum.clear();
        self.buffer.clear();
    }

    /// Replaces the attractor cells and re-establishes the extremum ordering
    /// under the new metric.
    pub fn rebuild_attractor(&mut self, attractor: AttractorKind, cells: Vec<C>) {
        self.attractor_cells = cells.into_iter().collect();
        self.extremum.set_attractor(attractor);
    }

    /// Appends `cell` to the aggregate, assigning it the next insertion
    /// index. Constant amortised time.
    pub fn push_particle(&mut self, cell: C) -> usize {
        let index = self.buffer.len();
        self.members.insert(cell, index);
        self.extremum.push(cell);
        self.buffer.push(cell);
        index
    }

    /// One iteration of the stick test.
    ///
    /// A tails draw is counted before any membership lookup, so the failure
    /// counter measures the coin process itself. On a heads draw the walker
    /// sticks if `current` touches the aggregate or attractor; the cell that
    /// joins is `previous`, the last empty cell the walker occupied. A walker
    /// already standing on an aggregate cell (possible after an earlier tails
    /// draw) is absorbed without re-insertion.
    pub fn collide(
        &mut self,
        current: C,
        previous: C,
        u_stick: f64,
        coeff_stick: f64,
    ) -> Collision {
        if u_stick > coeff_stick {
            return Collision::FailedDraw;
        }
        if self.contains(current) {
            if !self.members.contains_key(&previous) {
                self.push_particle(previous);
            }
            return Collision::Stuck;
        }
        Collision::Clear
    }
}

#[cfg(test)]
mod tests {
    use glam::IVec2;

    use super::*;

    fn point_store() -> AggregateStore<IVec2> {
        let mut store = AggregateStore::new(AttractorKind::Point);
        store.rebuild_attractor(AttractorKind::Point, vec![IVec2::ZERO]);
        store
    }

    #[test]
    fn buffer_and_members_agree_on_indices() {
        let mut store = point_store();
        store.push_particle(IVec2::ZERO);
        store.push_particle(IVec2::new(1, 0));
        store.push_particle(IVec2::new(1, 1));

        for (index, cell) in store.buffer().iter().enumerate() {
            assert_eq!(store.index_of(*cell), Some(index));
        }
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn collide_counts_tails_draws_before_any_lookup() {
        let mut store = point_store();
        store.push_particle(IVec2::ZERO);
        // Nowhere near the aggregate, but the draw still fails first.
        let outcome = store.collide(IVec2::new(50, 50), IVec2::new(50, 51), 0.9, 0.5);
        assert_eq!(outcome, Collision::FailedDraw);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn collide_sticks_the_previous_cell() {
        let mut store = point_store();
        store.push_particle(IVec2::ZERO);
        let outcome = store.collide(IVec2::ZERO, IVec2::new(0, 1), 0.3, 1.0);
        assert_eq!(outcome, Collision::Stuck);
        assert_eq!(store.index_of(IVec2::new(0, 1)), Some(1));
        assert_eq!(store.buffer(), &[IVec2::ZERO, IVec2::new(0, 1)]);
        assert_eq!(store.span_metric(), 1);
    }

    #[test]
    fn collide_misses_when_clear_of_the_aggregate() {
        let mut store = point_store();
        store.push_particle(IVec2::ZERO);
        let outcome = store.collide(IVec2::new(5, 5), IVec2::new(5, 6), 0.1, 1.0);
        assert_eq!(outcome, Collision::Clear);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn walker_inside_the_aggregate_is_absorbed_once() {
        let mut store = point_store();
        store.push_particle(IVec2::ZERO);
        store.push_particle(IVec2::new(0, 1));
        // The walker sat on (0, 1) after a failed draw and now collides again.
        let outcome = store.collide(IVec2::ZERO, IVec2::new(0, 1), 0.0, 1.0);
        assert_eq!(outcome, Collision::Stuck);
        assert_eq!(store.len(), 2);
        assert_eq!(store.index_of(IVec2::new(0, 1)), Some(1));
    }

    #[test]
    fn attractor_cells_collide_without_joining_the_buffer() {
        let mut store = AggregateStore::new(AttractorKind::Line);
        store.rebuild_attractor(
            AttractorKind::Line,
            <IVec2 as Cell>::attractor_cells(AttractorKind::Line, 6),
        );
        assert!(store.contains(IVec2::new(3, 0)));
        assert!(store.is_empty());

        let outcome = store.collide(IVec2::new(2, 0), IVec2::new(2, 1), 0.0, 1.0);
        assert_eq!(outcome, Collision::Stuck);
        assert_eq!(store.buffer(), &[IVec2::new(2, 1)]);
    }

    #[test]
    fn clear_preserves_the_attractor_structure() {
        let mut store = point_store();
        store.push_particle(IVec2::ZERO);
        store.push_particle(IVec2::new(1, 0));
        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.span_metric(), 0);
        assert!(store.has_attractor_cells());
    }
}
