//! Max-heap over aggregate cells keyed by a runtime-selectable metric.
//!
//! `std::collections::BinaryHeap` fixes its ordering at the element type, but
//! the extremum here is "farthest cell under the *current* attractor metric"
//! and the attractor can change while the aggregate lives. The heap therefore
//! owns its comparator state and exposes [`MetricHeap::reheapify`] to restore
//! the invariant in O(n) after the metric changes.
use crate::cell::Cell;
use crate::geometry::AttractorKind;

/// Vec-backed binary max-heap ordered by [`Cell::metric`] under the captured
/// attractor.
#[derive(Clone, Debug)]
pub struct MetricHeap<C: Cell> {
    cells: Vec<C>,
    attractor: AttractorKind,
}

impl<C: Cell> MetricHeap<C> {
    pub fn new(attractor: AttractorKind) -> Self {
        Self {
            cells: Vec::new(),
            attractor,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn attractor(&self) -> AttractorKind {
        self.attractor
    }

    pub fn reserve(&mut self, additional: usize) {
        self.cells.reserve(additional);
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// The cell farthest from the attractor under the current metric.
    #[inline]
    pub fn top(&self) -> Option<C> {
        self.cells.first().copied()
    }

    /// Metric value of the farthest cell.
    #[inline]
    pub fn top_metric(&self) -> Option<i64> {
        self.top().map(|cell| cell.metric(self.attractor))
    }

    pub fn push(&mut self, cell: C) {
        self.cells.push(cell);
        self.sift_up(self.cells.len() - 1);
    }

    pub fn pop(&mut self) -> Option<C> {
        if self.cells.is_empty() {
            return None;
        }
        let last = self.cells.len() - 1;
        self.cells.swap(0, last);
        let out = self.cells.pop();
        if !self.cells.is_empty() {
            self.sift_down(0);
        }
        out
    }

    /// Replaces the captured attractor and rebuilds the heap so the ordering
    /// reflects the new metric.
    pub fn set_attractor(&mut self, attractor: AttractorKind) {
        self.attractor = attractor;
        self.reheapify();
    }

    /// Re-establishes the heap invariant in O(n) (Floyd's bottom-up build).
    pub fn reheapify(&mut self) {
        for index in (0..self.cells.len() / 2).rev() {
            self.sift_down(index);
        }
    }

    #[inline]
    fn key(&self, index: usize) -> i64 {
        self.cells[index].metric(self.attractor)
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.key(index) <= self.key(parent) {
                break;
            }
            self.cells.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.cells.len();
        loop {
            let left = 2 * index + 1;
            if left >= len {
                break;
            }
            let mut largest = index;
            if self.key(left) > self.key(largest) {
                largest = left;
            }
            let right = left + 1;
            if right < len && self.key(right) > self.key(largest) {
                largest = right;
            }
            if largest == index {
                break;
            }
            self.cells.swap(index, largest);
            index = largest;
        }
    }
}
