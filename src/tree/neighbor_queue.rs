//! Bounded best-candidate queue for tree searches — handles f64 ordering for BinaryHeap.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// A scored row: dataset id and its distance to the query.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Neighbor {
    pub id: usize,
    pub distance: f64,
}

impl Neighbor {
    pub fn new(id: usize, distance: f64) -> Self {
        Self { id, distance }
    }
}

impl PartialEq for Neighbor {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Neighbor {}

// Max-heap ordering: largest distance on top.
impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Keeps the `limit` closest neighbors seen so far, worst on top.
#[derive(Debug)]
pub struct CandidateHeap {
    heap: BinaryHeap<Neighbor>,
    limit: usize,
}

impl CandidateHeap {
    pub fn new(limit: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(limit + 1),
            limit,
        }
    }

    /// Whether a candidate at `distance` would be admitted.
    pub fn admits(&self, distance: f64) -> bool {
        if self.heap.len() < self.limit {
            return true;
        }
        self.worst().map_or(false, |worst| distance < worst.distance)
    }

    /// Push and pop the max if size exceeds the limit.
    pub fn push_bounded(&mut self, n: Neighbor) {
        self.heap.push(n);
        if self.heap.len() > self.limit {
            self.heap.pop();
        }
    }

    /// The admitted candidate with the largest distance.
    pub fn worst(&self) -> Option<&Neighbor> {
        self.heap.peek()
    }

    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.limit
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drain into a sorted Vec (ascending by distance).
    pub fn into_sorted_vec(self) -> Vec<Neighbor> {
        self.heap.into_sorted_vec()
    }
}
