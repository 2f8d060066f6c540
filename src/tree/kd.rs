//! Axis-aligned median splits (KD-tree).

use super::{SplitRule, TreeKind};
use crate::vector::Vector;

/// Splits on the coordinate at axis `depth % max_dimension`.
#[derive(Debug, Clone)]
pub struct AxisMedian {
    max_dimension: usize,
}

impl AxisMedian {
    /// # Panics
    ///
    /// Panics if `max_dimension` is zero.
    pub fn new(max_dimension: usize) -> Self {
        assert!(max_dimension > 0, "max_dimension must be at least 1");
        Self { max_dimension }
    }

    /// Axis used by nodes at `depth`.
    pub fn axis(&self, depth: usize) -> usize {
        depth % self.max_dimension
    }
}

impl SplitRule for AxisMedian {
    type Direction = ();

    const KIND: TreeKind = TreeKind::Kd;

    fn max_dimension(&self) -> usize {
        self.max_dimension
    }

    fn direction(&mut self, _depth: usize) {}

    fn split_value(&self, _direction: &(), depth: usize, vector: &Vector) -> f64 {
        vector.as_slice()[self.axis(depth)]
    }
}
