//! Random-projection median splits (RP-tree).

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{SplitRule, TreeKind};
use crate::vector::Vector;

/// Splits on the dot product with a random direction drawn per node.
///
/// The RNG carries over between rebuilds, so every rebuild draws new
/// directions even when seeded.
#[derive(Debug, Clone)]
pub struct ProjectionMedian {
    max_dimension: usize,
    rng: StdRng,
}

impl ProjectionMedian {
    /// Seed from OS entropy.
    ///
    /// # Panics
    ///
    /// Panics if `max_dimension` is zero, as does [`ProjectionMedian::with_seed`].
    pub fn new(max_dimension: usize) -> Self {
        assert!(max_dimension > 0, "max_dimension must be at least 1");
        Self {
            max_dimension,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(max_dimension: usize, seed: u64) -> Self {
        assert!(max_dimension > 0, "max_dimension must be at least 1");
        Self {
            max_dimension,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl SplitRule for ProjectionMedian {
    type Direction = Vector;

    const KIND: TreeKind = TreeKind::Rp;

    fn max_dimension(&self) -> usize {
        self.max_dimension
    }

    fn direction(&mut self, _depth: usize) -> Vector {
        Vector::random_unit(self.max_dimension, &mut self.rng)
    }

    fn split_value(&self, direction: &Vector, _depth: usize, vector: &Vector) -> f64 {
        vector.dot(direction)
    }
}
