//! Distance functions used by the tree searches.
//!
//! Both functions assume equal-length inputs; every row and query is padded
//! to the configured maximum dimension before it reaches them.

use crate::vector::Vector;

/// Compute Euclidean (L2) distance between two vectors
pub fn euclidean_distance(v1: &Vector, v2: &Vector) -> f64 {
    debug_assert_eq!(v1.dimension(), v2.dimension());
    v1.as_slice()
        .iter()
        .zip(v2.as_slice().iter())
        .map(|(a, b)| (a - b).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Compute dot product of two vectors
pub fn dot_product(v1: &Vector, v2: &Vector) -> f64 {
    debug_assert_eq!(v1.dimension(), v2.dimension());
    v1.as_slice()
        .iter()
        .zip(v2.as_slice().iter())
        .map(|(a, b)| a * b)
        .sum()
}
