//! Vector type and operations

use crate::distance;
use crate::error::{IndexError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A vector in n-dimensional space
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    data: Vec<f64>,
}

impl Vector {
    /// Create a new vector from a Vec<f64>
    pub fn new(data: Vec<f64>) -> Self {
        Self { data }
    }

    /// Create a vector of `dimension` zeros
    pub fn zeros(dimension: usize) -> Self {
        Self {
            data: vec![0.0; dimension],
        }
    }

    /// Create an empty vector, to be grown with [`Vector::push`]
    pub fn empty() -> Self {
        Self { data: Vec::new() }
    }

    /// Append one component
    pub fn push(&mut self, component: f64) {
        self.data.push(component);
    }

    /// Get the dimension of the vector
    pub fn dimension(&self) -> usize {
        self.data.len()
    }

    /// Resize to `dimension`, discarding trailing components or zero-filling.
    pub fn set_dimension(&mut self, dimension: usize) {
        self.data.resize(dimension, 0.0);
    }

    /// Get the underlying data as a slice
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Read the component at position `i`
    pub fn get(&self, i: usize) -> Result<f64> {
        self.data
            .get(i)
            .copied()
            .ok_or(IndexError::IndexOutOfRange {
                index: i,
                len: self.data.len(),
            })
    }

    /// Check if this vector has the same dimension as another
    pub fn has_same_dimension(&self, other: &Vector) -> bool {
        self.dimension() == other.dimension()
    }

    /// Compute the L2 norm (magnitude) of the vector
    pub fn norm(&self) -> f64 {
        self.data.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    /// Dot product. Both vectors must have the same dimension.
    pub fn dot(&self, other: &Vector) -> f64 {
        distance::dot_product(self, other)
    }

    /// Component-wise sum, rejecting mismatched dimensions
    pub fn checked_add(&self, other: &Vector) -> Result<Vector> {
        self.zip_with(other, |a, b| a + b)
    }

    /// Component-wise difference, rejecting mismatched dimensions
    pub fn checked_sub(&self, other: &Vector) -> Result<Vector> {
        self.zip_with(other, |a, b| a - b)
    }

    fn zip_with(&self, other: &Vector, f: impl Fn(f64, f64) -> f64) -> Result<Vector> {
        if !self.has_same_dimension(other) {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension(),
                actual: other.dimension(),
            });
        }
        Ok(Vector::new(
            self.data
                .iter()
                .zip(other.data.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        ))
    }

    /// Copy of this vector extended with `0.0` up to `dimension` components.
    /// Vectors already at least that long are returned unchanged.
    pub fn zero_padded(&self, dimension: usize) -> Vector {
        let mut v = self.clone();
        if v.dimension() < dimension {
            v.set_dimension(dimension);
        }
        v
    }

    /// Draw a random projection direction of the given length.
    ///
    /// Each component is a non-negative integer magnitude in `0..=99`; the
    /// result is divided by its norm. Every component is non-negative, so the
    /// direction always lies in the positive orthant.
    pub fn random_unit<R: Rng + ?Sized>(dimension: usize, rng: &mut R) -> Vector {
        if dimension == 0 {
            return Vector::empty();
        }
        loop {
            let data: Vec<f64> = (0..dimension)
                .map(|_| (rng.gen_range(0..1000u32) / 10) as f64)
                .collect();
            let v = Vector::new(data);
            let norm = v.norm();
            if norm > 0.0 {
                return Vector::new(v.data.into_iter().map(|x| x / norm).collect());
            }
        }
    }

    /// Parse a vector from a comma-separated string
    pub fn from_str(s: &str) -> Result<Self> {
        let data: Result<Vec<f64>> = s
            .split(',')
            .map(|x| {
                x.trim()
                    .parse::<f64>()
                    .map_err(|_| IndexError::InvalidVector {
                        reason: format!("Invalid float: {}", x),
                    })
            })
            .collect();
        Ok(Vector::new(data?))
    }
}

impl From<Vec<f64>> for Vector {
    fn from(data: Vec<f64>) -> Self {
        Vector::new(data)
    }
}

impl Add for Vector {
    type Output = Result<Vector>;

    fn add(self, other: Vector) -> Result<Vector> {
        self.checked_add(&other)
    }
}

impl Sub for Vector {
    type Output = Result<Vector>;

    fn sub(self, other: Vector) -> Result<Vector> {
        self.checked_sub(&other)
    }
}
