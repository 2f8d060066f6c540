//! Row encoding for the line-oriented stores.
//!
//! One vector per line, components comma separated, each written with one
//! fractional digit and padded with `0.0` up to the maximum dimension.

use crate::error::Result;
use crate::vector::Vector;
use std::fmt::Write;

/// Encode a vector as a store line (without the trailing newline).
pub fn encode_row(vector: &Vector, max_dimension: usize) -> String {
    let width = vector.dimension().max(max_dimension);
    let mut line = String::with_capacity(width * 4);
    for i in 0..width {
        if i > 0 {
            line.push(',');
        }
        let value = vector.as_slice().get(i).copied().unwrap_or(0.0);
        // Writing into a String cannot fail.
        let _ = write!(line, "{:.1}", value);
    }
    line
}

/// Decode a store line into a vector.
pub fn decode_row(line: &str) -> Result<Vector> {
    Vector::from_str(line.trim_end_matches(['\r', '\n']))
}
