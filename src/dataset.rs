//! In-memory dataset of row vectors addressed by position.

use crate::error::{IndexError, Result};
use crate::persistence::RowStore;
use crate::vector::Vector;
use tracing::{info, warn};

/// Ordered rows; a row's position is its id.
///
/// Ids are dense in `0..len()`. Removing a row shifts every later id down by
/// one. `revision` changes on every mutation so built trees can tell they
/// are stale.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    rows: Vec<Vector>,
    revision: u64,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<Vector>) -> Self {
        Self { rows, revision: 0 }
    }

    /// Load every row from `store`, zero-padded to its maximum dimension.
    ///
    /// A missing store yields an empty dataset. A malformed store (a line
    /// that does not parse, or a row wider than the maximum dimension) also
    /// yields an empty dataset and marks `store` read-only, so later writes
    /// cannot overwrite lines that were never loaded.
    pub fn load(store: &mut RowStore) -> Result<Self> {
        let max_dimension = store.max_dimension();
        let raw = match store.read_rows() {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                warn!(path = %store.path().display(), "store not found, starting with an empty dataset");
                return Ok(Self::new());
            }
            Err(e @ IndexError::MalformedRow { .. }) => {
                warn!(error = %e, "malformed store, starting with an empty dataset");
                store.mark_read_only();
                return Ok(Self::new());
            }
            Err(e) => return Err(e),
        };

        if let Some((row, wide)) = raw
            .iter()
            .enumerate()
            .find(|(_, v)| v.dimension() > max_dimension)
        {
            warn!(
                path = %store.path().display(),
                row,
                dimension = wide.dimension(),
                max_dimension,
                "row wider than the maximum dimension, starting with an empty dataset"
            );
            store.mark_read_only();
            return Ok(Self::new());
        }

        let rows: Vec<Vector> = raw
            .into_iter()
            .map(|v| v.zero_padded(max_dimension))
            .collect();
        info!(path = %store.path().display(), rows = rows.len(), "dataset loaded");
        Ok(Self::from_rows(rows))
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Copy of the row at `i`
    pub fn row(&self, i: usize) -> Result<Vector> {
        self.row_ref(i).cloned().ok_or(IndexError::IndexOutOfRange {
            index: i,
            len: self.len(),
        })
    }

    pub fn row_ref(&self, i: usize) -> Option<&Vector> {
        self.rows.get(i)
    }

    /// Component `j` of row `i`
    pub fn element(&self, i: usize, j: usize) -> Result<f64> {
        self.rows
            .get(i)
            .ok_or(IndexError::IndexOutOfRange {
                index: i,
                len: self.len(),
            })?
            .get(j)
    }

    pub fn push(&mut self, vector: Vector) {
        self.rows.push(vector);
        self.revision += 1;
    }

    /// Remove the row at `i`, shifting later rows down.
    pub fn remove(&mut self, i: usize) -> Result<Vector> {
        if i >= self.rows.len() {
            return Err(IndexError::IndexOutOfRange {
                index: i,
                len: self.len(),
            });
        }
        self.revision += 1;
        Ok(self.rows.remove(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vector> {
        self.rows.iter()
    }

    pub(crate) fn rows(&self) -> &[Vector] {
        &self.rows
    }
}
