//! File-backed row store: bulk load, single-row append, full rewrite.

use crate::error::{IndexError, Result};
use crate::persistence::format::{decode_row, encode_row};
use crate::vector::Vector;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A line-oriented CSV store of fixed-width rows.
///
/// Line `n` of the store holds row id `n`. A store whose lines cannot be
/// mapped onto row ids that way is marked read-only and refuses writes.
#[derive(Debug, Clone)]
pub struct RowStore {
    path: PathBuf,
    max_dimension: usize,
    read_only: bool,
}

impl RowStore {
    pub fn new(path: impl AsRef<Path>, max_dimension: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_dimension,
            read_only: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_dimension(&self) -> usize {
        self.max_dimension
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Refuse every later append and rewrite.
    pub fn mark_read_only(&mut self) {
        self.read_only = true;
    }

    /// Read every row, or `None` if the store does not exist.
    ///
    /// Blank lines are ignored. The first line that fails to parse aborts
    /// the read with [`IndexError::MalformedRow`].
    pub fn read_rows(&self) -> Result<Option<Vec<Vector>>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(IndexError::IoError(e)),
        };

        let mut rows = Vec::new();
        for (line_no, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let row = decode_row(&line).map_err(|e| IndexError::MalformedRow {
                path: self.path.clone(),
                line: line_no + 1,
                reason: e.to_string(),
            })?;
            rows.push(row);
        }
        debug!(path = %self.path.display(), rows = rows.len(), "store read");
        Ok(Some(rows))
    }

    /// Append one row, creating the store if needed.
    pub fn append(&self, vector: &Vector) -> Result<()> {
        self.check_writable()?;
        let write = || -> std::io::Result<()> {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            writeln!(file, "{}", encode_row(vector, self.max_dimension))?;
            file.flush()
        };
        write().map_err(|source| self.write_error(source))
    }

    /// Truncate the store and write every row.
    pub fn rewrite<'a>(&self, rows: impl IntoIterator<Item = &'a Vector>) -> Result<()> {
        self.check_writable()?;
        let write = || -> std::io::Result<()> {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&self.path)?;
            let mut writer = BufWriter::new(file);
            for row in rows {
                writeln!(writer, "{}", encode_row(row, self.max_dimension))?;
            }
            writer.flush()
        };
        write().map_err(|source| self.write_error(source))
    }

    fn check_writable(&self) -> Result<()> {
        if self.read_only {
            warn!(path = %self.path.display(), "store is read-only, write refused");
            return Err(IndexError::StoreReadOnly {
                path: self.path.clone(),
            });
        }
        Ok(())
    }

    fn write_error(&self, source: std::io::Error) -> IndexError {
        warn!(path = %self.path.display(), error = %source, "failed to write store");
        IndexError::StoreWrite {
            path: self.path.clone(),
            source,
        }
    }
}
