//! Index configuration.

use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default maximum vector dimension (28x28 images).
pub const DEFAULT_MAX_DIMENSION: usize = 784;

/// Configuration shared by both tree indexes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Every row is padded to this width; wider vectors are rejected.
    pub max_dimension: usize,
    /// Bulk training rows backing the dataset.
    pub training_store: PathBuf,
    /// Query workload rows.
    pub query_store: PathBuf,
    /// Seed for the projection RNG. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_dimension: DEFAULT_MAX_DIMENSION,
            training_store: PathBuf::from("fmnist-train.csv"),
            query_store: PathBuf::from("fmnist-test.csv"),
            seed: None,
        }
    }
}

impl IndexConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let config: Self = serde_json::from_slice(&bytes)
            .map_err(|e| IndexError::ConfigError(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_dimension == 0 {
            return Err(IndexError::ConfigError(
                "max_dimension must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
