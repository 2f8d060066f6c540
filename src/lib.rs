//! # Tree Index
//!
//! KD-tree and random-projection tree nearest-neighbor indexes over a
//! persisted vector dataset.
//!
//! This library provides:
//! - Vector and dataset types backed by a line-oriented CSV store
//! - Median-split partition trees (axis-aligned and random projection)
//! - Branch-and-bound k-nearest-neighbor search
//! - A registry that builds trees lazily and rebuilds them after mutation
//!
//! ## Example
//!
//! ```rust
//! use tree_index::{Dataset, IndexConfig, IndexRegistry, KnnOutcome, Vector};
//!
//! let config = IndexConfig {
//!     max_dimension: 2,
//!     training_store: std::env::temp_dir().join("tree-index-doc-train.csv"),
//!     ..IndexConfig::default()
//! };
//! let dataset = Dataset::from_rows(vec![
//!     Vector::new(vec![0.0, 0.0]),
//!     Vector::new(vec![10.0, 10.0]),
//!     Vector::new(vec![5.0, 5.0]),
//! ]);
//! let mut registry = IndexRegistry::from_dataset(config, dataset).unwrap();
//!
//! let outcome = registry.kd().knn(2, &Vector::new(vec![4.0, 4.0])).unwrap();
//! assert_eq!(outcome.ids(), vec![2, 0]);
//! assert!(matches!(outcome, KnnOutcome::Ranked(_)));
//! ```

pub mod config;
pub mod dataset;
pub mod distance;
pub mod error;
pub mod metrics;
pub mod persistence;
pub mod registry;
pub mod search;
pub mod tree;
pub mod vector;

pub use config::IndexConfig;
pub use dataset::Dataset;
pub use error::{IndexError, Result};
pub use registry::{IndexRegistry, TreeIndex};
pub use search::KnnOutcome;
pub use tree::neighbor_queue::Neighbor;
pub use tree::{AxisMedian, PartitionTree, ProjectionMedian, SplitRule, TreeKind, TreeNode};
pub use vector::Vector;
