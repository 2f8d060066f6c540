//! Index registry: owns the dataset, the training store and both trees.
//!
//! Trees are built lazily on first use and rebuilt whenever the dataset has
//! changed since they were built. Mutations go through a per-kind
//! [`TreeIndex`] handle, which writes the dataset and the training store and
//! then invalidates its own tree.

use std::time::Instant;

use tracing::{info, warn};

use crate::config::IndexConfig;
use crate::dataset::Dataset;
use crate::error::{IndexError, Result};
use crate::metrics::MetricsCollector;
use crate::persistence::RowStore;
use crate::search::{self, KnnOutcome};
use crate::tree::{AxisMedian, PartitionTree, ProjectionMedian, SplitRule, TreeKind, TreeNode};
use crate::vector::Vector;

/// Process-wide state for the KD and RP indexes.
#[derive(Debug)]
pub struct IndexRegistry {
    config: IndexConfig,
    dataset: Dataset,
    training: RowStore,
    kd: PartitionTree<AxisMedian>,
    rp: PartitionTree<ProjectionMedian>,
    metrics: MetricsCollector,
}

impl IndexRegistry {
    /// Load the training store named by `config`. A missing or malformed
    /// store yields an empty dataset; a malformed one is never written to.
    pub fn open(config: IndexConfig) -> Result<Self> {
        config.validate()?;
        let mut training = RowStore::new(&config.training_store, config.max_dimension);
        let dataset = Dataset::load(&mut training)?;
        Ok(Self::assemble(config, training, dataset))
    }

    /// Use `dataset` as the initial rows; mutations still write to the
    /// configured training store.
    pub fn from_dataset(config: IndexConfig, dataset: Dataset) -> Result<Self> {
        config.validate()?;
        let max_dimension = config.max_dimension;
        let mut rows = Vec::with_capacity(dataset.len());
        for row in dataset.iter() {
            if row.dimension() > max_dimension {
                return Err(IndexError::DimensionExceeded {
                    max: max_dimension,
                    actual: row.dimension(),
                });
            }
            rows.push(row.zero_padded(max_dimension));
        }
        let training = RowStore::new(&config.training_store, max_dimension);
        Ok(Self::assemble(config, training, Dataset::from_rows(rows)))
    }

    fn assemble(config: IndexConfig, training: RowStore, dataset: Dataset) -> Self {
        let projection = match config.seed {
            Some(seed) => ProjectionMedian::with_seed(config.max_dimension, seed),
            None => ProjectionMedian::new(config.max_dimension),
        };
        Self {
            kd: PartitionTree::new(AxisMedian::new(config.max_dimension)),
            rp: PartitionTree::new(projection),
            metrics: MetricsCollector::new(),
            config,
            dataset,
            training,
        }
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Handle to the KD-tree index.
    pub fn kd(&mut self) -> TreeIndex<'_, AxisMedian> {
        TreeIndex {
            tree: &mut self.kd,
            dataset: &mut self.dataset,
            store: &self.training,
            metrics: &mut self.metrics,
        }
    }

    /// Handle to the RP-tree index.
    pub fn rp(&mut self) -> TreeIndex<'_, ProjectionMedian> {
        TreeIndex {
            tree: &mut self.rp,
            dataset: &mut self.dataset,
            store: &self.training,
            metrics: &mut self.metrics,
        }
    }

    /// Make sure both trees are built.
    pub fn ensure_all_built(&mut self) {
        self.kd().ensure_built();
        self.rp().ensure_built();
    }

    /// Answer every row of the query store with the `kind` tree.
    ///
    /// A missing or malformed query store is reported and yields no results.
    /// Rows wider than the maximum dimension are skipped.
    pub fn run_query_workload(&mut self, kind: TreeKind, k: usize) -> Result<Vec<KnnOutcome>> {
        let store = RowStore::new(&self.config.query_store, self.config.max_dimension);
        let rows = match store.read_rows() {
            Ok(Some(rows)) => rows,
            Ok(None) => {
                warn!(path = %store.path().display(), "query store not found");
                return Ok(Vec::new());
            }
            Err(e @ IndexError::MalformedRow { .. }) => {
                warn!(error = %e, "malformed query store");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let max_dimension = self.config.max_dimension;
        let queries: Vec<Vector> = rows
            .into_iter()
            .enumerate()
            .filter_map(|(line, row)| {
                if row.dimension() > max_dimension {
                    warn!(line = line + 1, dimension = row.dimension(), "skipping query row");
                    None
                } else {
                    Some(row)
                }
            })
            .collect();

        let start = Instant::now();
        let results = match kind {
            TreeKind::Kd => self.kd().knn_batch(k, &queries)?,
            TreeKind::Rp => self.rp().knn_batch(k, &queries)?,
        };
        info!(
            %kind,
            queries = queries.len(),
            k,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "query workload finished"
        );
        Ok(results)
    }
}

/// One tree kind's view of the registry.
pub struct TreeIndex<'a, R: SplitRule> {
    tree: &'a mut PartitionTree<R>,
    dataset: &'a mut Dataset,
    store: &'a RowStore,
    metrics: &'a mut MetricsCollector,
}

impl<'a, R: SplitRule> TreeIndex<'a, R> {
    /// Build the tree if it is unbuilt or older than the dataset.
    pub fn ensure_built(&mut self) -> &PartitionTree<R> {
        if !self.tree.is_current(self.dataset) {
            let start = Instant::now();
            self.tree.build(self.dataset);
            self.metrics.record_build(start.elapsed());
        }
        &*self.tree
    }

    /// Append `vector` to the dataset and the training store, zero-padded to
    /// the maximum dimension, and invalidate this tree.
    ///
    /// Vectors wider than the maximum dimension are rejected without any
    /// change. If the store write fails the dataset keeps the new row.
    pub fn add_vector(&mut self, vector: Vector) -> Result<()> {
        let max_dimension = self.tree.rule().max_dimension();
        if vector.dimension() > max_dimension {
            warn!(
                dimension = vector.dimension(),
                max_dimension, "dimension exceeds the maximum dimension"
            );
            return Err(IndexError::DimensionExceeded {
                max: max_dimension,
                actual: vector.dimension(),
            });
        }

        let padded = vector.zero_padded(max_dimension);
        self.dataset.push(padded.clone());
        self.invalidate();
        self.metrics.record_add();
        self.store.append(&padded)?;

        let kind = R::KIND;
        info!(%kind, rows = self.dataset.len(), "tree invalidated on addition");
        Ok(())
    }

    /// Delete row `index`.
    ///
    /// The KD index removes the row from the dataset and rewrites the store.
    /// The RP index only invalidates its own tree and leaves the dataset and
    /// store alone.
    ///
    /// Requests with `index > len` are rejected up front. `index == len`
    /// passes that check and is rejected by the dataset removal itself.
    pub fn delete_vector(&mut self, index: usize) -> Result<()> {
        let len = self.dataset.len();
        if index > len {
            warn!(index, len, "index exceeds the maximum index");
            return Err(IndexError::IndexOutOfRange { index, len });
        }

        let kind = R::KIND;
        match kind {
            TreeKind::Kd => {
                self.dataset.remove(index)?;
                self.invalidate();
                self.metrics.record_delete();
                // Memory is already updated; a failed rewrite leaves the
                // store out of step with the dataset.
                self.store.rewrite(self.dataset.iter())?;
            }
            TreeKind::Rp => self.invalidate(),
        }

        info!(%kind, index, rows = self.dataset.len(), "tree invalidated on deletion");
        Ok(())
    }

    /// The `k` nearest rows to `query`, building the tree first if needed.
    pub fn knn(&mut self, k: usize, query: &Vector) -> Result<KnnOutcome> {
        self.ensure_built();
        let start = Instant::now();
        let outcome = search::knn(&*self.tree, &*self.dataset, query, k)?;
        self.metrics.record_query(start.elapsed());
        Ok(outcome)
    }

    /// Answer many queries against the same tree.
    pub fn knn_batch(&mut self, k: usize, queries: &[Vector]) -> Result<Vec<KnnOutcome>>
    where
        R: Sync,
        R::Direction: Sync,
    {
        self.ensure_built();
        let start = Instant::now();
        let outcomes = search::knn_batch(&*self.tree, &*self.dataset, queries, k)?;
        let elapsed = start.elapsed();
        if !queries.is_empty() {
            let per_query = elapsed.div_f64(queries.len() as f64);
            for _ in queries {
                self.metrics.record_query(per_query);
            }
        }
        Ok(outcomes)
    }

    /// Root of the built tree, if any.
    pub fn root(&self) -> Option<&TreeNode<R::Direction>> {
        self.tree.root()
    }

    pub fn tree(&self) -> &PartitionTree<R> {
        &*self.tree
    }

    /// Whether the tree reflects the dataset's current contents.
    pub fn is_built(&self) -> bool {
        self.tree.is_current(self.dataset)
    }

    fn invalidate(&mut self) {
        self.tree.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config(dir: &TempDir, max_dimension: usize) -> IndexConfig {
        IndexConfig {
            max_dimension,
            training_store: dir.path().join("train.csv"),
            query_store: dir.path().join("test.csv"),
            seed: Some(11),
        }
    }

    fn sample_registry(dir: &TempDir) -> IndexRegistry {
        let rows = vec![
            Vector::new(vec![0.0, 0.0]),
            Vector::new(vec![10.0, 10.0]),
            Vector::new(vec![5.0, 5.0]),
        ];
        IndexRegistry::from_dataset(config(dir, 2), Dataset::from_rows(rows)).unwrap()
    }

    #[test]
    fn test_lazy_build() {
        let dir = TempDir::new().unwrap();
        let mut registry = sample_registry(&dir);
        assert!(!registry.kd().is_built());

        let root_ids = registry.kd().ensure_built().root().unwrap().ids.clone();
        assert_eq!(root_ids, vec![0, 1, 2]);
        assert!(registry.kd().is_built());
        assert_eq!(registry.metrics().total_builds(), 1);

        // Already current: no second build.
        registry.kd().ensure_built();
        assert_eq!(registry.metrics().total_builds(), 1);
    }

    #[test]
    fn test_add_invalidates_and_persists() {
        let dir = TempDir::new().unwrap();
        let mut registry = sample_registry(&dir);
        registry.kd().ensure_built();

        registry.kd().add_vector(Vector::new(vec![1.0])).unwrap();
        assert!(!registry.kd().is_built());
        assert!(registry.kd().root().is_none());
        assert_eq!(registry.dataset().len(), 4);
        assert_eq!(registry.dataset().row(3).unwrap().as_slice(), &[1.0, 0.0]);

        let text = std::fs::read_to_string(dir.path().join("train.csv")).unwrap();
        assert_eq!(text, "1.0,0.0\n");
    }

    #[test]
    fn test_add_too_wide_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let mut registry = sample_registry(&dir);
        registry.kd().ensure_built();

        let err = registry
            .rp()
            .add_vector(Vector::new(vec![1.0, 2.0, 3.0]))
            .unwrap_err();
        assert!(matches!(err, IndexError::DimensionExceeded { max: 2, actual: 3 }));
        assert_eq!(registry.dataset().len(), 3);
        assert!(registry.kd().is_built());
        assert!(!dir.path().join("train.csv").exists());
    }

    #[test]
    fn test_kd_delete_rewrites_store() {
        let dir = TempDir::new().unwrap();
        let mut registry = sample_registry(&dir);

        registry.kd().delete_vector(0).unwrap();
        assert_eq!(registry.dataset().len(), 2);
        assert_eq!(registry.dataset().row(0).unwrap().as_slice(), &[10.0, 10.0]);

        let text = std::fs::read_to_string(dir.path().join("train.csv")).unwrap();
        assert_eq!(text, "10.0,10.0\n5.0,5.0\n");
    }

    #[test]
    fn test_delete_boundary() {
        let dir = TempDir::new().unwrap();
        let mut registry = sample_registry(&dir);

        // Past the end: rejected by the up-front check.
        assert!(matches!(
            registry.kd().delete_vector(4),
            Err(IndexError::IndexOutOfRange { index: 4, len: 3 })
        ));
        // Exactly the row count: passes the check, rejected by the removal.
        assert!(matches!(
            registry.kd().delete_vector(3),
            Err(IndexError::IndexOutOfRange { index: 3, len: 3 })
        ));
        assert_eq!(registry.dataset().len(), 3);
    }

    #[test]
    fn test_rp_delete_only_invalidates() {
        let dir = TempDir::new().unwrap();
        let mut registry = sample_registry(&dir);
        registry.rp().ensure_built();

        registry.rp().delete_vector(1).unwrap();
        assert!(!registry.rp().is_built());
        assert_eq!(registry.dataset().len(), 3);
        assert!(!dir.path().join("train.csv").exists());
    }

    #[test]
    fn test_kd_mutation_makes_rp_stale() {
        let dir = TempDir::new().unwrap();
        let mut registry = sample_registry(&dir);
        registry.ensure_all_built();

        registry.kd().delete_vector(2).unwrap();
        assert!(!registry.rp().is_built());

        let root_ids = registry.rp().ensure_built().root().unwrap().ids.clone();
        assert_eq!(root_ids, vec![0, 1]);
    }

    #[test]
    fn test_query_workload() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("test.csv"), "4.0,4.0\n9.0,9.0\n1.0,2.0,3.0\n").unwrap();
        let mut registry = sample_registry(&dir);

        let results = registry.run_query_workload(TreeKind::Kd, 1).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].ids(), vec![2]);
        assert_eq!(results[1].ids(), vec![1]);
        assert_eq!(registry.metrics().total_queries(), 2);
    }

    #[test]
    fn test_malformed_store_loads_empty_and_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("train.csv");
        let original = "1.0,2.0,3.0\nbad,row\n0.0,0.0\n5.0,5.0\n";
        std::fs::write(&path, original).unwrap();

        let mut registry = IndexRegistry::open(config(&dir, 2)).unwrap();
        assert!(registry.dataset().is_empty());

        assert!(matches!(
            registry.kd().delete_vector(0),
            Err(IndexError::IndexOutOfRange { index: 0, len: 0 })
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);

        // The row is kept in memory; the store refuses the append.
        let err = registry
            .kd()
            .add_vector(Vector::new(vec![1.0, 1.0]))
            .unwrap_err();
        assert!(matches!(err, IndexError::StoreReadOnly { .. }));
        assert_eq!(registry.dataset().len(), 1);

        registry.kd().delete_vector(0).unwrap_err();
        assert_eq!(registry.dataset().len(), 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_malformed_query_store() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("test.csv"), "4.0,4.0\nnot,numbers\n").unwrap();
        let mut registry = sample_registry(&dir);
        assert!(registry.run_query_workload(TreeKind::Kd, 1).unwrap().is_empty());
    }

    #[test]
    fn test_batch_records_one_latency_per_query() {
        let dir = TempDir::new().unwrap();
        let mut registry = sample_registry(&dir);
        let queries = vec![Vector::new(vec![1.0, 1.0]); 3];

        let outcomes = registry.kd().knn_batch(1, &queries).unwrap();
        assert_eq!(outcomes.len(), 3);
        assert_eq!(registry.metrics().total_queries(), 3);
    }

    #[test]
    fn test_missing_query_store() {
        let dir = TempDir::new().unwrap();
        let mut registry = sample_registry(&dir);
        assert!(registry.run_query_workload(TreeKind::Rp, 2).unwrap().is_empty());
    }
}
