//! Branch-and-bound k-nearest-neighbor search over a partition tree.

use std::collections::HashSet;

use rayon::prelude::*;
use serde::Serialize;

use crate::dataset::Dataset;
use crate::distance::euclidean_distance;
use crate::error::{IndexError, Result};
use crate::tree::neighbor_queue::{CandidateHeap, Neighbor};
use crate::tree::{NodeId, PartitionTree, SplitRule};
use crate::vector::Vector;

/// Result of a k-NN query.
#[derive(Debug, Clone, Serialize)]
pub enum KnnOutcome {
    /// The tree holds at most `k` rows: every id, in root order, unranked.
    Complete(Vec<usize>),
    /// The `k` closest rows, ascending by distance.
    Ranked(Vec<Neighbor>),
}

impl KnnOutcome {
    /// Row ids in reported order.
    pub fn ids(&self) -> Vec<usize> {
        match self {
            KnnOutcome::Complete(ids) => ids.clone(),
            KnnOutcome::Ranked(neighbors) => neighbors.iter().map(|n| n.id).collect(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            KnnOutcome::Complete(ids) => ids.len(),
            KnnOutcome::Ranked(neighbors) => neighbors.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pad `query` to the tree's width, rejecting queries that are too wide.
pub fn prepare_query(query: &Vector, max_dimension: usize) -> Result<Vector> {
    if query.dimension() > max_dimension {
        return Err(IndexError::DimensionExceeded {
            max: max_dimension,
            actual: query.dimension(),
        });
    }
    Ok(query.zero_padded(max_dimension))
}

/// Find the `k` rows of `dataset` closest to `query` using `tree`.
///
/// `tree` must have been built from `dataset` in its current state.
pub fn knn<R: SplitRule>(
    tree: &PartitionTree<R>,
    dataset: &Dataset,
    query: &Vector,
    k: usize,
) -> Result<KnnOutcome> {
    let query = prepare_query(query, tree.rule().max_dimension())?;

    let root_id = match tree.root_id() {
        Some(id) => id,
        None => return Ok(KnnOutcome::Complete(Vec::new())),
    };
    let root = tree.node(root_id);
    if root.ids.len() <= k {
        return Ok(KnnOutcome::Complete(root.ids.clone()));
    }

    let mut best = CandidateHeap::new(k);
    let mut scored: HashSet<usize> = HashSet::new();
    let mut to_visit: Vec<NodeId> = vec![root_id];

    while let Some(node_id) = to_visit.pop() {
        let node = tree.node(node_id);

        for &id in &node.ids {
            // Ids repeat down the tree; score each one once.
            if !scored.insert(id) {
                continue;
            }
            let row = dataset.row_ref(id).ok_or(IndexError::IndexOutOfRange {
                index: id,
                len: dataset.len(),
            })?;
            let distance = euclidean_distance(row, &query);
            if best.admits(distance) {
                best.push_bounded(Neighbor::new(id, distance));
            }
        }

        let split = tree.split_value(node, &query);
        let (near, far) = if split <= node.median {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(near) = near {
            to_visit.push(near);
        }
        if let Some(far) = far {
            let bound = (split - node.median).abs();
            let worst = best.worst().map_or(f64::INFINITY, |n| n.distance);
            if !best.is_full() || bound < worst {
                to_visit.push(far);
            }
        }
    }

    Ok(KnnOutcome::Ranked(best.into_sorted_vec()))
}

/// Answer every query in `queries` in parallel.
pub fn knn_batch<R: SplitRule + Sync>(
    tree: &PartitionTree<R>,
    dataset: &Dataset,
    queries: &[Vector],
    k: usize,
) -> Result<Vec<KnnOutcome>>
where
    R::Direction: Sync,
{
    queries
        .par_iter()
        .map(|q| knn(tree, dataset, q, k))
        .collect()
}
