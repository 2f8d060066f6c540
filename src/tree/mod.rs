//! Median-split partition trees over dataset row ids.
//!
//! Both tree kinds share one node shape and one build procedure; they differ
//! only in the [`SplitRule`] that turns a row into the scalar compared against
//! each node's median:
//!
//! - [`AxisMedian`] (KD-tree): the row's coordinate on axis
//!   `depth % max_dimension`.
//! - [`ProjectionMedian`] (RP-tree): the dot product with a random direction
//!   drawn fresh for every node.
//!
//! Nodes live in an arena owned by the tree and refer to their children by
//! [`NodeId`]. Every node keeps the full set of ids assigned to it, so a
//! parent's ids are exactly the union of its children's.

pub mod kd;
pub mod neighbor_queue;
pub mod rp;

pub use kd::AxisMedian;
pub use rp::ProjectionMedian;

use std::fmt;
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::dataset::Dataset;
use crate::vector::Vector;

/// The two supported tree kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TreeKind {
    Kd,
    Rp,
}

impl fmt::Display for TreeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeKind::Kd => f.write_str("KD-Tree"),
            TreeKind::Rp => f.write_str("RP-Tree"),
        }
    }
}

/// How a tree turns a row into the scalar it partitions on.
pub trait SplitRule {
    /// Per-node data needed to compute split values (`()` for axis splits,
    /// the projection vector for random projections).
    type Direction: fmt::Debug + Clone + Serialize;

    const KIND: TreeKind;

    /// Width every row and query is padded to.
    fn max_dimension(&self) -> usize;

    /// Produce the direction for a new node at `depth`.
    fn direction(&mut self, depth: usize) -> Self::Direction;

    /// Split value of `vector` at a node with the given direction and depth.
    fn split_value(&self, direction: &Self::Direction, depth: usize, vector: &Vector) -> f64;
}

/// Index of a node within its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeId(pub usize);

/// A tree node. `ids` is never empty.
#[derive(Debug, Clone, Serialize)]
pub struct TreeNode<D> {
    pub ids: Vec<usize>,
    pub height: usize,
    pub median: f64,
    pub direction: D,
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
}

impl<D> TreeNode<D> {
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

/// A partition tree built from a [`Dataset`] with split rule `R`.
#[derive(Debug)]
pub struct PartitionTree<R: SplitRule> {
    rule: R,
    nodes: Vec<TreeNode<R::Direction>>,
    root: Option<NodeId>,
    /// Dataset revision this tree was built from; `None` until built.
    built_from: Option<u64>,
}

#[derive(Clone, Copy)]
enum Side {
    Left,
    Right,
}

struct PendingNode {
    ids: Vec<usize>,
    depth: usize,
    /// Consecutive ancestors whose partition put every id on one side.
    stalled: usize,
    parent: Option<(NodeId, Side)>,
}

impl<R: SplitRule> PartitionTree<R> {
    /// An unbuilt tree.
    pub fn new(rule: R) -> Self {
        Self {
            rule,
            nodes: Vec::new(),
            root: None,
            built_from: None,
        }
    }

    /// Build a tree over every row of `dataset`.
    pub fn build_from(rule: R, dataset: &Dataset) -> Self {
        let mut tree = Self::new(rule);
        tree.build(dataset);
        tree
    }

    /// (Re)build over every row of `dataset`, replacing any existing nodes.
    pub fn build(&mut self, dataset: &Dataset) {
        let start = Instant::now();
        self.invalidate();

        if !dataset.is_empty() {
            self.grow(dataset);
        }
        self.built_from = Some(dataset.revision());

        let kind = R::KIND;
        info!(
            kind = %kind,
            rows = dataset.len(),
            nodes = self.nodes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "tree built"
        );
    }

    /// Destroy every node; the tree must be rebuilt before use.
    pub fn invalidate(&mut self) {
        self.nodes = Vec::new();
        self.root = None;
        self.built_from = None;
    }

    pub fn is_built(&self) -> bool {
        self.built_from.is_some()
    }

    /// Whether this tree was built from the dataset's current contents.
    pub fn is_current(&self, dataset: &Dataset) -> bool {
        self.built_from == Some(dataset.revision())
    }

    pub fn root_id(&self) -> Option<NodeId> {
        self.root
    }

    pub fn root(&self) -> Option<&TreeNode<R::Direction>> {
        self.root.map(|id| self.node(id))
    }

    pub fn node(&self, id: NodeId) -> &TreeNode<R::Direction> {
        &self.nodes[id.0]
    }

    /// All nodes in arena order.
    pub fn nodes(&self) -> &[TreeNode<R::Direction>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn rule(&self) -> &R {
        &self.rule
    }

    /// Split value of `vector` at `node`.
    pub fn split_value(&self, node: &TreeNode<R::Direction>, vector: &Vector) -> f64 {
        self.rule.split_value(&node.direction, node.height, vector)
    }

    /// Node ids in depth-first pre-order (node, left subtree, right subtree).
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            let node = self.node(id);
            stack.extend(node.right);
            stack.extend(node.left);
        }
        order
    }

    fn grow(&mut self, dataset: &Dataset) {
        let rows = dataset.rows();
        let max_dimension = self.rule.max_dimension();
        let mut pending = vec![PendingNode {
            ids: (0..rows.len()).collect(),
            depth: 0,
            stalled: 0,
            parent: None,
        }];

        while let Some(task) = pending.pop() {
            let id = NodeId(self.nodes.len());
            let direction = self.rule.direction(task.depth);

            let node = if task.ids.len() == 1 {
                let median = self
                    .rule
                    .split_value(&direction, task.depth, &rows[task.ids[0]]);
                TreeNode {
                    ids: task.ids,
                    height: task.depth,
                    median,
                    direction,
                    left: None,
                    right: None,
                }
            } else {
                let values: Vec<f64> = task
                    .ids
                    .iter()
                    .map(|&row| self.rule.split_value(&direction, task.depth, &rows[row]))
                    .collect();
                let median = median_of(&values);

                let mut left = Vec::new();
                let mut right = Vec::new();
                for (&row, &value) in task.ids.iter().zip(values.iter()) {
                    if value <= median {
                        left.push(row);
                    } else {
                        right.push(row);
                    }
                }

                let degenerate = left.is_empty() || right.is_empty();
                let stalled = if degenerate { task.stalled + 1 } else { 0 };
                // A one-sided split that cannot make progress ends here.
                let terminal = degenerate
                    && (stalled >= max_dimension || all_rows_equal(rows, &task.ids));

                if !terminal {
                    for (side, ids) in [(Side::Right, right), (Side::Left, left)] {
                        if !ids.is_empty() {
                            pending.push(PendingNode {
                                ids,
                                depth: task.depth + 1,
                                stalled,
                                parent: Some((id, side)),
                            });
                        }
                    }
                }

                TreeNode {
                    ids: task.ids,
                    height: task.depth,
                    median,
                    direction,
                    left: None,
                    right: None,
                }
            };

            match task.parent {
                None => self.root = Some(id),
                Some((parent, Side::Left)) => self.nodes[parent.0].left = Some(id),
                Some((parent, Side::Right)) => self.nodes[parent.0].right = Some(id),
            }
            self.nodes.push(node);
        }
    }
}

/// Median of the values: the central value for odd counts, the mean of the
/// two central values for even counts. `values` must be non-empty.
pub fn median_of(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn all_rows_equal(rows: &[Vector], ids: &[usize]) -> bool {
    let first = &rows[ids[0]];
    ids[1..].iter().all(|&i| &rows[i] == first)
}
