//! Structural and search properties of both tree kinds over random datasets.

use std::collections::HashSet;

use proptest::prelude::*;
use tree_index::distance::euclidean_distance;
use tree_index::search::knn;
use tree_index::{
    AxisMedian, Dataset, KnnOutcome, PartitionTree, ProjectionMedian, SplitRule, Vector,
};

/// Small integer coordinates so duplicate rows and tied medians show up often.
fn dataset_strategy() -> impl Strategy<Value = (usize, Vec<Vec<f64>>)> {
    (1usize..=4).prop_flat_map(|dim| {
        let row = prop::collection::vec((0i32..5).prop_map(f64::from), dim);
        (Just(dim), prop::collection::vec(row, 1..30))
    })
}

fn to_dataset(rows: &[Vec<f64>]) -> Dataset {
    Dataset::from_rows(rows.iter().cloned().map(Vector::new).collect())
}

fn check_structure<R: SplitRule>(tree: &PartitionTree<R>, ds: &Dataset) -> Result<(), TestCaseError> {
    let root = tree.root().expect("non-empty dataset has a root");
    let all: Vec<usize> = (0..ds.len()).collect();
    prop_assert_eq!(&root.ids, &all);

    for id in tree.preorder() {
        let node = tree.node(id);
        prop_assert!(!node.ids.is_empty());
        if node.is_leaf() {
            continue;
        }

        let mut union: Vec<usize> = Vec::new();
        if let Some(left) = node.left {
            for &row in &tree.node(left).ids {
                let value = tree.split_value(node, ds.row_ref(row).unwrap());
                prop_assert!(value <= node.median);
                union.push(row);
            }
        }
        if let Some(right) = node.right {
            for &row in &tree.node(right).ids {
                let value = tree.split_value(node, ds.row_ref(row).unwrap());
                prop_assert!(value > node.median);
                union.push(row);
            }
        }

        let distinct: HashSet<usize> = union.iter().copied().collect();
        prop_assert_eq!(distinct.len(), union.len());
        union.sort_unstable();
        let mut ids = node.ids.clone();
        ids.sort_unstable();
        prop_assert_eq!(union, ids);
    }
    Ok(())
}

fn brute_force(ds: &Dataset, query: &Vector, k: usize) -> Vec<f64> {
    let mut distances: Vec<f64> = ds.iter().map(|row| euclidean_distance(row, query)).collect();
    distances.sort_by(f64::total_cmp);
    distances.truncate(k);
    distances
}

fn check_knn<R: SplitRule>(
    tree: &PartitionTree<R>,
    ds: &Dataset,
    query: &Vector,
    k: usize,
) -> Result<(), TestCaseError> {
    let padded = query.zero_padded(tree.rule().max_dimension());
    match knn(tree, ds, query, k).unwrap() {
        KnnOutcome::Complete(ids) => {
            prop_assert!(ds.len() <= k);
            prop_assert_eq!(ids, (0..ds.len()).collect::<Vec<_>>());
        }
        KnnOutcome::Ranked(neighbors) => {
            prop_assert!(ds.len() > k);
            prop_assert_eq!(neighbors.len(), k);

            let distinct: HashSet<usize> = neighbors.iter().map(|n| n.id).collect();
            prop_assert_eq!(distinct.len(), neighbors.len());

            let expected = brute_force(ds, &padded, k);
            for (n, want) in neighbors.iter().zip(expected.iter()) {
                prop_assert!((n.distance - want).abs() < 1e-9);
            }
            for pair in neighbors.windows(2) {
                prop_assert!(pair[0].distance <= pair[1].distance);
            }
        }
    }
    Ok(())
}

proptest! {
    #[test]
    fn kd_tree_partitions_ids((dim, rows) in dataset_strategy()) {
        let ds = to_dataset(&rows);
        let tree = PartitionTree::build_from(AxisMedian::new(dim), &ds);
        check_structure(&tree, &ds)?;
    }

    #[test]
    fn rp_tree_partitions_ids((dim, rows) in dataset_strategy(), seed in any::<u64>()) {
        let ds = to_dataset(&rows);
        let tree = PartitionTree::build_from(ProjectionMedian::with_seed(dim, seed), &ds);
        check_structure(&tree, &ds)?;
        // Every node, leaves included, carries its own full-width direction.
        for node in tree.nodes() {
            prop_assert_eq!(node.direction.dimension(), dim);
        }
    }

    #[test]
    fn kd_build_is_deterministic((dim, rows) in dataset_strategy()) {
        let ds = to_dataset(&rows);
        let a = PartitionTree::build_from(AxisMedian::new(dim), &ds);
        let b = PartitionTree::build_from(AxisMedian::new(dim), &ds);

        prop_assert_eq!(a.len(), b.len());
        for (x, y) in a.nodes().iter().zip(b.nodes()) {
            prop_assert_eq!(&x.ids, &y.ids);
            prop_assert_eq!(x.median, y.median);
            prop_assert_eq!(x.left, y.left);
            prop_assert_eq!(x.right, y.right);
        }
    }

    #[test]
    fn kd_knn_matches_brute_force(
        (dim, rows) in dataset_strategy(),
        query in prop::collection::vec(-2.0f64..7.0, 1..=4),
        k in 0usize..8,
    ) {
        let ds = to_dataset(&rows);
        let tree = PartitionTree::build_from(AxisMedian::new(dim), &ds);
        let query = Vector::new(query.into_iter().take(dim).collect());
        check_knn(&tree, &ds, &query, k)?;
    }

    #[test]
    fn rp_knn_matches_brute_force(
        (dim, rows) in dataset_strategy(),
        query in prop::collection::vec(-2.0f64..7.0, 1..=4),
        k in 0usize..8,
        seed in any::<u64>(),
    ) {
        let ds = to_dataset(&rows);
        let tree = PartitionTree::build_from(ProjectionMedian::with_seed(dim, seed), &ds);
        let query = Vector::new(query.into_iter().take(dim).collect());
        check_knn(&tree, &ds, &query, k)?;
    }
}

#[test]
fn rp_rebuild_draws_new_directions() {
    let ds = Dataset::from_rows(vec![
        Vector::new(vec![1.0, 7.0, 3.0]),
        Vector::new(vec![4.0, 2.0, 9.0]),
        Vector::new(vec![8.0, 5.0, 6.0]),
        Vector::new(vec![0.0, 3.0, 1.0]),
    ]);
    let mut tree = PartitionTree::new(ProjectionMedian::with_seed(3, 21));

    tree.build(&ds);
    let first = tree.root().unwrap().direction.clone();
    tree.build(&ds);
    let second = tree.root().unwrap().direction.clone();

    assert_ne!(first, second);
}
