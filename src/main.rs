//! CLI interface for the tree indexes

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tree_index::{
    Dataset, IndexConfig, IndexRegistry, KnnOutcome, PartitionTree, SplitRule, TreeKind, Vector,
};

#[derive(Parser)]
#[command(name = "tree-index")]
#[command(about = "KD-tree and RP-tree nearest-neighbor search over a CSV dataset", long_about = None)]
struct Cli {
    /// JSON config file. Flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Training store (one vector per line)
    #[arg(long)]
    training: Option<PathBuf>,

    /// Query store used by `workload`
    #[arg(long)]
    queries: Option<PathBuf>,

    /// Maximum vector dimension
    #[arg(long)]
    max_dimension: Option<usize>,

    /// Seed for the random projections
    #[arg(long)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy)]
enum Kind {
    Kd,
    Rp,
}

impl From<Kind> for TreeKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Kd => TreeKind::Kd,
            Kind::Rp => TreeKind::Rp,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Build both trees
    Build,
    /// Add a vector to the dataset
    Add {
        /// Vector data as comma-separated values (e.g., "1.0,2.0,3.0")
        vector: String,
    },
    /// Delete the vector at a row index
    Delete {
        /// Row index to delete
        index: usize,
    },
    /// Find the k nearest neighbors of one vector
    Query {
        /// Query vector as comma-separated values
        query: String,
        /// Number of neighbors
        #[arg(short, long, default_value = "5")]
        k: usize,
        #[arg(long, value_enum, default_value = "kd")]
        kind: Kind,
    },
    /// Answer every row of the query store
    Workload {
        #[arg(short, long, default_value = "5")]
        k: usize,
        #[arg(long, value_enum, default_value = "kd")]
        kind: Kind,
    },
    /// Print a tree
    Print {
        #[arg(long, value_enum, default_value = "kd")]
        kind: Kind,
        /// Emit the node arena as JSON
        #[arg(long)]
        json: bool,
    },
}

fn load_config(cli: &Cli) -> Result<IndexConfig> {
    let mut config = match &cli.config {
        Some(path) => IndexConfig::load(path)?,
        None => IndexConfig::default(),
    };
    if let Some(path) = &cli.training {
        config.training_store = path.clone();
    }
    if let Some(path) = &cli.queries {
        config.query_store = path.clone();
    }
    if let Some(max_dimension) = cli.max_dimension {
        config.max_dimension = max_dimension;
    }
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    config.validate()?;
    Ok(config)
}

fn print_vector(v: &Vector) {
    let parts: Vec<String> = v.as_slice().iter().map(|x| format!("{:.2}", x)).collect();
    println!("{}", parts.join(" "));
}

fn print_outcome(outcome: &KnnOutcome, dataset: &Dataset) -> Result<()> {
    match outcome {
        KnnOutcome::Complete(ids) => {
            println!("There are only {} vectors in the dataset:", ids.len());
            for &id in ids {
                print_vector(&dataset.row(id)?);
            }
        }
        KnnOutcome::Ranked(neighbors) => {
            println!("Top {} results:", neighbors.len());
            for (i, n) in neighbors.iter().enumerate() {
                println!("{}. row {} (distance: {:.4})", i + 1, n.id, n.distance);
                print_vector(&dataset.row(n.id)?);
            }
        }
    }
    Ok(())
}

fn print_tree<R: SplitRule>(tree: &PartitionTree<R>, json: bool) -> Result<()> {
    if json {
        let dump = serde_json::json!({
            "root": tree.root_id(),
            "nodes": tree.nodes(),
        });
        println!("{}", serde_json::to_string_pretty(&dump)?);
        return Ok(());
    }
    for id in tree.preorder() {
        let node = tree.node(id);
        println!("Height: {}", node.height);
        println!("Median: {:.2}", node.median);
        println!("Indices: {:?}\n", node.ids);
    }
    Ok(())
}

fn run(registry: &mut IndexRegistry, command: Commands) -> Result<()> {
    match command {
        Commands::Build => {
            registry.ensure_all_built();
            println!("KD-Tree and RP-Tree built over {} rows", registry.dataset().len());
        }
        Commands::Add { vector } => {
            let v = Vector::from_str(&vector)?;
            // One write covers both trees; the RP tree rebuilds because the
            // dataset changed underneath it.
            registry.kd().add_vector(v)?;
            println!("Added row {}", registry.dataset().len() - 1);
        }
        Commands::Delete { index } => {
            registry.kd().delete_vector(index)?;
            registry.rp().delete_vector(index)?;
            println!("Deleted row {}", index);
        }
        Commands::Query { query, k, kind } => {
            let q = Vector::from_str(&query)?;
            let outcome = match TreeKind::from(kind) {
                TreeKind::Kd => registry.kd().knn(k, &q)?,
                TreeKind::Rp => registry.rp().knn(k, &q)?,
            };
            print_outcome(&outcome, registry.dataset())?;
        }
        Commands::Workload { k, kind } => {
            let outcomes = registry.run_query_workload(kind.into(), k)?;
            for (i, outcome) in outcomes.iter().enumerate() {
                println!("Query {}:", i);
                print_outcome(outcome, registry.dataset())?;
                println!("------------------------------");
            }
            let metrics = registry.metrics();
            println!(
                "{} queries, avg {:.1} us, p99 {:.1} us",
                metrics.total_queries(),
                metrics.avg_query_latency_us(),
                metrics.percentile_query_latency_us(99.0)
            );
        }
        Commands::Print { kind, json } => match TreeKind::from(kind) {
            TreeKind::Kd => print_tree(registry.kd().ensure_built(), json)?,
            TreeKind::Rp => print_tree(registry.rp().ensure_built(), json)?,
        },
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tree_index=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let mut registry = IndexRegistry::open(config)?;
    run(&mut registry, cli.command)
}
