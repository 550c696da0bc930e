//! Training store inspector
//!
//! Lists stored partitions (year, table, month, rows) and optionally the
//! write-time manifest of one partition.
//!
//! Usage:
//!   trainset-inspect --store ./data/trainset
//!   trainset-inspect --store ./data/trainset --year 2023 --month 1 --region bay

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use ais_trainset::config::{PipelineConfig, StorageConfig};
use ais_trainset::ingest::PartitionKey;
use ais_trainset::storage::{SledSink, TrainingSink};

#[derive(Parser, Debug)]
#[command(name = "trainset-inspect")]
#[command(about = "Inspect an ais-trainset store")]
struct Args {
    /// Store root (default: storage.root from the loaded config)
    #[arg(long, value_name = "DIR")]
    store: Option<PathBuf>,

    /// Show the manifest of this year's partition (needs --month and --region)
    #[arg(long, requires_all = ["month", "region"])]
    year: Option<i32>,

    #[arg(long)]
    month: Option<u32>,

    #[arg(long)]
    region: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();

    let storage = match args.store {
        Some(root) => StorageConfig {
            root,
            ..StorageConfig::default()
        },
        None => PipelineConfig::load().storage,
    };
    let sink = SledSink::open(&storage)
        .with_context(|| format!("opening store {}", storage.root.display()))?;

    if let (Some(year), Some(month), Some(region)) = (args.year, args.month, args.region.as_deref()) {
        let key = PartitionKey { year, month };
        match sink.manifest(key, region)? {
            Some(manifest) => println!("{}", serde_json::to_string_pretty(&manifest)?),
            None => println!("no partition {key} for region '{region}'"),
        }
        return Ok(());
    }

    let partitions = sink.list_partitions()?;
    if partitions.is_empty() {
        println!("store {} is empty", storage.root.display());
        return Ok(());
    }

    println!("{:<6} {:<24} {:>5} {:>10}", "year", "table", "month", "rows");
    for p in &partitions {
        println!("{:<6} {:<24} {:>5} {:>10}", p.year, p.table, p.id_month, p.rows);
    }
    println!(
        "{} partitions, {} rows",
        partitions.len(),
        partitions.iter().map(|p| p.rows).sum::<usize>()
    );
    Ok(())
}
