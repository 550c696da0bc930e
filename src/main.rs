//! ais-trainset - AIS trajectory training-set builder
//!
//! Reads raw AIS exports named `YYYY_NOAA_AIS_logs_MM.csv`, builds one
//! sliding-window training dataset per region and replaces the month
//! partition in the yearly store.
//!
//! # Usage
//!
//! ```bash
//! # Every raw file in ./raw_data
//! ais-trainset
//!
//! # Explicit files, custom store
//! ais-trainset --store /data/trainset raw_data/2023_NOAA_AIS_logs_01.csv
//!
//! # Build and report without writing
//! ais-trainset --dry-run
//! ```
//!
//! # Environment Variables
//!
//! - `AIS_TRAINSET_CONFIG`: Path to a TOML config (default: ./trainset.toml)
//! - `RUST_LOG`: Logging level (default: info)

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use ais_trainset::config::PipelineConfig;
use ais_trainset::pipeline::{run_directory, run_paths};
use ais_trainset::storage::{InMemorySink, SledSink, TrainingSink};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "ais-trainset")]
#[command(about = "Build sliding-window training sets from raw AIS exports")]
#[command(version)]
struct CliArgs {
    /// Raw files to process (default: every matching file in the raw directory)
    files: Vec<PathBuf>,

    /// Directory scanned for raw files (overrides ingest.raw_dir)
    #[arg(long, value_name = "DIR")]
    raw_dir: Option<PathBuf>,

    /// Store root holding one database per year (overrides storage.root)
    #[arg(long, value_name = "DIR")]
    store: Option<PathBuf>,

    /// Pipeline config file (default: $AIS_TRAINSET_CONFIG, then ./trainset.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Build datasets but do not write them
    #[arg(long)]
    dry_run: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::load(),
    };
    if let Some(dir) = args.raw_dir {
        config.ingest.raw_dir = dir;
    }
    if let Some(root) = args.store {
        config.storage.root = root;
    }

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let sink: Box<dyn TrainingSink> = if args.dry_run {
        info!("Dry run: datasets are built but not persisted");
        Box::new(InMemorySink::new())
    } else {
        Box::new(
            SledSink::open(&config.storage)
                .with_context(|| format!("opening store {}", config.storage.root.display()))?,
        )
    };

    let summary = if args.files.is_empty() {
        run_directory(&config, sink.as_ref())
            .with_context(|| format!("scanning {}", config.ingest.raw_dir.display()))?
    } else {
        run_paths(&args.files, &config, sink.as_ref())?
    };

    for (path, error) in summary.failed() {
        warn!(file = %path.display(), "{}", error);
    }
    println!("{summary}");

    if summary.succeeded() == 0 && !summary.files.is_empty() {
        anyhow::bail!("every raw file failed");
    }
    Ok(())
}
