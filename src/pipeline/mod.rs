//! Batch Pipeline
//!
//! ```text
//! raw file ──► reduced table ──► RegionClassifier
//!                                     │ per region
//!                                     ▼
//!              VesselSelector ──► TrajectoryCleaner ──► FeatureBuilder
//!                                                            │
//!                                                            ▼
//!              TrainingSink ◄── DatasetAssembler ◄── WindowSampler
//! ```
//!
//! One file is processed start to finish before the next; inside a file every
//! region dataset is built before any is written, so a failing file writes
//! nothing. The batch runner records a failed file and moves on.

mod builder;
mod runner;

pub use builder::{build_region_dataset, RegionStats};
pub use runner::{
    process_path, process_table, run_directory, run_paths, FileOutcome, FileReport, FileStatus,
    RunSummary,
};

use thiserror::Error;

use crate::config::ConfigError;
use crate::ingest::IngestError;
use crate::storage::SinkError;
use crate::types::SchemaError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
