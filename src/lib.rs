//! ais-trainset: AIS trajectory to sliding-window training sets
//!
//! Batch pipeline turning raw AIS position reports into fixed-width
//! supervised-learning samples, one dataset per (file, region).
//!
//! ## Architecture
//!
//! - **Region**: static lat/lon boxes partition each raw table
//! - **Selection**: busiest vessels per region by record count
//! - **Cleaning**: typed, validated, (vessel, time)-ordered reports
//! - **Features**: per-region spatial reference, scaler and motion features
//! - **Window**: contiguous sliding windows with a next-step displacement target
//! - **Dataset**: region table plus provenance and fingerprint
//! - **Pipeline / Ingest / Storage**: batch runner, CSV reader, sled sink

pub mod cleaning;
pub mod config;
pub mod dataset;
pub mod features;
pub mod ingest;
pub mod pipeline;
pub mod region;
pub mod selection;
pub mod storage;
pub mod types;
pub mod window;

// Re-export configuration
pub use config::{ConfigError, PipelineConfig};

// Re-export core types
pub use types::{
    Column, FeatureRow, Mmsi, PositionReport, RawRecord, RawTable, SchemaError, WindowSample,
};

// Re-export stage entry points
pub use cleaning::{clean, CleaningReport};
pub use dataset::{assemble, TrainingDataset};
pub use features::{build_features, derive_features, SpatialReference, StandardScaler};
pub use region::{classify, Region, RegionTable};
pub use selection::select_top_vessels;
pub use window::{sample_region, Shard, TrajectoryWindows};

// Re-export batch pipeline and collaborators
pub use ingest::{IngestError, PartitionKey};
pub use pipeline::{build_region_dataset, process_table, run_directory, run_paths, PipelineError, RunSummary};
pub use storage::{InMemorySink, SinkError, SledSink, TrainingSink};
