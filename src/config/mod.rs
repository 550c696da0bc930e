//! Pipeline Configuration Module
//!
//! Provides the per-run configuration loaded from TOML files: region boxes,
//! population and sample caps, cleaning and window thresholds, ingest and
//! storage layout.
//!
//! ## Loading Order
//!
//! 1. `AIS_TRAINSET_CONFIG` environment variable (path to TOML file)
//! 2. `trainset.toml` in the current working directory
//! 3. Built-in defaults (`defaults.rs`)
//!
//! ## Usage
//!
//! The config is an explicit value: load it once and pass references into
//! each stage. Nothing in the pipeline reads a global.
//!
//! ```ignore
//! let config = PipelineConfig::load();
//! let dataset = pipeline::build_region_dataset(&region, &config)?;
//! ```

mod pipeline_config;
pub mod defaults;
pub mod validation;

pub use pipeline_config::*;
