//! Shared data structures for the AIS training-set pipeline
//!
//! - Ingest: `RawRecord` / `RawTable` (reduced upstream table)
//! - Cleaning: `PositionReport`
//! - Features: `FeatureRow`
//! - Windowing: `WindowSample`

mod ais;
mod dataset;

pub use ais::*;
pub use dataset::*;

use thiserror::Error;

/// Required columns are absent from an input table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required columns: {}", column_list(.missing))]
pub struct SchemaError {
    pub missing: Vec<Column>,
}

fn column_list(columns: &[Column]) -> String {
    columns
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
