//! Raw file ingestion
//!
//! - `naming`: partition key parsing and raw file discovery
//! - `reader`: CSV reduced-table reader with the upstream pre-filter

mod naming;
mod reader;

pub use naming::{discover_raw_files, PartitionKey, RawFile, RawFileNaming};
pub use reader::{read_reduced_table, PreFilter, ReadStats};

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("I/O error on {0:?}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("malformed CSV in {0:?}: {1}")]
    Csv(PathBuf, #[source] csv::Error),

    #[error("file name {0:?} does not match the raw file naming pattern")]
    FileName(String),

    #[error("invalid raw file pattern: {0}")]
    Pattern(#[from] regex::Error),
}
