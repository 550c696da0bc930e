//! TrainingSink trait: pluggable destination for region datasets
//!
//! Partition semantics shared by every backend:
//! - one database per year, one table per region (`training_<region>`)
//! - the month lives only in the `id_month` column of each row
//! - writing a partition first deletes every row with that `id_month`, then
//!   appends the new rows in bounded batches
//! - an empty dataset still clears the partition

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::dataset::TrainingDataset;
use crate::features::SpatialReference;
use crate::ingest::PartitionKey;
use crate::types::{Mmsi, WindowSample};

/// Trait for training-set persistence backends.
pub trait TrainingSink: Send + Sync {
    /// Delete-then-append the `(year, id_month)` partition of the dataset's
    /// region table. Returns the number of rows written.
    fn replace_partition(&self, key: PartitionKey, dataset: &TrainingDataset) -> Result<usize, SinkError>;

    /// Rows of one partition, in write order.
    fn read_partition(&self, key: PartitionKey, region: &str) -> Result<Vec<StoredRecord>, SinkError>;

    /// Write-time summary of one partition, if it was ever written.
    fn manifest(&self, key: PartitionKey, region: &str) -> Result<Option<PartitionManifest>, SinkError>;

    /// Every non-empty partition, ordered by (year, table, month).
    fn list_partitions(&self) -> Result<Vec<PartitionSummary>, SinkError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

/// Sink errors
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("database error: {0}")]
    Database(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error on {0:?}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Destination table of a region.
pub fn table_name(region: &str) -> String {
    format!("training_{region}")
}

/// One persisted training row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id_month: u32,
    pub mmsi: Mmsi,
    pub start_time: NaiveDateTime,
    pub values: Vec<f64>,
}

impl StoredRecord {
    pub fn from_sample(id_month: u32, sample: &WindowSample) -> Self {
        Self {
            id_month,
            mmsi: sample.mmsi,
            start_time: sample.start_time,
            values: sample.values.clone(),
        }
    }
}

/// Provenance written alongside each partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionManifest {
    pub region: String,
    pub id_month: u32,
    pub columns: Vec<String>,
    pub rows: usize,
    pub fingerprint: String,
    pub metadata: Option<SpatialReference>,
}

impl PartitionManifest {
    pub fn for_dataset(key: PartitionKey, dataset: &TrainingDataset) -> Self {
        Self {
            region: dataset.region.clone(),
            id_month: key.month,
            columns: dataset.columns.clone(),
            rows: dataset.len(),
            fingerprint: dataset.fingerprint(),
            metadata: dataset.metadata,
        }
    }
}

/// Row count of one stored partition.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionSummary {
    pub year: i32,
    pub table: String,
    pub id_month: u32,
    pub rows: usize,
}
