//! In-memory sink for tests and dry runs
//!
//! Thread-safe via `RwLock`. Not durable.

use std::collections::BTreeMap;
use std::sync::RwLock;

use super::sink::{
    table_name, PartitionManifest, PartitionSummary, SinkError, StoredRecord, TrainingSink,
};
use crate::dataset::TrainingDataset;
use crate::ingest::PartitionKey;

/// (year, table, month)
type Slot = (i32, String, u32);

#[derive(Debug, Default)]
pub struct InMemorySink {
    rows: RwLock<BTreeMap<Slot, Vec<StoredRecord>>>,
    manifests: RwLock<BTreeMap<Slot, PartitionManifest>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

fn slot(key: PartitionKey, region: &str) -> Slot {
    (key.year, table_name(region), key.month)
}

impl TrainingSink for InMemorySink {
    fn replace_partition(&self, key: PartitionKey, dataset: &TrainingDataset) -> Result<usize, SinkError> {
        let slot = slot(key, &dataset.region);
        let records: Vec<StoredRecord> = dataset
            .rows
            .iter()
            .map(|s| StoredRecord::from_sample(key.month, s))
            .collect();
        let written = records.len();

        let mut rows = self
            .rows
            .write()
            .map_err(|e| SinkError::Storage(e.to_string()))?;
        rows.remove(&slot);
        if !records.is_empty() {
            rows.insert(slot.clone(), records);
        }

        self.manifests
            .write()
            .map_err(|e| SinkError::Storage(e.to_string()))?
            .insert(slot, PartitionManifest::for_dataset(key, dataset));

        Ok(written)
    }

    fn read_partition(&self, key: PartitionKey, region: &str) -> Result<Vec<StoredRecord>, SinkError> {
        let rows = self
            .rows
            .read()
            .map_err(|e| SinkError::Storage(e.to_string()))?;
        Ok(rows.get(&slot(key, region)).cloned().unwrap_or_default())
    }

    fn manifest(&self, key: PartitionKey, region: &str) -> Result<Option<PartitionManifest>, SinkError> {
        let manifests = self
            .manifests
            .read()
            .map_err(|e| SinkError::Storage(e.to_string()))?;
        Ok(manifests.get(&slot(key, region)).cloned())
    }

    fn list_partitions(&self) -> Result<Vec<PartitionSummary>, SinkError> {
        let rows = self
            .rows
            .read()
            .map_err(|e| SinkError::Storage(e.to_string()))?;
        Ok(rows
            .iter()
            .map(|((year, table, month), records)| PartitionSummary {
                year: *year,
                table: table.clone(),
                id_month: *month,
                rows: records.len(),
            })
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WindowSample;
    use chrono::NaiveDateTime;

    fn dataset(region: &str, n: usize) -> TrainingDataset {
        let rows = (0..n)
            .map(|i| WindowSample {
                mmsi: i as i64,
                start_index: 0,
                start_time: NaiveDateTime::default(),
                values: vec![i as f64; 4],
            })
            .collect();
        TrainingDataset {
            region: region.to_string(),
            columns: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            rows,
            metadata: None,
            id_month: None,
        }
    }

    const JAN: PartitionKey = PartitionKey { year: 2023, month: 1 };

    #[test]
    fn test_replace_is_idempotent() {
        let sink = InMemorySink::new();
        sink.replace_partition(JAN, &dataset("bay", 3)).unwrap();
        sink.replace_partition(JAN, &dataset("bay", 3)).unwrap();
        assert_eq!(sink.read_partition(JAN, "bay").unwrap().len(), 3);
    }

    #[test]
    fn test_empty_dataset_clears_partition() {
        let sink = InMemorySink::new();
        sink.replace_partition(JAN, &dataset("bay", 3)).unwrap();
        assert_eq!(sink.replace_partition(JAN, &dataset("bay", 0)).unwrap(), 0);
        assert!(sink.read_partition(JAN, "bay").unwrap().is_empty());
        assert!(sink.list_partitions().unwrap().is_empty());
        assert_eq!(sink.manifest(JAN, "bay").unwrap().unwrap().rows, 0);
    }

    #[test]
    fn test_trait_object() {
        let sink: Box<dyn TrainingSink> = Box::new(InMemorySink::new());
        assert_eq!(sink.backend_name(), "InMemory");
        sink.replace_partition(JAN, &dataset("offshore", 2)).unwrap();
        let parts = sink.list_partitions().unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].table, "training_offshore");
    }
}
