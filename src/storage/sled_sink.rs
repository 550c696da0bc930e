//! sled-backed training sink
//!
//! Layout under the store root:
//! - `Data_<year>/` one sled database per year
//! - tree `training_<region>`: key `{id_month:02}/{seq:012}`, JSON [`StoredRecord`]
//! - tree `manifests`: key `training_<region>/{id_month:02}`, JSON [`PartitionManifest`]
//!
//! Zero-padded text keys sort by month then write order, so a month is one
//! contiguous key prefix.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

use super::sink::{
    table_name, PartitionManifest, PartitionSummary, SinkError, StoredRecord, TrainingSink,
};
use crate::config::StorageConfig;
use crate::dataset::TrainingDataset;
use crate::ingest::PartitionKey;

const MANIFEST_TREE: &str = "manifests";
const TABLE_PREFIX: &str = "training_";
const DATABASE_PREFIX: &str = "Data_";

fn month_prefix(month: u32) -> String {
    format!("{month:02}/")
}

fn row_key(month: u32, seq: usize) -> String {
    format!("{month:02}/{seq:012}")
}

fn manifest_key(table: &str, month: u32) -> String {
    format!("{table}/{month:02}")
}

pub struct SledSink {
    config: StorageConfig,
    open: Mutex<BTreeMap<i32, sled::Db>>,
}

impl SledSink {
    /// Open a store rooted at `config.root`, creating the directory.
    pub fn open(config: &StorageConfig) -> Result<Self, SinkError> {
        std::fs::create_dir_all(&config.root).map_err(|e| SinkError::Io(config.root.clone(), e))?;
        Ok(Self {
            config: config.clone(),
            open: Mutex::new(BTreeMap::new()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Yearly database, opened once and cached.
    fn database(&self, year: i32) -> Result<sled::Db, SinkError> {
        let mut open = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(db) = open.get(&year) {
            return Ok(db.clone());
        }
        let path = self.root().join(format!("{DATABASE_PREFIX}{year}"));
        let db = sled::open(&path)?;
        debug!(path = %path.display(), "Opened yearly database");
        open.insert(year, db.clone());
        Ok(db)
    }

    /// Years that already have a database on disk.
    fn existing_years(&self) -> Result<Vec<i32>, SinkError> {
        let entries = std::fs::read_dir(self.root()).map_err(|e| SinkError::Io(self.root().to_path_buf(), e))?;
        let mut years = Vec::new();
        for entry in entries.flatten() {
            let name = entry.file_name();
            if let Some(year) = name
                .to_str()
                .and_then(|n| n.strip_prefix(DATABASE_PREFIX))
                .and_then(|y| y.parse().ok())
            {
                years.push(year);
            }
        }
        years.sort_unstable();
        Ok(years)
    }

    /// Remove every row of one month; returns how many were removed.
    fn delete_month(tree: &sled::Tree, month: u32) -> Result<usize, SinkError> {
        let mut batch = sled::Batch::default();
        let mut removed = 0usize;
        for item in tree.scan_prefix(month_prefix(month)) {
            let (key, _) = item?;
            batch.remove(key);
            removed += 1;
        }
        tree.apply_batch(batch)?;
        Ok(removed)
    }
}

impl TrainingSink for SledSink {
    fn replace_partition(&self, key: PartitionKey, dataset: &TrainingDataset) -> Result<usize, SinkError> {
        let db = self.database(key.year)?;
        let table = table_name(&dataset.region);
        let tree = db.open_tree(&table)?;

        let removed = Self::delete_month(&tree, key.month)?;

        // Stored columns: flattened record + id_month
        let chunk_rows = self.config.batch_rows(dataset.columns.len() + 1);
        let mut written = 0usize;
        for chunk in dataset.rows.chunks(chunk_rows) {
            let mut batch = sled::Batch::default();
            for sample in chunk {
                let record = StoredRecord::from_sample(key.month, sample);
                batch.insert(row_key(key.month, written).as_bytes(), serde_json::to_vec(&record)?);
                written += 1;
            }
            tree.apply_batch(batch)?;
        }

        let manifest = PartitionManifest::for_dataset(key, dataset);
        db.open_tree(MANIFEST_TREE)?
            .insert(manifest_key(&table, key.month), serde_json::to_vec(&manifest)?)?;
        db.flush()?;

        info!(
            database = %key.database_name(),
            table = %table,
            id_month = key.month,
            removed,
            written,
            batch_rows = chunk_rows,
            fingerprint = %manifest.fingerprint,
            "Partition replaced"
        );
        Ok(written)
    }

    fn read_partition(&self, key: PartitionKey, region: &str) -> Result<Vec<StoredRecord>, SinkError> {
        let tree = self.database(key.year)?.open_tree(table_name(region))?;
        let mut records = Vec::new();
        for item in tree.scan_prefix(month_prefix(key.month)) {
            let (_, value) = item?;
            records.push(serde_json::from_slice(&value)?);
        }
        Ok(records)
    }

    fn manifest(&self, key: PartitionKey, region: &str) -> Result<Option<PartitionManifest>, SinkError> {
        let tree = self.database(key.year)?.open_tree(MANIFEST_TREE)?;
        match tree.get(manifest_key(&table_name(region), key.month))? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    fn list_partitions(&self) -> Result<Vec<PartitionSummary>, SinkError> {
        let mut summaries = Vec::new();
        for year in self.existing_years()? {
            let db = self.database(year)?;
            let mut tables: Vec<String> = db
                .tree_names()
                .iter()
                .filter_map(|n| std::str::from_utf8(n).ok())
                .filter(|n| n.starts_with(TABLE_PREFIX))
                .map(str::to_string)
                .collect();
            tables.sort();

            for table in tables {
                let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
                for item in db.open_tree(&table)?.iter() {
                    let (key, _) = item?;
                    let month = std::str::from_utf8(&key)
                        .ok()
                        .and_then(|k| k.split('/').next())
                        .and_then(|m| m.parse().ok())
                        .ok_or_else(|| SinkError::Storage(format!("malformed key in {table}")))?;
                    *counts.entry(month).or_insert(0) += 1;
                }
                summaries.extend(counts.into_iter().map(|(id_month, rows)| PartitionSummary {
                    year,
                    table: table.clone(),
                    id_month,
                    rows,
                }));
            }
        }
        Ok(summaries)
    }

    fn backend_name(&self) -> &'static str {
        "sled"
    }
}
