//! File and batch runners

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::builder::{build_region_dataset, RegionStats};
use super::PipelineError;
use crate::config::PipelineConfig;
use crate::ingest::{discover_raw_files, read_reduced_table, PartitionKey, PreFilter, RawFileNaming};
use crate::region::classify;
use crate::storage::TrainingSink;
use crate::types::RawTable;

/// Result of one successfully processed file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileReport {
    pub key: PartitionKey,
    pub regions: Vec<RegionStats>,
    pub rows_written: usize,
    /// Dataset fingerprint per region, in region order
    pub fingerprints: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileStatus {
    Written(FileReport),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub status: FileStatus,
}

/// Per-file outcomes of a batch run, in processing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub files: Vec<FileOutcome>,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.status, FileStatus::Written(_)))
            .count()
    }

    pub fn failed(&self) -> impl Iterator<Item = (&Path, &str)> {
        self.files.iter().filter_map(|f| match &f.status {
            FileStatus::Failed(e) => Some((f.path.as_path(), e.as_str())),
            FileStatus::Written(_) => None,
        })
    }

    pub fn rows_written(&self) -> usize {
        self.files
            .iter()
            .map(|f| match &f.status {
                FileStatus::Written(r) => r.rows_written,
                FileStatus::Failed(_) => 0,
            })
            .sum()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Run: {} files, {} written, {} failed, {} rows",
            self.files.len(),
            self.succeeded(),
            self.failed().count(),
            self.rows_written()
        )
    }
}

/// Build every region of an in-memory table, then write each to the sink.
pub fn process_table(
    table: &RawTable,
    key: PartitionKey,
    config: &PipelineConfig,
    sink: &dyn TrainingSink,
) -> Result<FileReport, PipelineError> {
    let mut built = Vec::with_capacity(config.regions.len());
    for region in classify(table, &config.regions)? {
        let (dataset, stats) = build_region_dataset(&region, config)?;
        built.push((dataset.tag_month(key.month), stats));
    }

    let mut report = FileReport {
        key,
        regions: Vec::with_capacity(built.len()),
        rows_written: 0,
        fingerprints: Vec::with_capacity(built.len()),
    };
    for (dataset, stats) in built {
        report.rows_written += sink.replace_partition(key, &dataset)?;
        report
            .fingerprints
            .push((dataset.region.clone(), dataset.fingerprint()));
        report.regions.push(stats);
    }
    Ok(report)
}

/// Parse the partition key from the file name, read and process one file.
pub fn process_path(
    path: &Path,
    naming: &RawFileNaming,
    config: &PipelineConfig,
    sink: &dyn TrainingSink,
) -> Result<FileReport, PipelineError> {
    let key = naming.parse_path(path)?;
    let (table, _) = read_reduced_table(path, &PreFilter::from_config(config))?;
    process_table(&table, key, config, sink)
}

/// Process files in order. A failing file is recorded and skipped.
pub fn run_paths(
    paths: &[PathBuf],
    config: &PipelineConfig,
    sink: &dyn TrainingSink,
) -> Result<RunSummary, PipelineError> {
    let naming = RawFileNaming::new(&config.ingest.file_pattern)?;
    let mut summary = RunSummary::default();

    for path in paths {
        info!(file = %path.display(), backend = sink.backend_name(), "Processing raw file");
        let status = match process_path(path, &naming, config, sink) {
            Ok(report) => {
                info!(
                    file = %path.display(),
                    partition = %report.key,
                    rows = report.rows_written,
                    "File done"
                );
                FileStatus::Written(report)
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "File failed, continuing with next");
                FileStatus::Failed(e.to_string())
            }
        };
        summary.files.push(FileOutcome {
            path: path.clone(),
            status,
        });
    }

    info!("{}", summary);
    Ok(summary)
}

/// Discover raw files under `config.ingest.raw_dir` and process them all.
pub fn run_directory(config: &PipelineConfig, sink: &dyn TrainingSink) -> Result<RunSummary, PipelineError> {
    let naming = RawFileNaming::new(&config.ingest.file_pattern)?;
    let files = discover_raw_files(&config.ingest.raw_dir, &naming)?;
    info!(dir = %config.ingest.raw_dir.display(), files = files.len(), "Discovered raw files");
    let paths: Vec<PathBuf> = files.into_iter().map(|f| f.path).collect();
    run_paths(&paths, config, sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemorySink;
    use crate::types::{Column, RawRecord};

    const JAN: PartitionKey = PartitionKey { year: 2023, month: 1 };

    fn rows(lat: f64, lon: f64, mmsi: i64, n: usize) -> Vec<RawRecord> {
        (0..n)
            .map(|i| RawRecord {
                base_date_time: Some(format!("2023-01-01 01:{i:02}:00")),
                lat: Some(lat + 0.001 * i as f64),
                lon: Some(lon),
                sog: Some(12.0),
                cog: Some(0.0),
                heading: Some(0.0),
                mmsi: Some(mmsi),
            })
            .collect()
    }

    #[test]
    fn test_process_table_writes_every_region() {
        let mut all = rows(33.5, -118.5, 1, 13);
        all.extend(rows(37.6, -122.5, 2, 12));
        let sink = InMemorySink::new();
        let report = process_table(
            &RawTable::with_full_schema(all),
            JAN,
            &PipelineConfig::default(),
            &sink,
        )
        .unwrap();

        assert_eq!(report.rows_written, 5);
        assert_eq!(sink.read_partition(JAN, "offshore").unwrap().len(), 3);
        assert_eq!(sink.read_partition(JAN, "bay").unwrap().len(), 2);
        assert!(sink
            .read_partition(JAN, "bay")
            .unwrap()
            .iter()
            .all(|r| r.id_month == 1));
        assert_eq!(report.fingerprints.len(), 2);
    }

    #[test]
    fn test_schema_error_writes_nothing() {
        let table = RawTable::new(
            [Column::Lat, Column::Lon, Column::Mmsi],
            rows(37.6, -122.5, 2, 12),
        );
        let sink = InMemorySink::new();
        let err = process_table(&table, JAN, &PipelineConfig::default(), &sink).unwrap_err();
        assert!(matches!(err, PipelineError::Schema(_)));
        assert!(sink.list_partitions().unwrap().is_empty());
    }

    #[test]
    fn test_bad_file_name_is_recorded() {
        let sink = InMemorySink::new();
        let summary = run_paths(
            &[PathBuf::from("/tmp/not_a_raw_file.csv")],
            &PipelineConfig::default(),
            &sink,
        )
        .unwrap();
        assert_eq!(summary.succeeded(), 0);
        let failed: Vec<_> = summary.failed().collect();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].1.contains("naming pattern"));
    }
}
