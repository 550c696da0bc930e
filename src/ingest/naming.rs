//! Raw file naming contract
//!
//! Files are named `YYYY_NOAA_AIS_logs_MM.<ext>`. The year selects the
//! destination database, the month becomes the `id_month` partition.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::IngestError;

/// (year, month) parsed from a raw file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartitionKey {
    pub year: i32,
    pub month: u32,
}

impl PartitionKey {
    /// Name of the yearly database instance.
    pub fn database_name(&self) -> String {
        format!("Data_{}", self.year)
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Compiled file name pattern with named groups `year` and `month`.
#[derive(Debug, Clone)]
pub struct RawFileNaming {
    pattern: Regex,
}

impl RawFileNaming {
    pub fn new(pattern: &str) -> Result<Self, IngestError> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    /// Partition key of a bare file name; `None` if it does not match or the
    /// month is out of range.
    pub fn parse(&self, file_name: &str) -> Option<PartitionKey> {
        let caps = self.pattern.captures(file_name)?;
        let year = caps.name("year")?.as_str().parse().ok()?;
        let month = caps.name("month")?.as_str().parse().ok()?;
        (1..=12).contains(&month).then_some(PartitionKey { year, month })
    }

    /// Partition key of a path, or [`IngestError::FileName`].
    pub fn parse_path(&self, path: &Path) -> Result<PartitionKey, IngestError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        self.parse(name)
            .ok_or_else(|| IngestError::FileName(name.to_string()))
    }
}

/// A raw file together with its partition key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    pub path: PathBuf,
    pub key: PartitionKey,
}

/// List matching raw files in `dir`, ordered by (year, month, name).
///
/// Files that do not match the naming pattern are skipped.
pub fn discover_raw_files(dir: &Path, naming: &RawFileNaming) -> Result<Vec<RawFile>, IngestError> {
    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::Io(dir.to_path_buf(), e))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|e| IngestError::Io(dir.to_path_buf(), e))?
            .path();
        if !path.is_file() {
            continue;
        }
        match naming.parse_path(&path) {
            Ok(key) => files.push(RawFile { path, key }),
            Err(_) => debug!(file = %path.display(), "Skipping file outside naming contract"),
        }
    }

    files.sort_by(|a, b| a.key.cmp(&b.key).then_with(|| a.path.cmp(&b.path)));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::RAW_FILE_PATTERN;

    fn naming() -> RawFileNaming {
        RawFileNaming::new(RAW_FILE_PATTERN).unwrap()
    }

    #[test]
    fn test_parse_partition() {
        let key = naming().parse("2023_NOAA_AIS_logs_07.csv").unwrap();
        assert_eq!(key, PartitionKey { year: 2023, month: 7 });
        assert_eq!(key.database_name(), "Data_2023");
        assert_eq!(key.to_string(), "2023-07");
    }

    #[test]
    fn test_rejects_bad_names() {
        let n = naming();
        assert!(n.parse("2023_NOAA_AIS_logs_13.csv").is_none());
        assert!(n.parse("23_NOAA_AIS_logs_01.csv").is_none());
        assert!(n.parse("2023_NOAA_AIS_logs_01.csv.bak").is_none());
        assert!(matches!(
            n.parse_path(Path::new("/tmp/notes.txt")),
            Err(IngestError::FileName(name)) if name == "notes.txt"
        ));
    }

    #[test]
    fn test_discover_sorts_and_skips() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "2023_NOAA_AIS_logs_02.csv",
            "2022_NOAA_AIS_logs_11.csv",
            "2023_NOAA_AIS_logs_01.csv",
            "README.md",
        ] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        std::fs::create_dir(dir.path().join("2021_NOAA_AIS_logs_01.csv")).unwrap();

        let files = discover_raw_files(dir.path(), &naming()).unwrap();
        let keys: Vec<_> = files.iter().map(|f| f.key.to_string()).collect();
        assert_eq!(keys, vec!["2022-11", "2023-01", "2023-02"]);
    }
}
