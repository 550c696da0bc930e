//! Reduced-table reader
//!
//! Reads a raw AIS CSV export into a [`RawTable`] holding only the canonical
//! columns. Header names are resolved with [`Column::from_name`]; any other
//! column is ignored. Empty or unparseable cells become nulls and are left for
//! the cleaner to reject.
//!
//! The upstream pre-filter is applied while reading:
//! - `SOG` strictly above the raw minimum speed
//! - `COG` and `Heading` in `[0, 360)`
//! - `LAT` inside at least one region latitude band
//!
//! A predicate on a column the file does not carry is skipped, so a missing
//! column surfaces as a schema error downstream instead of an empty table.

use std::path::Path;
use tracing::info;

use super::IngestError;
use crate::config::PipelineConfig;
use crate::types::{Column, Mmsi, RawRecord, RawTable};

/// Row predicate applied at read time.
#[derive(Debug, Clone, PartialEq)]
pub struct PreFilter {
    pub min_speed_knots: f64,
    pub lat_bands: Vec<(f64, f64)>,
}

impl PreFilter {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            min_speed_knots: config.ingest.min_raw_speed_knots,
            lat_bands: config.regions.iter().map(|r| r.lat_band()).collect(),
        }
    }

    /// Passes every row. Used when a table is already reduced.
    pub fn none() -> Self {
        Self {
            min_speed_knots: f64::NEG_INFINITY,
            lat_bands: Vec::new(),
        }
    }

    fn accepts(&self, schema: &RawTable, row: &RawRecord) -> bool {
        let angle = |v: Option<f64>| v.is_some_and(|a| (0.0..360.0).contains(&a));

        if schema.has_column(Column::Sog)
            && !row.sog.is_some_and(|s| s > self.min_speed_knots)
        {
            return false;
        }
        if schema.has_column(Column::Cog) && !angle(row.cog) {
            return false;
        }
        if schema.has_column(Column::Heading) && !angle(row.heading) {
            return false;
        }
        if schema.has_column(Column::Lat) && !self.lat_bands.is_empty() {
            let in_band = row
                .lat
                .is_some_and(|lat| self.lat_bands.iter().any(|(lo, hi)| (*lo..=*hi).contains(&lat)));
            if !in_band {
                return false;
            }
        }
        true
    }
}

/// Row counters for one file read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadStats {
    pub rows_read: usize,
    pub rows_filtered: usize,
    pub rows_kept: usize,
}

/// Read one raw CSV file into a reduced table.
pub fn read_reduced_table(path: &Path, filter: &PreFilter) -> Result<(RawTable, ReadStats), IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| IngestError::Csv(path.to_path_buf(), e))?;

    let header = reader
        .headers()
        .map_err(|e| IngestError::Csv(path.to_path_buf(), e))?
        .clone();

    // First occurrence of each canonical column wins
    let mut mapping: Vec<(usize, Column)> = Vec::new();
    for (idx, name) in header.iter().enumerate() {
        if let Some(col) = Column::from_name(name) {
            if !mapping.iter().any(|(_, c)| *c == col) {
                mapping.push((idx, col));
            }
        }
    }

    let shell = RawTable::new(mapping.iter().map(|(_, c)| *c), Vec::new());
    let mut rows = Vec::new();
    let mut stats = ReadStats::default();

    for record in reader.records() {
        let record = record.map_err(|e| IngestError::Csv(path.to_path_buf(), e))?;
        stats.rows_read += 1;

        let mut row = RawRecord::default();
        for (idx, col) in &mapping {
            let cell = record.get(*idx).filter(|c| !c.is_empty());
            match col {
                Column::BaseDateTime => row.base_date_time = cell.map(str::to_string),
                Column::Lat => row.lat = cell.and_then(parse_f64),
                Column::Lon => row.lon = cell.and_then(parse_f64),
                Column::Sog => row.sog = cell.and_then(parse_f64),
                Column::Cog => row.cog = cell.and_then(parse_f64),
                Column::Heading => row.heading = cell.and_then(parse_f64),
                Column::Mmsi => row.mmsi = cell.and_then(parse_mmsi),
            }
        }

        if filter.accepts(&shell, &row) {
            rows.push(row);
        } else {
            stats.rows_filtered += 1;
        }
    }
    stats.rows_kept = rows.len();

    info!(
        file = %path.display(),
        columns = mapping.len(),
        read = stats.rows_read,
        filtered = stats.rows_filtered,
        kept = stats.rows_kept,
        "Reduced table loaded"
    );

    Ok((shell.subset(rows), stats))
}

fn parse_f64(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Integer MMSI; tolerates float-formatted exports such as `367000123.0`.
fn parse_mmsi(cell: &str) -> Option<Mmsi> {
    if let Ok(v) = cell.parse::<Mmsi>() {
        return Some(v);
    }
    let v = cell.parse::<f64>().ok()?;
    (v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15).then_some(v as Mmsi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "MMSI,BaseDateTime,LAT,LON,SOG,COG,Heading,VesselName";

    fn write_csv(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file
    }

    fn filter() -> PreFilter {
        PreFilter::from_config(&PipelineConfig::default())
    }

    #[test]
    fn test_reads_canonical_columns() {
        let file = write_csv(&[
            HEADER,
            "367000123,2023-01-01T00:00:00,37.80,-122.40,10.5,90.0,91,ALPHA",
        ]);
        let (table, stats) = read_reduced_table(file.path(), &filter()).unwrap();
        assert_eq!(stats.rows_kept, 1);
        assert!(table.require(&Column::REQUIRED).is_ok());
        let row = &table.rows()[0];
        assert_eq!(row.mmsi, Some(367_000_123));
        assert_eq!(row.base_date_time.as_deref(), Some("2023-01-01T00:00:00"));
        assert_eq!(row.heading, Some(91.0));
    }

    #[test]
    fn test_pre_filter() {
        let file = write_csv(&[
            HEADER,
            "1,2023-01-01T00:00:00,37.80,-122.40,3.0,90,90,slow",
            "1,2023-01-01T00:00:00,37.80,-122.40,8.0,360,90,bad cog",
            "1,2023-01-01T00:00:00,37.80,-122.40,8.0,90,511,heading unavailable",
            "1,2023-01-01T00:00:00,36.00,-122.40,8.0,90,90,between bands",
            "1,2023-01-01T00:00:00,37.80,-122.40,,90,90,null speed",
            "1,2023-01-01T00:00:00,33.50,-118.50,3.1,0,359.9,kept",
        ]);
        let (table, stats) = read_reduced_table(file.path(), &filter()).unwrap();
        assert_eq!(stats.rows_read, 6);
        assert_eq!(stats.rows_filtered, 5);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].lat, Some(33.5));
    }

    #[test]
    fn test_missing_column_is_kept_for_schema_check() {
        let file = write_csv(&["MMSI,BaseDateTime,LAT,LON,SOG,COG", "1,2023-01-01T00:00:00,37.8,-122.4,8,90"]);
        let (table, _) = read_reduced_table(file.path(), &filter()).unwrap();
        assert_eq!(table.len(), 1);
        assert!(!table.has_column(Column::Heading));
    }

    #[test]
    fn test_unparseable_cells_become_null() {
        let file = write_csv(&[HEADER, "367000123.0,garbage,37.8,-122.4,8,90,90,x"]);
        let (table, _) = read_reduced_table(file.path(), &PreFilter::none()).unwrap();
        let row = &table.rows()[0];
        assert_eq!(row.mmsi, Some(367_000_123));
        assert_eq!(row.base_date_time.as_deref(), Some("garbage"));

        let file = write_csv(&[HEADER, "abc,2023-01-01T00:00:00,north,-122.4,8,90,90,x"]);
        let (table, _) = read_reduced_table(file.path(), &PreFilter::none()).unwrap();
        assert_eq!(table.rows()[0].mmsi, None);
        assert_eq!(table.rows()[0].lat, None);
    }

    #[test]
    fn test_ragged_rows_are_an_error() {
        let file = write_csv(&[HEADER, "1,2023-01-01T00:00:00,37.8"]);
        assert!(matches!(
            read_reduced_table(file.path(), &filter()),
            Err(IngestError::Csv(..))
        ));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = read_reduced_table(Path::new("/nonexistent/2023_NOAA_AIS_logs_01.csv"), &filter())
            .unwrap_err();
        assert!(matches!(err, IngestError::Csv(..)));
    }
}
