//! Trajectory cleaning
//!
//! Turns one region's raw rows into typed, validated [`PositionReport`]s
//! ordered by (vessel, time), which is the layout the window sampler relies on.
//!
//! Rejects:
//! - Rows with a null, NaN or unparseable value in any required column
//! - Stationary/drifting vessels and speed outliers (outside the speed range)
//! - Repeated (vessel, timestamp) pairs (first occurrence wins)

use chrono::NaiveDateTime;
use tracing::debug;

use crate::config::CleaningConfig;
use crate::types::{Column, PositionReport, RawRecord, RawTable, SchemaError};

/// Row counters for one cleaning pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub dropped_invalid: usize,
    pub dropped_speed: usize,
    pub dropped_duplicate: usize,
    pub retained: usize,
}

/// Validate, filter and sort a region table.
///
/// Fails only when a required column is absent from the table schema.
pub fn clean(
    table: &RawTable,
    config: &CleaningConfig,
) -> Result<(Vec<PositionReport>, CleaningReport), SchemaError> {
    table.require(&Column::REQUIRED)?;

    let mut report = CleaningReport {
        input_rows: table.len(),
        ..Default::default()
    };

    let mut reports: Vec<PositionReport> = Vec::with_capacity(table.len());
    for row in table.rows() {
        let Some(parsed) = parse_row(row) else {
            report.dropped_invalid += 1;
            continue;
        };
        if parsed.sog < config.min_speed_knots || parsed.sog > config.max_speed_knots {
            report.dropped_speed += 1;
            continue;
        }
        reports.push(parsed);
    }

    // Stable: equal (mmsi, timestamp) keys keep input order
    reports.sort_by_key(|r| (r.mmsi, r.timestamp));

    let before = reports.len();
    reports.dedup_by(|later, earlier| {
        later.mmsi == earlier.mmsi && later.timestamp == earlier.timestamp
    });
    report.dropped_duplicate = before - reports.len();
    report.retained = reports.len();

    debug!(?report, "Cleaned region table");
    Ok((reports, report))
}

fn parse_row(row: &RawRecord) -> Option<PositionReport> {
    let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
    Some(PositionReport {
        mmsi: row.mmsi?,
        timestamp: parse_timestamp(row.base_date_time.as_deref()?)?,
        lat: finite(row.lat)?,
        lon: finite(row.lon)?,
        sog: finite(row.sog)?,
        cog: finite(row.cog)?,
        heading: finite(row.heading)?,
    })
}

/// Parse the AIS timestamp formats seen in practice, normalised to UTC.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim().trim_matches('"');
    if s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("nat") {
        return None;
    }

    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = chrono::DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Some(dt.naive_utc());
    }

    [
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S",
    ]
    .iter()
    .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(mmsi: i64, ts: &str, sog: f64) -> RawRecord {
        RawRecord {
            base_date_time: Some(ts.to_string()),
            lat: Some(37.8),
            lon: Some(-122.4),
            sog: Some(sog),
            cog: Some(90.0),
            heading: Some(91.0),
            mmsi: Some(mmsi),
        }
    }

    fn cfg() -> CleaningConfig {
        CleaningConfig::default()
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDateTime::parse_from_str("2023-01-01 00:01:02", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(parse_timestamp("2023-01-01T00:01:02"), Some(expected));
        assert_eq!(parse_timestamp("2023-01-01 00:01:02"), Some(expected));
        assert_eq!(parse_timestamp("2023-01-01T00:01:02Z"), Some(expected));
        assert_eq!(parse_timestamp("2023-01-01T02:01:02+02:00"), Some(expected));
        assert!(parse_timestamp("2023-01-01T00:01:02.500").is_some());
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_speed_bounds_inclusive() {
        let table = RawTable::with_full_schema(vec![
            row(1, "2023-01-01T00:00:00", 6.0),
            row(1, "2023-01-01T00:01:00", 40.0),
            row(1, "2023-01-01T00:02:00", 5.99),
            row(1, "2023-01-01T00:03:00", 40.01),
        ]);
        let (out, report) = clean(&table, &cfg()).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(report.dropped_speed, 2);
    }

    #[test]
    fn test_invalid_rows_dropped() {
        let mut no_heading = row(1, "2023-01-01T00:00:00", 10.0);
        no_heading.heading = None;
        let mut nan_lat = row(1, "2023-01-01T00:01:00", 10.0);
        nan_lat.lat = Some(f64::NAN);
        let table = RawTable::with_full_schema(vec![
            no_heading,
            nan_lat,
            row(1, "garbage", 10.0),
            row(1, "2023-01-01T00:03:00", 10.0),
        ]);
        let (out, report) = clean(&table, &cfg()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(report.dropped_invalid, 3);
        assert_eq!(report.retained, 1);
    }

    #[test]
    fn test_sorted_by_vessel_then_time() {
        let table = RawTable::with_full_schema(vec![
            row(2, "2023-01-01T00:05:00", 10.0),
            row(1, "2023-01-01T00:03:00", 10.0),
            row(2, "2023-01-01T00:01:00", 10.0),
            row(1, "2023-01-01T00:00:00", 10.0),
        ]);
        let (out, _) = clean(&table, &cfg()).unwrap();
        let keys: Vec<_> = out
            .iter()
            .map(|r| (r.mmsi, r.timestamp.format("%M").to_string()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (1, "00".to_string()),
                (1, "03".to_string()),
                (2, "01".to_string()),
                (2, "05".to_string()),
            ]
        );
    }

    #[test]
    fn test_duplicate_timestamp_keeps_first() {
        let mut second = row(1, "2023-01-01T00:00:00", 12.0);
        second.cog = Some(180.0);
        let table = RawTable::with_full_schema(vec![row(1, "2023-01-01T00:00:00", 10.0), second]);
        let (out, report) = clean(&table, &cfg()).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].sog, 10.0);
        assert_eq!(report.dropped_duplicate, 1);
    }

    #[test]
    fn test_missing_columns_is_schema_error() {
        let table = RawTable::new(
            [Column::Lat, Column::Lon, Column::Mmsi, Column::Sog],
            vec![row(1, "2023-01-01T00:00:00", 10.0)],
        );
        let err = clean(&table, &cfg()).unwrap_err();
        assert_eq!(
            err.missing,
            vec![Column::BaseDateTime, Column::Cog, Column::Heading]
        );
    }

    #[test]
    fn test_empty_table_is_not_an_error() {
        let (out, report) = clean(&RawTable::with_full_schema(Vec::new()), &cfg()).unwrap();
        assert!(out.is_empty());
        assert_eq!(report, CleaningReport::default());
    }
}
