//! AIS position report types
//!
//! Two layers of the same observation:
//! - [`RawRecord`] / [`RawTable`]: the reduced table handed over by the
//!   upstream reader. Every field is nullable and the timestamp is still text,
//!   and the table carries the set of columns that were actually present.
//! - [`PositionReport`]: a fully typed, validated observation produced by the
//!   trajectory cleaner.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::SchemaError;

/// Maritime Mobile Service Identity.
pub type Mmsi = i64;

/// Canonical columns of the reduced AIS table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Column {
    BaseDateTime,
    Lat,
    Lon,
    Sog,
    Cog,
    Heading,
    Mmsi,
}

impl Column {
    /// Every column the trajectory cleaner needs.
    pub const REQUIRED: [Self; 7] = [
        Self::BaseDateTime,
        Self::Lat,
        Self::Lon,
        Self::Sog,
        Self::Cog,
        Self::Heading,
        Self::Mmsi,
    ];

    /// Columns the region classifier needs.
    pub const POSITION: [Self; 2] = [Self::Lat, Self::Lon];

    /// Name as it appears in NOAA AIS exports.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BaseDateTime => "BaseDateTime",
            Self::Lat => "LAT",
            Self::Lon => "LON",
            Self::Sog => "SOG",
            Self::Cog => "COG",
            Self::Heading => "Heading",
            Self::Mmsi => "MMSI",
        }
    }

    /// Resolve a header name (case-insensitive, a few common aliases).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "BASEDATETIME" | "TIMESTAMP" | "DATETIME" => Some(Self::BaseDateTime),
            "LAT" | "LATITUDE" => Some(Self::Lat),
            "LON" | "LONGITUDE" => Some(Self::Lon),
            "SOG" | "SPEED" => Some(Self::Sog),
            "COG" | "COURSE" => Some(Self::Cog),
            "HEADING" => Some(Self::Heading),
            "MMSI" => Some(Self::Mmsi),
            _ => None,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the reduced table, before any validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub base_date_time: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub sog: Option<f64>,
    pub cog: Option<f64>,
    pub heading: Option<f64>,
    pub mmsi: Option<Mmsi>,
}

impl RawRecord {
    /// Latitude/longitude pair when both are present and finite.
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => Some((lat, lon)),
            _ => None,
        }
    }
}

/// Reduced in-memory table: schema plus rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    schema: BTreeSet<Column>,
    rows: Vec<RawRecord>,
}

impl RawTable {
    pub fn new(schema: impl IntoIterator<Item = Column>, rows: Vec<RawRecord>) -> Self {
        Self {
            schema: schema.into_iter().collect(),
            rows,
        }
    }

    /// Table carrying every required column.
    pub fn with_full_schema(rows: Vec<RawRecord>) -> Self {
        Self::new(Column::REQUIRED, rows)
    }

    /// Same schema, different rows. Used when partitioning a table.
    pub fn subset(&self, rows: Vec<RawRecord>) -> Self {
        Self {
            schema: self.schema.clone(),
            rows,
        }
    }

    pub fn schema(&self) -> &BTreeSet<Column> {
        &self.schema
    }

    pub fn rows(&self) -> &[RawRecord] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<RawRecord> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: Column) -> bool {
        self.schema.contains(&column)
    }

    /// Fail with every absent column listed.
    pub fn require(&self, columns: &[Column]) -> Result<(), SchemaError> {
        let missing: Vec<Column> = columns
            .iter()
            .copied()
            .filter(|c| !self.has_column(*c))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SchemaError { missing })
        }
    }
}

/// A validated AIS observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    pub mmsi: Mmsi,
    pub timestamp: NaiveDateTime,
    /// Degrees north
    pub lat: f64,
    /// Degrees east
    pub lon: f64,
    /// Speed over ground (knots)
    pub sog: f64,
    /// Course over ground (degrees)
    pub cog: f64,
    /// True heading (degrees)
    pub heading: f64,
}
