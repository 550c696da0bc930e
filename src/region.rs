//! Region classification
//!
//! Partitions a reduced AIS table into named, disjoint latitude/longitude
//! boxes. Bounds are inclusive on all four sides. Rows outside every box (or
//! without a usable position) are dropped; row order is preserved inside each
//! region.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{Column, RawTable, SchemaError};

/// A named rectangular latitude/longitude box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl Region {
    pub fn new(name: impl Into<String>, lat_min: f64, lat_max: f64, lon_min: f64, lon_max: f64) -> Self {
        Self {
            name: name.into(),
            lat_min,
            lat_max,
            lon_min,
            lon_max,
        }
    }

    /// Inclusive containment test.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.lat_min..=self.lat_max).contains(&lat) && (self.lon_min..=self.lon_max).contains(&lon)
    }

    /// Whether two boxes share any point (touching edges count).
    pub fn overlaps(&self, other: &Self) -> bool {
        self.lat_min <= other.lat_max
            && other.lat_min <= self.lat_max
            && self.lon_min <= other.lon_max
            && other.lon_min <= self.lon_max
    }

    /// Latitude band of the box, used by the upstream pre-filter.
    pub fn lat_band(&self) -> (f64, f64) {
        (self.lat_min, self.lat_max)
    }

    /// Structural sanity of a single box.
    pub fn check(&self) -> Result<(), String> {
        let values = [self.lat_min, self.lat_max, self.lon_min, self.lon_max];
        if self.name.trim().is_empty() {
            return Err("region name must not be empty".to_string());
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(format!("region '{}': bounds must be finite", self.name));
        }
        if self.lat_min > self.lat_max || self.lon_min > self.lon_max {
            return Err(format!("region '{}': min bound exceeds max bound", self.name));
        }
        Ok(())
    }
}

/// Rows of one region, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionTable {
    pub name: String,
    pub table: RawTable,
}

/// Split `table` into one [`RegionTable`] per configured region, in config order.
///
/// Every region is present in the output, possibly empty. A row is assigned to
/// the first region containing it; with disjoint boxes that is the only one.
pub fn classify(table: &RawTable, regions: &[Region]) -> Result<Vec<RegionTable>, SchemaError> {
    table.require(&Column::POSITION)?;

    let mut buckets: Vec<Vec<_>> = vec![Vec::new(); regions.len()];
    let mut dropped = 0usize;

    for row in table.rows() {
        let slot = row
            .position()
            .and_then(|(lat, lon)| regions.iter().position(|r| r.contains(lat, lon)));
        match slot {
            Some(i) => buckets[i].push(row.clone()),
            None => dropped += 1,
        }
    }

    debug!(rows = table.len(), dropped, "Classified rows into regions");

    Ok(regions
        .iter()
        .zip(buckets)
        .map(|(region, rows)| RegionTable {
            name: region.name.clone(),
            table: table.subset(rows),
        })
        .collect())
}
