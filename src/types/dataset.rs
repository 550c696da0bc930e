//! Feature rows and training samples

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Mmsi;

/// Number of per-step motion features.
pub const FEATURES_PER_STEP: usize = 9;

/// Canonical per-step feature names, in record order.
pub const FEATURE_INPUT: [&str; FEATURES_PER_STEP] = [
    "x",
    "y",
    "dx",
    "dy",
    "sog_norm",
    "cog_sin",
    "cog_cos",
    "heading_sin",
    "heading_cos",
];

/// Number of target values per sample.
pub const TARGET_WIDTH: usize = 2;

/// Target column names: next-step displacement in the scaled local frame.
pub const TARGET: [&str; TARGET_WIDTH] = ["target_dx", "target_dy"];

/// Index of each feature inside [`FeatureRow::features`].
pub mod feature_index {
    pub const X: usize = 0;
    pub const Y: usize = 1;
    pub const DX: usize = 2;
    pub const DY: usize = 3;
    pub const SOG_NORM: usize = 4;
    pub const COG_SIN: usize = 5;
    pub const COG_COS: usize = 6;
    pub const HEADING_SIN: usize = 7;
    pub const HEADING_COS: usize = 8;
}

/// A cleaned report augmented with its motion features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub mmsi: Mmsi,
    pub timestamp: NaiveDateTime,
    /// Raw speed over ground, kept for window validity checks
    pub sog: f64,
    /// Seconds since the previous report of the same vessel (0 for the first)
    pub delta_t: f64,
    pub features: [f64; FEATURES_PER_STEP],
}

impl FeatureRow {
    pub fn x(&self) -> f64 {
        self.features[feature_index::X]
    }

    pub fn y(&self) -> f64 {
        self.features[feature_index::Y]
    }
}

/// One flattened training record: `seq_len × FEATURES_PER_STEP` inputs
/// followed by [`TARGET_WIDTH`] target values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSample {
    pub mmsi: Mmsi,
    /// Position of the first window row within the vessel trajectory
    pub start_index: usize,
    pub start_time: NaiveDateTime,
    pub values: Vec<f64>,
}

impl WindowSample {
    /// Input part of the record.
    pub fn features(&self) -> &[f64] {
        &self.values[..self.values.len().saturating_sub(TARGET_WIDTH)]
    }

    /// Target part of the record.
    pub fn target(&self) -> &[f64] {
        &self.values[self.values.len().saturating_sub(TARGET_WIDTH)..]
    }

    /// Number of window steps encoded in this record.
    pub fn steps(&self) -> usize {
        self.features().len() / FEATURES_PER_STEP
    }
}

/// Column names of a flattened record: `{feature}_t{step}` then targets.
pub fn record_columns(seq_len: usize) -> Vec<String> {
    let mut columns = Vec::with_capacity(seq_len * FEATURES_PER_STEP + TARGET_WIDTH);
    for step in 0..seq_len {
        for name in FEATURE_INPUT {
            columns.push(format!("{name}_t{step}"));
        }
    }
    columns.extend(TARGET.iter().map(|t| (*t).to_string()));
    columns
}
