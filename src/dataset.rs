//! Dataset assembly
//!
//! Concatenates a region's per-vessel shards into one training table and
//! attaches provenance: the fitted [`SpatialReference`] and, once known, the
//! month partition key.

use serde::{Deserialize, Serialize};

use crate::features::SpatialReference;
use crate::types::{record_columns, WindowSample};
use crate::window::Shard;

/// One region's training table for one raw file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingDataset {
    pub region: String,
    /// Flattened record column names; empty when there are no rows
    pub columns: Vec<String>,
    pub rows: Vec<WindowSample>,
    pub metadata: Option<SpatialReference>,
    /// Month partition key, written as `id_month` by the sink
    pub id_month: Option<u32>,
}

impl TrainingDataset {
    /// Explicitly empty dataset: no columns, no rows.
    pub fn empty(region: impl Into<String>, metadata: Option<SpatialReference>) -> Self {
        Self {
            region: region.into(),
            columns: Vec::new(),
            rows: Vec::new(),
            metadata,
            id_month: None,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Attach the month partition key.
    #[must_use]
    pub fn tag_month(mut self, month: u32) -> Self {
        self.id_month = Some(month);
        self
    }

    /// MD5 over column names and row values, as lowercase hex.
    ///
    /// Values are hashed by bit pattern, so two datasets share a fingerprint
    /// only when every value is bit-identical.
    pub fn fingerprint(&self) -> String {
        let mut ctx = md5::Context::new();
        ctx.consume(self.region.as_bytes());
        ctx.consume([0u8]);
        for column in &self.columns {
            ctx.consume(column.as_bytes());
            ctx.consume([0u8]);
        }
        for row in &self.rows {
            ctx.consume(row.mmsi.to_le_bytes());
            for v in &row.values {
                ctx.consume(v.to_bits().to_le_bytes());
            }
        }
        format!("{:x}", ctx.compute())
    }
}

/// Concatenate shards in the order produced, rows in shard order.
pub fn assemble(
    region: &str,
    shards: Vec<Shard>,
    metadata: Option<SpatialReference>,
    seq_len: usize,
) -> TrainingDataset {
    let rows: Vec<WindowSample> = shards.into_iter().flat_map(|s| s.samples).collect();
    if rows.is_empty() {
        return TrainingDataset::empty(region, metadata);
    }
    TrainingDataset {
        region: region.to_string(),
        columns: record_columns(seq_len),
        rows,
        metadata,
        id_month: None,
    }
}
