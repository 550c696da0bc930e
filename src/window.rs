//! Sliding-window sampling
//!
//! Turns per-vessel feature trajectories into flattened training records.
//!
//! A window of `seq_len` consecutive rows plus the row that follows it (the
//! target row) is emitted only when the whole `seq_len + 1` span is
//! contiguous:
//! - every speed lies in `[stop_speed, max_sog]`
//! - every step between neighbours is at most `max_time_gap_secs`
//!
//! One bad row therefore invalidates every window that touches it. Rows are
//! never skipped and the two sides of a gap are never stitched together.
//!
//! The target is the scaled displacement from the last window row to the
//! target row: `(x[L] - x[L-1], y[L] - y[L-1])`.

use tracing::debug;

use crate::config::WindowConfig;
use crate::types::{FeatureRow, Mmsi, WindowSample, FEATURES_PER_STEP, TARGET_WIDTH};

/// Samples produced for one vessel.
#[derive(Debug, Clone, PartialEq)]
pub struct Shard {
    pub mmsi: Mmsi,
    pub samples: Vec<WindowSample>,
}

impl Shard {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Lazy iterator over the valid windows of one vessel's trajectory.
///
/// Does not apply the per-vessel cap; callers bound it with `take`.
#[derive(Debug, Clone)]
pub struct TrajectoryWindows<'a> {
    rows: &'a [FeatureRow],
    config: &'a WindowConfig,
    next_start: usize,
}

impl<'a> TrajectoryWindows<'a> {
    /// `rows` must belong to a single vessel and be sorted by time.
    pub fn new(rows: &'a [FeatureRow], config: &'a WindowConfig) -> Self {
        Self {
            rows,
            config,
            next_start: 0,
        }
    }

    fn speed_ok(&self, row: &FeatureRow) -> bool {
        (self.config.stop_speed..=self.config.max_sog).contains(&row.sog)
    }

    /// Gap to the previous row, as recorded by the feature builder.
    fn gap_ok(&self, row: &FeatureRow) -> bool {
        row.delta_t <= self.config.max_time_gap_secs
    }

    /// Window rows plus the target row, all contiguous.
    fn span_is_valid(&self, span: &[FeatureRow]) -> bool {
        span.iter().all(|r| self.speed_ok(r)) && span[1..].iter().all(|r| self.gap_ok(r))
    }

    fn sample_at(&self, start: usize) -> WindowSample {
        let seq_len = self.config.seq_len;
        let window = &self.rows[start..start + seq_len];
        let last = &window[seq_len - 1];
        let target_row = &self.rows[start + seq_len];

        let mut values = Vec::with_capacity(seq_len * FEATURES_PER_STEP + TARGET_WIDTH);
        for row in window {
            values.extend_from_slice(&row.features);
        }
        values.push(target_row.x() - last.x());
        values.push(target_row.y() - last.y());

        WindowSample {
            mmsi: window[0].mmsi,
            start_index: start,
            start_time: window[0].timestamp,
            values,
        }
    }
}

impl Iterator for TrajectoryWindows<'_> {
    type Item = WindowSample;

    fn next(&mut self) -> Option<WindowSample> {
        let span_len = self.config.seq_len + 1;
        while self.next_start + span_len <= self.rows.len() {
            let start = self.next_start;
            self.next_start += self.config.stride;
            if self.span_is_valid(&self.rows[start..start + span_len]) {
                return Some(self.sample_at(start));
            }
        }
        None
    }
}

/// Sample every vessel of a region.
///
/// `rows` must be grouped by vessel and time-sorted within each vessel, as
/// produced by the cleaner and feature builder. Vessels are visited in that
/// order; every visited vessel counts toward `max_total_groups` whether or
/// not it yields a sample. Only vessels with at least one sample get a shard.
pub fn sample_region(rows: &[FeatureRow], config: &WindowConfig) -> Vec<Shard> {
    if config.seq_len == 0 || config.stride == 0 {
        return Vec::new();
    }

    let mut shards = Vec::new();
    let mut groups_visited = 0usize;

    for group in rows
        .chunk_by(|a, b| a.mmsi == b.mmsi)
        .take(config.max_total_groups)
    {
        groups_visited += 1;
        let samples: Vec<WindowSample> = TrajectoryWindows::new(group, config)
            .take(config.max_samples_per_group)
            .collect();

        debug!(
            mmsi = group[0].mmsi,
            rows = group.len(),
            samples = samples.len(),
            "Sampled vessel trajectory"
        );

        if !samples.is_empty() {
            shards.push(Shard {
                mmsi: group[0].mmsi,
                samples,
            });
        }
    }

    debug!(
        groups_visited,
        shards = shards.len(),
        samples = shards.iter().map(Shard::len).sum::<usize>(),
        "Sampled region"
    );
    shards
}
