//! Per-region dataset construction

use tracing::info;

use super::PipelineError;
use crate::cleaning::{clean, CleaningReport};
use crate::config::PipelineConfig;
use crate::dataset::{assemble, TrainingDataset};
use crate::features::build_features;
use crate::region::RegionTable;
use crate::selection::select_top_vessels;
use crate::window::sample_region;

/// Row counts at each stage of one region build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionStats {
    pub region: String,
    pub input_rows: usize,
    pub selected_rows: usize,
    pub cleaning: CleaningReport,
    pub shards: usize,
    pub samples: usize,
}

/// Select, clean, featurise, window and assemble one region.
///
/// An empty region yields an explicitly empty dataset; only a schema problem
/// is an error.
pub fn build_region_dataset(
    region: &RegionTable,
    config: &PipelineConfig,
) -> Result<(TrainingDataset, RegionStats), PipelineError> {
    let selected = select_top_vessels(&region.table, config.selection.top_vessels_per_region);
    let (reports, cleaning) = clean(&selected, &config.cleaning)?;
    let (rows, reference) = build_features(&reports, &config.features);
    let shards = sample_region(&rows, &config.window);

    let stats = RegionStats {
        region: region.name.clone(),
        input_rows: region.table.len(),
        selected_rows: selected.len(),
        cleaning,
        shards: shards.len(),
        samples: shards.iter().map(|s| s.len()).sum(),
    };

    let dataset = assemble(&region.name, shards, reference, config.window.seq_len);

    info!(
        region = %stats.region,
        input = stats.input_rows,
        selected = stats.selected_rows,
        cleaned = stats.cleaning.retained,
        vessels = stats.shards,
        samples = stats.samples,
        "Region dataset built"
    );

    Ok((dataset, stats))
}
