//! Vessel selection
//!
//! Caps the population of a region to its busiest vessels before the
//! expensive cleaning and feature stages run.

use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::types::{Mmsi, RawTable};

/// Vessels ranked by record count, busiest first.
///
/// Ties are broken by ascending MMSI so the ranking is a pure function of the
/// input rows. Rows without an MMSI are not counted.
pub fn rank_vessels(table: &RawTable) -> Vec<(Mmsi, usize)> {
    let mut counts: HashMap<Mmsi, usize> = HashMap::new();
    for mmsi in table.rows().iter().filter_map(|r| r.mmsi) {
        *counts.entry(mmsi).or_insert(0) += 1;
    }

    let mut ranked: Vec<(Mmsi, usize)> = counts.into_iter().collect();
    ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

/// Keep only rows belonging to the `top_k` busiest vessels, in input order.
pub fn select_top_vessels(table: &RawTable, top_k: usize) -> RawTable {
    let ranked = rank_vessels(table);
    let vessel_count = ranked.len();
    let keep: HashSet<Mmsi> = ranked.into_iter().take(top_k).map(|(m, _)| m).collect();

    let rows: Vec<_> = table
        .rows()
        .iter()
        .filter(|r| r.mmsi.is_some_and(|m| keep.contains(&m)))
        .cloned()
        .collect();

    debug!(
        vessels = vessel_count,
        kept_vessels = keep.len(),
        rows_in = table.len(),
        rows_out = rows.len(),
        "Selected busiest vessels"
    );

    table.subset(rows)
}
