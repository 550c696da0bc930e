//! End-to-end pipeline scenarios
//!
//! Drives in-memory tables through classification, selection, cleaning,
//! features, windowing and the in-memory sink using only the public API.

use ais_trainset::config::PipelineConfig;
use ais_trainset::ingest::PartitionKey;
use ais_trainset::pipeline::{build_region_dataset, process_table};
use ais_trainset::region::classify;
use ais_trainset::storage::{InMemorySink, TrainingSink};
use ais_trainset::types::{RawRecord, RawTable};
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const MARCH: PartitionKey = PartitionKey { year: 2024, month: 3 };

fn report(mmsi: i64, secs: i64, lat: f64, lon: f64, sog: f64) -> RawRecord {
    let t0 = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(6, 0, 0)
        .unwrap();
    RawRecord {
        base_date_time: Some((t0 + Duration::seconds(secs)).format("%Y-%m-%dT%H:%M:%S").to_string()),
        lat: Some(lat),
        lon: Some(lon),
        sog: Some(sog),
        cog: Some(30.0),
        heading: Some(32.0),
        mmsi: Some(mmsi),
    }
}

/// Straight track inside the bay box, one report per `step_secs`.
fn bay_track(mmsi: i64, n: usize, step_secs: i64) -> Vec<RawRecord> {
    (0..n)
        .map(|i| report(mmsi, step_secs * i as i64, 37.70 + 0.002 * i as f64, -122.40 + 0.002 * i as f64, 10.0))
        .collect()
}

// ============================================================================
// Worked scenarios
// ============================================================================

#[test]
fn twelve_minute_track_in_bay_yields_two_samples() {
    let sink = InMemorySink::new();
    let report = process_table(
        &RawTable::with_full_schema(bay_track(367_555_000, 12, 60)),
        MARCH,
        &PipelineConfig::default(),
        &sink,
    )
    .unwrap();

    assert_eq!(report.rows_written, 2);
    let rows = sink.read_partition(MARCH, "bay").unwrap();
    assert_eq!(rows.len(), 2);
    for r in &rows {
        assert_eq!(r.mmsi, 367_555_000);
        assert_eq!(r.values.len(), 92);
        assert_eq!(r.id_month, 3);
    }
    assert!(sink.read_partition(MARCH, "offshore").unwrap().is_empty());
}

#[test]
fn gap_of_400_seconds_leaves_no_sample() {
    let mut rows = bay_track(1, 12, 60);
    for (i, r) in rows.iter_mut().enumerate().skip(5) {
        let secs = 4 * 60 + 400 + 60 * (i as i64 - 5);
        *r = report(1, secs, 37.70 + 0.002 * i as f64, -122.40, 10.0);
    }
    let config = PipelineConfig::default();
    let regions = classify(&RawTable::with_full_schema(rows), &config.regions).unwrap();
    let (dataset, stats) = build_region_dataset(&regions[1], &config).unwrap();
    assert_eq!(stats.cleaning.retained, 12);
    assert!(dataset.is_empty());
    assert!(dataset.columns.is_empty());
}

#[test]
fn region_corner_belongs_to_offshore() {
    let config = PipelineConfig::default();
    let table = RawTable::with_full_schema(vec![report(9, 0, 33.2, -119.1, 10.0)]);
    let regions = classify(&table, &config.regions).unwrap();
    assert_eq!(regions[0].name, "offshore");
    assert_eq!(regions[0].table.len(), 1);
    assert!(regions[1].table.is_empty());
}

#[test]
fn eleven_rows_exactly_fill_one_window_and_target() {
    let config = PipelineConfig::default();
    let regions = classify(&RawTable::with_full_schema(bay_track(5, 11, 60)), &config.regions).unwrap();
    let (dataset, _) = build_region_dataset(&regions[1], &config).unwrap();
    assert_eq!(dataset.len(), 1);

    let regions = classify(&RawTable::with_full_schema(bay_track(5, 10, 60)), &config.regions).unwrap();
    let (dataset, _) = build_region_dataset(&regions[1], &config).unwrap();
    assert!(dataset.is_empty());
}

#[test]
fn target_unscales_to_kilometres_moved() {
    let config = PipelineConfig::default();
    let regions = classify(&RawTable::with_full_schema(bay_track(5, 11, 60)), &config.regions).unwrap();
    let (dataset, _) = build_region_dataset(&regions[1], &config).unwrap();
    let reference = dataset.metadata.unwrap();

    let target = dataset.rows[0].target();
    let [east_km, north_km] = reference.delta_to_km([target[0], target[1]]);
    // 0.002 deg of latitude is about 222 m
    assert!((north_km - 0.2224).abs() < 0.001, "north {north_km}");
    assert!(east_km > 0.15 && east_km < 0.2, "east {east_km}");
}

// ============================================================================
// Determinism
// ============================================================================

#[test]
fn rerun_on_unchanged_table_is_identical() {
    let mut rows = bay_track(10, 40, 60);
    rows.extend(bay_track(11, 25, 30));
    rows.extend((0..30).map(|i| report(12, 45 * i, 33.5 + 0.001 * i as f64, -118.4, 14.0)));
    let table = RawTable::with_full_schema(rows);
    let config = PipelineConfig::default();

    let sink = InMemorySink::new();
    let first = process_table(&table, MARCH, &config, &sink).unwrap();
    let stored_first = sink.read_partition(MARCH, "bay").unwrap();
    let second = process_table(&table, MARCH, &config, &sink).unwrap();
    let stored_second = sink.read_partition(MARCH, "bay").unwrap();

    assert_eq!(first.fingerprints, second.fingerprints);
    assert_eq!(stored_first, stored_second);
    assert_eq!(
        sink.manifest(MARCH, "bay").unwrap().unwrap().fingerprint,
        first.fingerprints[1].1
    );
}

// ============================================================================
// Randomized invariants
// ============================================================================

#[test]
fn random_traffic_respects_sample_invariants() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut rows = Vec::new();
    for mmsi in 0..40 {
        let (lat0, lon0) = if rng.gen_bool(0.5) { (33.3, -118.8) } else { (37.6, -122.9) };
        let mut secs = 0;
        for i in 0..rng.gen_range(5..120u32) {
            secs += rng.gen_range(20..360);
            rows.push(report(
                mmsi,
                secs,
                lat0 + 0.001 * f64::from(i),
                lon0 + 0.001 * f64::from(i),
                rng.gen_range(2.0..44.0),
            ));
        }
    }
    // Reversed input: the cleaner restores (vessel, time) order
    rows.reverse();

    let config = PipelineConfig::default();
    let table = RawTable::with_full_schema(rows);
    let regions = classify(&table, &config.regions).unwrap();
    let total: usize = regions.iter().map(|r| r.table.len()).sum();
    assert_eq!(total, table.len(), "every generated row lies in exactly one box");

    for region in &regions {
        let region_vessels: std::collections::HashSet<_> =
            region.table.rows().iter().filter_map(|r| r.mmsi).collect();
        let (dataset, _) = build_region_dataset(region, &config).unwrap();

        let mut vessels_sampled = std::collections::HashSet::new();
        for sample in &dataset.rows {
            assert!(region_vessels.contains(&sample.mmsi));
            assert_eq!(sample.values.len(), 92);
            assert!(sample.values.iter().all(|v| v.is_finite()));
            // sog_norm of every step stays inside the window speed range
            for step in 0..10 {
                let sog = sample.values[step * 9 + 4] * config.features.speed_scale_knots;
                assert!((config.window.stop_speed - 1e-9..=config.window.max_sog + 1e-9).contains(&sog));
            }
            vessels_sampled.insert(sample.mmsi);
        }
        assert!(vessels_sampled.len() <= config.window.max_total_groups);
    }
}
