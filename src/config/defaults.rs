//! System-wide default constants.
//!
//! Every value here is the built-in default of a `PipelineConfig` field.
//! Grouped by pipeline stage for easy discovery.

// ============================================================================
// Regions
// ============================================================================

/// Offshore box (southern California bight), degrees.
pub const OFFSHORE_LAT_MIN: f64 = 33.2;
pub const OFFSHORE_LAT_MAX: f64 = 34.1;
pub const OFFSHORE_LON_MIN: f64 = -119.1;
pub const OFFSHORE_LON_MAX: f64 = -117.9;

/// Bay box (San Francisco bay approaches), degrees.
pub const BAY_LAT_MIN: f64 = 37.5;
pub const BAY_LAT_MAX: f64 = 38.2;
pub const BAY_LON_MIN: f64 = -123.0;
pub const BAY_LON_MAX: f64 = -121.8;

// ============================================================================
// Vessel Selection
// ============================================================================

/// Busiest vessels kept per region (by raw record count).
pub const TOP_VESSELS_PER_REGION: usize = 350;

// ============================================================================
// Cleaning
// ============================================================================

/// Below this speed a vessel is considered stationary or drifting (knots).
pub const MIN_SPEED_KNOTS: f64 = 6.0;

/// Above this speed a report is treated as a sensor outlier (knots).
pub const MAX_SPEED_KNOTS: f64 = 40.0;

// ============================================================================
// Features
// ============================================================================

/// Divisor for the `sog_norm` feature (knots).
pub const SPEED_SCALE_KNOTS: f64 = 40.0;

/// Mean Earth radius used by the local equirectangular projection (km).
pub const EARTH_RADIUS_KM: f64 = 6_371.008_8;

/// Standard deviations below this are replaced by 1.0 when scaling.
pub const MIN_SCALE: f64 = 1e-8;

// ============================================================================
// Windowing
// ============================================================================

/// Window length in reports.
pub const SEQ_LEN: usize = 10;

/// Step between consecutive window starts.
pub const STRIDE: usize = 1;

/// Largest allowed gap between consecutive reports inside a window (seconds).
pub const MAX_TIME_GAP_SECS: f64 = 300.0;

/// Per-vessel sample cap.
pub const MAX_SAMPLES_PER_GROUP: usize = 270_000;

/// Vessel groups scanned per region.
pub const MAX_TOTAL_GROUPS: usize = 100;

// ============================================================================
// Ingest
// ============================================================================

/// Directory scanned for raw files.
pub const RAW_DATA_DIR: &str = "raw_data";

/// Raw file naming contract: `YYYY_NOAA_AIS_logs_MM.csv`.
pub const RAW_FILE_PATTERN: &str = r"^(?P<year>\d{4})_NOAA_AIS_logs_(?P<month>\d{2})\.csv$";

/// Upstream pre-filter: reports at or below this speed are never loaded (knots).
pub const RAW_MIN_SPEED_KNOTS: f64 = 3.0;

// ============================================================================
// Storage
// ============================================================================

/// Root directory holding one sled database per year.
pub const STORE_ROOT: &str = "./data/trainset";

/// Bound on values written per batch; rows per batch = this / column count.
pub const MAX_PARAMS_PER_BATCH: usize = 2_000;

/// Lower bound on rows per batch.
pub const MIN_BATCH_ROWS: usize = 10;
