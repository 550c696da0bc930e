//! Pipeline Configuration - every stage constant as an operator-tunable TOML value
//!
//! Each section implements `Default` with the values in `defaults.rs`, so a run
//! without a config file behaves exactly like the built-in pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;
use crate::region::Region;

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "AIS_TRAINSET_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "trainset.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one pipeline run.
///
/// Load with `PipelineConfig::load()` which searches:
/// 1. `$AIS_TRAINSET_CONFIG`
/// 2. `./trainset.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Geographic boxes, processed in this order
    #[serde(default = "default_regions")]
    pub regions: Vec<Region>,

    #[serde(default)]
    pub selection: SelectionConfig,

    #[serde(default)]
    pub cleaning: CleaningConfig,

    #[serde(default)]
    pub features: FeatureConfig,

    #[serde(default)]
    pub window: WindowConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            regions: default_regions(),
            selection: SelectionConfig::default(),
            cleaning: CleaningConfig::default(),
            features: FeatureConfig::default(),
            window: WindowConfig::default(),
            ingest: IngestConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

fn default_regions() -> Vec<Region> {
    vec![
        Region::new(
            "offshore",
            defaults::OFFSHORE_LAT_MIN,
            defaults::OFFSHORE_LAT_MAX,
            defaults::OFFSHORE_LON_MIN,
            defaults::OFFSHORE_LON_MAX,
        ),
        Region::new(
            "bay",
            defaults::BAY_LAT_MIN,
            defaults::BAY_LAT_MAX,
            defaults::BAY_LON_MIN,
            defaults::BAY_LON_MAX,
        ),
    ]
}

impl PipelineConfig {
    /// Load configuration using the standard search order:
    /// 1. `$AIS_TRAINSET_CONFIG` environment variable
    /// 2. `./trainset.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded pipeline config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded pipeline config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document. Unknown keys only warn.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Pipeline config saved");
        Ok(())
    }

    /// Look up a configured region by name.
    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    /// Validate every section for internal consistency.
    ///
    /// Rules:
    /// - All numeric values finite
    /// - Every min <= max pair ordered
    /// - Region names unique and boxes disjoint
    /// - Lengths, strides and caps > 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        if self.regions.is_empty() {
            errors.push("at least one region must be configured".to_string());
        }
        for (i, region) in self.regions.iter().enumerate() {
            if let Err(e) = region.check() {
                errors.push(e);
            }
            for other in &self.regions[i + 1..] {
                if region.name == other.name {
                    errors.push(format!("region name '{}' is used twice", region.name));
                }
                if region.overlaps(other) {
                    errors.push(format!(
                        "regions '{}' and '{}' overlap; boxes must be disjoint",
                        region.name, other.name
                    ));
                }
            }
        }

        if self.selection.top_vessels_per_region == 0 {
            errors.push("selection.top_vessels_per_region must be > 0".to_string());
        }

        Self::check_range(
            self.cleaning.min_speed_knots,
            self.cleaning.max_speed_knots,
            "cleaning.speed",
            &mut errors,
        );

        let w = &self.window;
        if w.seq_len == 0 {
            errors.push("window.seq_len must be > 0".to_string());
        }
        if w.stride == 0 {
            errors.push("window.stride must be > 0".to_string());
        }
        if w.max_samples_per_group == 0 {
            errors.push("window.max_samples_per_group must be > 0".to_string());
        }
        if w.max_total_groups == 0 {
            errors.push("window.max_total_groups must be > 0".to_string());
        }
        Self::check_range(w.stop_speed, w.max_sog, "window.speed", &mut errors);
        if !w.max_time_gap_secs.is_finite() || w.max_time_gap_secs <= 0.0 {
            errors.push(format!(
                "window.max_time_gap_secs must be a positive number (got {})",
                w.max_time_gap_secs
            ));
        }

        if !self.features.speed_scale_knots.is_finite() || self.features.speed_scale_knots <= 0.0
        {
            errors.push("features.speed_scale_knots must be > 0 (used as divisor)".to_string());
        }

        match regex::Regex::new(&self.ingest.file_pattern) {
            Ok(re) => {
                let names: Vec<&str> = re.capture_names().flatten().collect();
                if !names.contains(&"year") || !names.contains(&"month") {
                    errors.push(
                        "ingest.file_pattern must capture named groups 'year' and 'month'".to_string(),
                    );
                }
            }
            Err(e) => errors.push(format!("ingest.file_pattern is not a valid regex: {e}")),
        }

        if self.storage.max_params_per_batch == 0 || self.storage.min_batch_rows == 0 {
            errors.push("storage batch bounds must be > 0".to_string());
        }

        let (range_errors, range_warnings) = super::validation::validate_physical_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_range(min: f64, max: f64, name: &str, errors: &mut Vec<String>) {
        if !min.is_finite() || !max.is_finite() {
            errors.push(format!(
                "{name}: values must be finite (got min={min}, max={max})"
            ));
            return;
        }
        if max < min {
            errors.push(format!("{name}: max ({max:.3}) must be >= min ({min:.3})"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({0:?}): {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({0:?}): {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Sections
// ============================================================================

/// Population cap applied before cleaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub top_vessels_per_region: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            top_vessels_per_region: defaults::TOP_VESSELS_PER_REGION,
        }
    }
}

/// Row-level speed filter (knots, inclusive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    pub min_speed_knots: f64,
    pub max_speed_knots: f64,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            min_speed_knots: defaults::MIN_SPEED_KNOTS,
            max_speed_knots: defaults::MAX_SPEED_KNOTS,
        }
    }
}

/// Feature construction constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Divisor for `sog_norm`
    pub speed_scale_knots: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            speed_scale_knots: defaults::SPEED_SCALE_KNOTS,
        }
    }
}

/// Sliding-window constraints and caps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub seq_len: usize,
    pub stride: usize,
    /// Minimum valid in-window speed (knots)
    pub stop_speed: f64,
    /// Maximum valid in-window speed (knots)
    pub max_sog: f64,
    pub max_time_gap_secs: f64,
    pub max_samples_per_group: usize,
    pub max_total_groups: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            seq_len: defaults::SEQ_LEN,
            stride: defaults::STRIDE,
            stop_speed: defaults::MIN_SPEED_KNOTS,
            max_sog: defaults::MAX_SPEED_KNOTS,
            max_time_gap_secs: defaults::MAX_TIME_GAP_SECS,
            max_samples_per_group: defaults::MAX_SAMPLES_PER_GROUP,
            max_total_groups: defaults::MAX_TOTAL_GROUPS,
        }
    }
}

/// Raw file discovery and upstream pre-filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub raw_dir: PathBuf,
    /// Regex with named groups `year` and `month`
    pub file_pattern: String,
    /// Reports must be strictly faster than this to be loaded (knots)
    pub min_raw_speed_knots: f64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from(defaults::RAW_DATA_DIR),
            file_pattern: defaults::RAW_FILE_PATTERN.to_string(),
            min_raw_speed_knots: defaults::RAW_MIN_SPEED_KNOTS,
        }
    }
}

/// Persistence sink layout and batching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub root: PathBuf,
    pub max_params_per_batch: usize,
    pub min_batch_rows: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(defaults::STORE_ROOT),
            max_params_per_batch: defaults::MAX_PARAMS_PER_BATCH,
            min_batch_rows: defaults::MIN_BATCH_ROWS,
        }
    }
}

impl StorageConfig {
    /// Rows per append batch for a table of `columns` columns.
    pub fn batch_rows(&self, columns: usize) -> usize {
        self.min_batch_rows
            .max(self.max_params_per_batch / columns.max(1))
    }
}
