//! Config validation: unknown-key detection with Levenshtein suggestions
//! and geographic/kinematic range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for PipelineConfig.
///
/// Must be kept in step with the structs in pipeline_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [[regions]]
        "regions",
        "regions.name",
        "regions.lat_min",
        "regions.lat_max",
        "regions.lon_min",
        "regions.lon_max",
        // [selection]
        "selection",
        "selection.top_vessels_per_region",
        // [cleaning]
        "cleaning",
        "cleaning.min_speed_knots",
        "cleaning.max_speed_knots",
        // [features]
        "features",
        "features.speed_scale_knots",
        // [window]
        "window",
        "window.seq_len",
        "window.stride",
        "window.stop_speed",
        "window.max_sog",
        "window.max_time_gap_secs",
        "window.max_samples_per_group",
        "window.max_total_groups",
        // [ingest]
        "ingest",
        "ingest.raw_dir",
        "ingest.file_pattern",
        "ingest.min_raw_speed_knots",
        // [storage]
        "storage",
        "storage.root",
        "storage.max_params_per_batch",
        "storage.min_batch_rows",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// Arrays of tables contribute their element keys under the array's path,
/// so `[[regions]] name = "bay"` yields `["regions", "regions.name"]`.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            } else if let Some(items) = v.as_array() {
                for item in items.iter().filter(|i| i.is_table()) {
                    for key in walk_toml_keys(item, &path) {
                        if !keys.contains(&key) {
                            keys.push(key);
                        }
                    }
                }
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let b_len = b_chars.len();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (k, levenshtein(unknown, k)))
        .filter(|(_, dist)| *dist <= 3)
        // tie-break on the key itself so suggestions are stable across runs
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys; it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Physical Range Validation
// ============================================================================

/// Validate geographic and kinematic ranges on a parsed PipelineConfig.
///
/// Returns (errors, warnings): errors are impossible values that must
/// prevent a run; warnings are suspicious but not fatal.
pub fn validate_physical_ranges(
    config: &super::PipelineConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for region in &config.regions {
        if region.lat_min < -90.0 || region.lat_max > 90.0 {
            errors.push(format!(
                "region '{}' latitude [{:.3}, {:.3}] is outside [-90, 90]",
                region.name, region.lat_min, region.lat_max
            ));
        }
        if region.lon_min < -180.0 || region.lon_max > 180.0 {
            errors.push(format!(
                "region '{}' longitude [{:.3}, {:.3}] is outside [-180, 180]",
                region.name, region.lon_min, region.lon_max
            ));
        }
    }

    let w = &config.window;
    if w.stop_speed < 0.0 {
        errors.push(format!("window.stop_speed = {:.1} cannot be negative", w.stop_speed));
    }
    if config.cleaning.min_speed_knots < 0.0 {
        errors.push(format!(
            "cleaning.min_speed_knots = {:.1} cannot be negative",
            config.cleaning.min_speed_knots
        ));
    }

    // Merchant traffic tops out around 30 kn; fast ferries around 45 kn
    if w.max_sog > 60.0 {
        warnings.push(ValidationWarning {
            field: "window.max_sog".to_string(),
            message: format!("window.max_sog = {:.1} kn is above any vessel speed", w.max_sog),
            suggestion: None,
        });
    }

    // Cleaning already drops rows outside its range; a wider window range
    // never rejects anything
    if w.stop_speed < config.cleaning.min_speed_knots
        || w.max_sog > config.cleaning.max_speed_knots
    {
        warnings.push(ValidationWarning {
            field: "window".to_string(),
            message: format!(
                "window speed range [{:.1}, {:.1}] is wider than cleaning range [{:.1}, {:.1}]",
                w.stop_speed,
                w.max_sog,
                config.cleaning.min_speed_knots,
                config.cleaning.max_speed_knots
            ),
            suggestion: None,
        });
    }

    if config.ingest.min_raw_speed_knots > config.cleaning.min_speed_knots {
        warnings.push(ValidationWarning {
            field: "ingest.min_raw_speed_knots".to_string(),
            message: format!(
                "ingest.min_raw_speed_knots = {:.1} discards rows the cleaner would keep (min {:.1})",
                config.ingest.min_raw_speed_knots, config.cleaning.min_speed_knots
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("hello", "hello"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("seq_lem", "seq_len"), 1);
        assert_eq!(levenshtein("strde", "stride"), 1);
    }

    #[test]
    fn test_levenshtein_transposition_is_two_edits() {
        assert_eq!(levenshtein("seq_lne", "seq_len"), 2);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [window]
            seq_len = 10
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"window".to_string()));
        assert!(keys.contains(&"window.seq_len".to_string()));
    }

    #[test]
    fn test_walk_toml_keys_array_of_tables() {
        let toml: toml::Value = r#"
            [[regions]]
            name = "a"
            [[regions]]
            name = "b"
            lat_min = 1.0
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert_eq!(
            keys,
            vec![
                "regions".to_string(),
                "regions.name".to_string(),
                "regions.lat_min".to_string()
            ]
        );
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let toml_str = r#"
[window]
max_time_gap_sec = 300.0
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "window.max_time_gap_sec");
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("window.max_time_gap_secs")
        );
    }

    #[test]
    fn test_all_valid_keys_produce_zero_warnings() {
        let toml_str = r#"
[[regions]]
name = "bay"
lat_min = 37.5
lat_max = 38.2
lon_min = -123.0
lon_max = -121.8

[selection]
top_vessels_per_region = 100

[storage]
root = "/tmp/store"
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert!(warnings.is_empty(), "Expected 0 warnings, got: {warnings:?}");
    }

    #[test]
    fn test_unknown_section_produces_warning() {
        let warnings = validate_unknown_keys("[metrics]\nport = 9000\n");
        assert!(warnings.iter().any(|w| w.field == "metrics"));
    }

    #[test]
    fn test_default_config_has_no_range_findings() {
        let (errors, warnings) = validate_physical_ranges(&PipelineConfig::default());
        assert!(errors.is_empty(), "{errors:?}");
        assert!(warnings.is_empty(), "{warnings:?}");
    }

    #[test]
    fn test_latitude_out_of_range_is_error() {
        let mut config = PipelineConfig::default();
        config.regions[0].lat_max = 95.0;
        let (errors, _) = validate_physical_ranges(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("offshore"));
    }

    #[test]
    fn test_wide_window_speed_range_warns() {
        let mut config = PipelineConfig::default();
        config.window.stop_speed = 2.0;
        let (errors, warnings) = validate_physical_ranges(&config);
        assert!(errors.is_empty());
        assert!(warnings.iter().any(|w| w.field == "window"));
    }
}
