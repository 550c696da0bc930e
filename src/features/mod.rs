//! Feature construction
//!
//! Fits a per-region [`SpatialReference`] (anchor point + position scaler)
//! once over the whole cleaned region, then derives the fixed per-step feature
//! vector ([`FEATURE_INPUT`](crate::types::FEATURE_INPUT)) for every report.
//!
//! Local frame: equirectangular projection around the anchor, in kilometres,
//! then standard-scaled per axis. Displacements (`dx`, `dy`) are differences
//! of scaled positions between consecutive reports of the same vessel.
//!
//! The reference is an explicit value: callers that need features for new
//! reports under an existing frame use [`derive_features`] with the reference
//! they already hold, never a refit.

mod scaler;

pub use scaler::{StandardScaler, WelfordAccumulator, AXES};

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

use crate::config::defaults::EARTH_RADIUS_KM;
use crate::config::FeatureConfig;
use crate::types::{feature_index as fi, FeatureRow, PositionReport, FEATURES_PER_STEP};

/// Kilometres per degree of latitude.
const KM_PER_DEG: f64 = PI * EARTH_RADIUS_KM / 180.0;

/// Per-region anchor and fitted scaler.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialReference {
    pub lat_ref: f64,
    pub lon_ref: f64,
    pub scaler: StandardScaler,
}

impl SpatialReference {
    /// Fit anchor (centroid) and scaler over every report. `None` if empty.
    pub fn fit(reports: &[PositionReport]) -> Option<Self> {
        let mut centroid = WelfordAccumulator::new();
        for r in reports {
            centroid.update([r.lat, r.lon]);
        }
        if centroid.count() == 0 {
            return None;
        }
        let [lat_ref, lon_ref] = centroid.mean();

        let mut frame = Self {
            lat_ref,
            lon_ref,
            scaler: StandardScaler {
                mean: [0.0; AXES],
                scale: [1.0; AXES],
                n_samples: 0,
            },
        };
        frame.scaler = StandardScaler::fit(reports.iter().map(|r| frame.project(r.lat, r.lon)))?;
        Some(frame)
    }

    /// Unscaled local coordinates in kilometres (east, north).
    pub fn project(&self, lat: f64, lon: f64) -> [f64; AXES] {
        [
            (lon - self.lon_ref) * self.lat_ref.to_radians().cos() * KM_PER_DEG,
            (lat - self.lat_ref) * KM_PER_DEG,
        ]
    }

    /// Inverse of [`Self::project`].
    pub fn unproject(&self, xy_km: [f64; AXES]) -> (f64, f64) {
        let lat = xy_km[1] / KM_PER_DEG + self.lat_ref;
        let lon = xy_km[0] / (self.lat_ref.to_radians().cos() * KM_PER_DEG) + self.lon_ref;
        (lat, lon)
    }

    /// Scaled local coordinates: the `x`, `y` features.
    pub fn to_local(&self, lat: f64, lon: f64) -> [f64; AXES] {
        self.scaler.transform(self.project(lat, lon))
    }

    /// Scaled local coordinates back to kilometres.
    pub fn unscale(&self, local: [f64; AXES]) -> [f64; AXES] {
        self.scaler.inverse_transform(local)
    }

    /// Scaled local coordinates back to (lat, lon).
    pub fn to_lat_lon(&self, local: [f64; AXES]) -> (f64, f64) {
        self.unproject(self.unscale(local))
    }

    /// Scaled displacement back to kilometres (east, north).
    pub fn delta_to_km(&self, delta: [f64; AXES]) -> [f64; AXES] {
        [delta[0] * self.scaler.scale[0], delta[1] * self.scaler.scale[1]]
    }
}

/// Fit the region reference and derive one [`FeatureRow`] per report.
///
/// `reports` must be sorted by (vessel, time). Empty input yields empty rows
/// and no reference.
pub fn build_features(
    reports: &[PositionReport],
    config: &FeatureConfig,
) -> (Vec<FeatureRow>, Option<SpatialReference>) {
    let Some(reference) = SpatialReference::fit(reports) else {
        return (Vec::new(), None);
    };
    debug!(
        lat_ref = reference.lat_ref,
        lon_ref = reference.lon_ref,
        scale_x = reference.scaler.scale[0],
        scale_y = reference.scaler.scale[1],
        rows = reports.len(),
        "Fitted spatial reference"
    );
    (derive_features(reports, &reference, config), Some(reference))
}

/// Derive features under an already fitted reference.
pub fn derive_features(
    reports: &[PositionReport],
    reference: &SpatialReference,
    config: &FeatureConfig,
) -> Vec<FeatureRow> {
    let mut rows = Vec::with_capacity(reports.len());
    let mut prev: Option<(&PositionReport, [f64; AXES])> = None;

    for report in reports {
        let pos = reference.to_local(report.lat, report.lon);
        let (delta, delta_t) = match prev {
            Some((p, p_pos)) if p.mmsi == report.mmsi => (
                [pos[0] - p_pos[0], pos[1] - p_pos[1]],
                (report.timestamp - p.timestamp).num_milliseconds() as f64 / 1000.0,
            ),
            _ => ([0.0; AXES], 0.0),
        };

        let (cog_sin, cog_cos) = report.cog.to_radians().sin_cos();
        let (hdg_sin, hdg_cos) = report.heading.to_radians().sin_cos();

        let mut features = [0.0; FEATURES_PER_STEP];
        features[fi::X] = pos[0];
        features[fi::Y] = pos[1];
        features[fi::DX] = delta[0];
        features[fi::DY] = delta[1];
        features[fi::SOG_NORM] = report.sog / config.speed_scale_knots;
        features[fi::COG_SIN] = cog_sin;
        features[fi::COG_COS] = cog_cos;
        features[fi::HEADING_SIN] = hdg_sin;
        features[fi::HEADING_COS] = hdg_cos;

        rows.push(FeatureRow {
            mmsi: report.mmsi,
            timestamp: report.timestamp,
            sog: report.sog,
            delta_t,
            features,
        });
        prev = Some((report, pos));
    }

    rows
}
