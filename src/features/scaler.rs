//! Two-axis standard scaler fitted with Welford's algorithm.
//!
//! Each axis of the projected position is independently tracked with a
//! running mean and variance, giving zero-mean unit-variance coordinates
//! without holding a second copy of the region's points.

use serde::{Deserialize, Serialize};

use crate::config::defaults::MIN_SCALE;

/// Number of scaled axes (local x, local y).
pub const AXES: usize = 2;

/// Running mean/variance accumulator.
#[derive(Debug, Clone, Default)]
pub struct WelfordAccumulator {
    count: u64,
    mean: [f64; AXES],
    m2: [f64; AXES],
}

impl WelfordAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one point into the running statistics.
    pub fn update(&mut self, point: [f64; AXES]) {
        self.count += 1;
        let n = self.count as f64;
        for (i, &x) in point.iter().enumerate() {
            let delta = x - self.mean[i];
            self.mean[i] += delta / n;
            let delta2 = x - self.mean[i];
            self.m2[i] += delta * delta2;
        }
    }

    /// Number of points seen so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> [f64; AXES] {
        self.mean
    }

    /// Freeze into a scaler. `None` when no point was seen.
    ///
    /// Uses the population standard deviation; an axis with (near) zero
    /// spread gets scale 1.0 so it is centred but not blown up.
    pub fn finish(&self) -> Option<StandardScaler> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        let mut scale = [1.0; AXES];
        for (i, s) in scale.iter_mut().enumerate() {
            let std = (self.m2[i] / n).sqrt();
            if std >= MIN_SCALE {
                *s = std;
            }
        }
        Some(StandardScaler {
            mean: self.mean,
            scale,
            n_samples: self.count,
        })
    }
}

/// Fitted scaler parameters, kept with the dataset for inverse transforms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: [f64; AXES],
    pub scale: [f64; AXES],
    pub n_samples: u64,
}

impl StandardScaler {
    /// Fit over every point of an iterator.
    pub fn fit(points: impl IntoIterator<Item = [f64; AXES]>) -> Option<Self> {
        let mut acc = WelfordAccumulator::new();
        for p in points {
            acc.update(p);
        }
        acc.finish()
    }

    pub fn transform(&self, point: [f64; AXES]) -> [f64; AXES] {
        [
            (point[0] - self.mean[0]) / self.scale[0],
            (point[1] - self.mean[1]) / self.scale[1],
        ]
    }

    pub fn inverse_transform(&self, point: [f64; AXES]) -> [f64; AXES] {
        [
            point[0] * self.scale[0] + self.mean[0],
            point[1] * self.scale[1] + self.mean[1],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welford_constant_axis_gets_unit_scale() {
        let scaler = StandardScaler::fit((0..100).map(|i| [5.0, f64::from(i)])).unwrap();
        assert_eq!(scaler.scale[0], 1.0);
        assert!((scaler.mean[0] - 5.0).abs() < 1e-12);
        assert_eq!(scaler.transform([5.0, scaler.mean[1]]), [0.0, 0.0]);
    }

    #[test]
    fn test_welford_matches_population_std() {
        let pts = [[2.0, 1.0], [4.0, 1.0], [4.0, 3.0], [4.0, 3.0], [5.0, 5.0], [5.0, 5.0], [7.0, 7.0], [9.0, 7.0]];
        let scaler = StandardScaler::fit(pts).unwrap();
        assert!((scaler.mean[0] - 5.0).abs() < 1e-12);
        assert!((scaler.scale[0] - 2.0).abs() < 1e-12);
        assert_eq!(scaler.n_samples, 8);
    }

    #[test]
    fn test_inverse_round_trip() {
        let scaler = StandardScaler::fit([[0.0, 10.0], [4.0, 30.0]]).unwrap();
        let p = [1.5, -2.0];
        let back = scaler.inverse_transform(scaler.transform(p));
        assert!((back[0] - p[0]).abs() < 1e-12);
        assert!((back[1] - p[1]).abs() < 1e-12);
    }

    #[test]
    fn test_empty_fit_is_none() {
        assert!(StandardScaler::fit(std::iter::empty()).is_none());
    }
}
