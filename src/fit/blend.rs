//! Blending the fitted trend with the seasonal baseline.
//!
//! More training points shift weight towards the model:
//!
//! ```text
//! w    = clamp(0.20 + 0.10 * n, 0.25, 0.85)
//! pred = w * model(month) + (1 - w) * baseline(month)
//! ```
//!
//! The result is always clamped into the profile's `[min, max]`.

use crate::domain::{CropProfile, FittedModel};
use crate::models::{predict, seasonal_baseline};

pub const BLEND_WEIGHT_MIN: f64 = 0.25;
pub const BLEND_WEIGHT_MAX: f64 = 0.85;

/// Fraction of the estimate attributed to the fitted model.
pub fn blend_weight(n_points: usize) -> f64 {
    (0.20 + 0.10 * n_points as f64).clamp(BLEND_WEIGHT_MIN, BLEND_WEIGHT_MAX)
}

/// Predicted yield-per-area for `month`, clamped into `[profile.min, profile.max]`.
pub fn blended_yield_per_area(
    month: u32,
    profile: &CropProfile,
    model: Option<&FittedModel>,
    n_points: usize,
) -> f64 {
    let baseline = seasonal_baseline(profile, month);

    let pred = match model {
        Some(model) => {
            let w = blend_weight(n_points);
            w * predict(model, month) + (1.0 - w) * baseline
        }
        None => baseline,
    };

    profile.clamp(pred)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weight_is_bounded() {
        assert_eq!(blend_weight(0), BLEND_WEIGHT_MIN);
        assert_eq!(blend_weight(3), 0.5);
        assert!((blend_weight(5) - 0.7).abs() < 1e-12);
        assert_eq!(blend_weight(7), BLEND_WEIGHT_MAX);
        assert_eq!(blend_weight(100), BLEND_WEIGHT_MAX);
    }

    #[test]
    fn without_model_returns_clamped_baseline() {
        let p = CropProfile {
            baseline: 650.0,
            min: 250.0,
            max: 1600.0,
        };
        assert!((blended_yield_per_area(4, &p, None, 0) - 689.0).abs() < 1e-9);

        let tight = CropProfile {
            baseline: 650.0,
            min: 250.0,
            max: 660.0,
        };
        assert_eq!(blended_yield_per_area(4, &tight, None, 0), 660.0);
    }

    #[test]
    fn model_and_baseline_are_mixed_by_weight() {
        let p = CropProfile {
            baseline: 1000.0,
            min: 0.0,
            max: 10_000.0,
        };
        // Flat model at 2000, month 1 (factor 1.0), n = 3 -> w = 0.5.
        let model = FittedModel {
            intercept: 2000.0,
            slope: 0.0,
        };
        let pred = blended_yield_per_area(1, &p, Some(&model), 3);
        assert!((pred - 1500.0).abs() < 1e-9);
    }
}
