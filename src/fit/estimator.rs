//! The yield estimator.
//!
//! `YieldEstimator::estimate` is a pure function of its inputs plus the static
//! profile and tip tables:
//!
//! 1. resolve the crop profile (unknown names use the default profile)
//! 2. normalize history into clamped yield-per-area samples
//! 3. fit the month trend when there are enough samples
//! 4. blend with the seasonal baseline and clamp into `[min, max]`
//! 5. derive total yield, category, confidence, and tips
//!
//! Only invalid target inputs are errors; every degenerate fit degrades to the
//! baseline. The estimator holds no mutable state and is safe to share across
//! threads.

use crate::domain::{
    profile_for, tips_for, Confidence, EstimateInput, EstimationResult, HistoricalRecord, Season,
    YieldCategory,
};
use crate::error::EstimateError;
use crate::fit::blend::blended_yield_per_area;
use crate::fit::fitter::{fit_month_model, prepare_observations, RIDGE_LAMBDA};

/// Ratio thresholds (prediction / baseline) for the category label.
pub const LOW_RATIO: f64 = 0.70;
pub const HIGH_RATIO: f64 = 1.10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YieldEstimator {
    ridge_lambda: f64,
}

impl Default for YieldEstimator {
    fn default() -> Self {
        Self {
            ridge_lambda: RIDGE_LAMBDA,
        }
    }
}

impl YieldEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ridge_lambda(&self) -> f64 {
        self.ridge_lambda
    }

    /// Estimate yield for `input` from the owner's history of the same crop.
    pub fn estimate(
        &self,
        input: &EstimateInput,
        history: &[HistoricalRecord],
    ) -> Result<EstimationResult, EstimateError> {
        validate_target(input.target_month, input.target_area)?;

        let profile = profile_for(&input.crop_name);
        let samples = prepare_observations(history, &profile);
        let n_points = samples.len();
        let model = fit_month_model(&samples, self.ridge_lambda);

        tracing::debug!(
            crop = %input.crop_name,
            history = history.len(),
            samples = n_points,
            fitted = model.is_some(),
            "yield model fit"
        );

        let per_area =
            blended_yield_per_area(input.target_month, &profile, model.as_ref(), n_points);
        let category = categorize(per_area, profile.baseline);
        let used_model = model.is_some();

        Ok(EstimationResult {
            crop_name: input.crop_name.clone(),
            month: input.target_month,
            area: input.target_area,
            season: Season::from_month(input.target_month),
            predicted_yield: per_area * input.target_area,
            predicted_yield_per_area: per_area,
            baseline_yield_per_area: profile.baseline,
            yield_category: category,
            confidence: confidence_for(n_points, used_model),
            tips: tips_for(category).iter().map(|t| t.to_string()).collect(),
            training_points: n_points,
            used_regression_model: used_model,
        })
    }
}

/// Estimate with the default estimator.
pub fn estimate(
    input: &EstimateInput,
    history: &[HistoricalRecord],
) -> Result<EstimationResult, EstimateError> {
    YieldEstimator::default().estimate(input, history)
}

/// Reject target inputs the estimator does not compute on.
pub fn validate_target(month: u32, area: f64) -> Result<(), EstimateError> {
    if !(1..=12).contains(&month) {
        return Err(EstimateError::InvalidMonth(month));
    }
    if !(area.is_finite() && area > 0.0) {
        return Err(EstimateError::InvalidArea(area));
    }
    Ok(())
}

/// Category of a yield-per-area prediction relative to the crop baseline.
pub fn categorize(per_area: f64, baseline: f64) -> YieldCategory {
    if baseline <= 0.0 {
        return YieldCategory::Medium;
    }
    let ratio = per_area / baseline;
    if ratio < LOW_RATIO {
        YieldCategory::Low
    } else if ratio < HIGH_RATIO {
        YieldCategory::Medium
    } else {
        YieldCategory::High
    }
}

pub fn confidence_for(n_points: usize, used_model: bool) -> Confidence {
    if !used_model {
        return Confidence::Low;
    }
    match n_points {
        n if n >= 10 => Confidence::High,
        n if n >= 5 => Confidence::Medium,
        _ => Confidence::Low,
    }
}
