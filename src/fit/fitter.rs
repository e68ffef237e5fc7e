//! Training-set preparation and the month-trend fit.
//!
//! Given raw `(month, area, yield)` history for one crop and owner we:
//! - drop rows that cannot be normalized (bad month, area, or yield)
//! - convert to yield-per-area and clamp into the profile's sample bounds
//! - solve a ridge-regularized 2×2 normal-equations system over `[1, month]`
//!
//! Fewer than `MIN_TRAINING_POINTS` samples, or a singular system, produce no
//! model; the caller then relies on the seasonal baseline alone.

use crate::domain::{CropProfile, FittedModel, HistoricalRecord, Observation};
use crate::math::NormalEquations2;
use crate::models::design_row;

/// Ridge penalty added to both diagonal entries of `XᵀX`.
pub const RIDGE_LAMBDA: f64 = 0.5;

/// Minimum number of valid samples before a model is fitted.
pub const MIN_TRAINING_POINTS: usize = 3;

/// Normalize raw history into clamped yield-per-area samples.
///
/// Rows with a month outside `1..=12`, or a non-positive/non-finite area or
/// yield, are dropped silently.
pub fn prepare_observations(records: &[HistoricalRecord], profile: &CropProfile) -> Vec<Observation> {
    let (lo, hi) = profile.sample_bounds();

    records
        .iter()
        .filter(|r| (1..=12).contains(&r.month))
        .filter(|r| r.area.is_finite() && r.area > 0.0)
        .filter(|r| r.yield_amount.is_finite() && r.yield_amount > 0.0)
        .filter_map(|r| {
            let per_area = r.yield_amount / r.area;
            per_area.is_finite().then(|| Observation {
                month: r.month,
                yield_per_area: per_area.clamp(lo, hi),
            })
        })
        .collect()
}

/// Fit `yield_per_area ≈ intercept + slope * month`.
pub fn fit_month_model(samples: &[Observation], lambda: f64) -> Option<FittedModel> {
    if samples.len() < MIN_TRAINING_POINTS {
        return None;
    }

    let mut ne = NormalEquations2::new();
    for s in samples {
        ne.push(design_row(s.month), s.yield_per_area);
    }

    let beta = ne.solve_ridge(lambda)?;
    Some(FittedModel {
        intercept: beta[0],
        slope: beta[1],
    })
}
