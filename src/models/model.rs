//! Month-trend model evaluation.
//!
//! The fitter relies on two primitive operations:
//! - build a design row for a planting month (for the normal equations)
//! - predict yield-per-area for a month given fitted coefficients
//!
//! The seasonal baseline lives here too since both the blend and the chart
//! evaluate it per month.

use crate::domain::{CropProfile, FittedModel, Season};

/// Number of columns in a design row (`[1, month]`).
pub const DESIGN_LEN: usize = 2;

/// Design row for a planting month. The constant term comes first.
pub fn design_row(month: u32) -> [f64; DESIGN_LEN] {
    [1.0, f64::from(month)]
}

/// Predict yield-per-area at `month`.
pub fn predict(model: &FittedModel, month: u32) -> f64 {
    let row = design_row(month);
    model.intercept * row[0] + model.slope * row[1]
}

/// Profile baseline scaled by the season of `month` (unclamped).
pub fn seasonal_baseline(profile: &CropProfile, month: u32) -> f64 {
    profile.baseline * Season::from_month(month).factor()
}
