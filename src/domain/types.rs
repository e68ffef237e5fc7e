//! Shared domain types.
//!
//! These types are kept lightweight and serializable so they can be:
//!
//! - used in-memory during estimation
//! - stored in the JSON record file
//! - exported to JSON/CSV

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Owner of crop and harvest records.
pub type UserId = u64;

/// Expected yield-per-area (kg/acre) envelope for one crop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropProfile {
    pub baseline: f64,
    pub min: f64,
    pub max: f64,
}

impl CropProfile {
    /// Range training samples are clamped into before fitting:
    /// `[0.5 * min, 1.5 * max]`.
    pub fn sample_bounds(&self) -> (f64, f64) {
        (self.min * 0.5, self.max * 1.5)
    }

    /// Clamp a prediction into `[min, max]`.
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Coarse yield label relative to the crop baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum YieldCategory {
    Low,
    Medium,
    High,
}

impl YieldCategory {
    pub fn display_name(self) -> &'static str {
        match self {
            YieldCategory::Low => "Low",
            YieldCategory::Medium => "Medium",
            YieldCategory::High => "High",
        }
    }
}

/// How much the estimate leans on the owner's own history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn display_name(self) -> &'static str {
        match self {
            Confidence::Low => "Low",
            Confidence::Medium => "Medium",
            Confidence::High => "High",
        }
    }
}

/// Planting season, derived from the planting month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    #[serde(rename = "Long Rains")]
    LongRains,
    #[serde(rename = "Short Rains")]
    ShortRains,
    Dry,
    Other,
}

impl Season {
    /// Season for a month in `1..=12`. Out-of-range months map to `Other`.
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::LongRains,
            10..=12 => Season::ShortRains,
            6..=9 => Season::Dry,
            _ => Season::Other,
        }
    }

    /// Multiplier applied to the crop baseline.
    pub fn factor(self) -> f64 {
        match self {
            Season::LongRains => 1.06,
            Season::ShortRains => 1.03,
            Season::Dry => 0.95,
            Season::Other => 1.00,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Season::LongRains => "Long Rains",
            Season::ShortRains => "Short Rains",
            Season::Dry => "Dry",
            Season::Other => "Other",
        }
    }
}

/// One normalized training sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub month: u32,
    pub yield_per_area: f64,
}

/// A raw historical (planting month, area, harvested amount) row.
///
/// This is what the repository hands to the estimator; validation and
/// per-area normalization happen inside the estimator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub month: u32,
    pub area: f64,
    pub yield_amount: f64,
}

/// Ridge-fitted `yield_per_area ≈ intercept + slope * month`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedModel {
    pub intercept: f64,
    pub slope: f64,
}

/// Target of a single estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimateInput {
    pub crop_name: String,
    pub target_month: u32,
    pub target_area: f64,
}

/// Estimator output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    pub crop_name: String,
    pub month: u32,
    pub area: f64,
    pub season: Season,

    pub predicted_yield: f64,
    pub predicted_yield_per_area: f64,
    pub baseline_yield_per_area: f64,

    pub yield_category: YieldCategory,
    pub confidence: Confidence,
    pub tips: Vec<String>,

    pub training_points: usize,
    pub used_regression_model: bool,
}

/// A stored planting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Crop {
    pub id: u64,
    pub owner: UserId,
    pub name: String,
    /// Planted area in acres.
    pub area: f64,
    pub planting_date: NaiveDate,
}

impl Crop {
    pub fn planting_month(&self) -> u32 {
        self.planting_date.month()
    }
}

/// Fields for a new crop.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCrop {
    pub name: String,
    pub area: f64,
    pub planting_date: NaiveDate,
}

impl NewCrop {
    /// Trim the name and check all fields.
    pub fn validated(self) -> Result<Self, StoreError> {
        Ok(Self {
            name: validate_crop_name(&self.name)?,
            area: validate_area(self.area)?,
            planting_date: self.planting_date,
        })
    }
}

/// Partial crop update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CropPatch {
    pub name: Option<String>,
    pub area: Option<f64>,
    pub planting_date: Option<NaiveDate>,
}

impl CropPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.area.is_none() && self.planting_date.is_none()
    }
}

/// A stored harvest of one crop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Harvest {
    pub id: u64,
    pub crop_id: u64,
    pub date: NaiveDate,
    /// Harvested amount in kg.
    pub yield_amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewHarvest {
    pub date: NaiveDate,
    pub yield_amount: f64,
}

impl NewHarvest {
    pub fn validated(self) -> Result<Self, StoreError> {
        Ok(Self {
            date: self.date,
            yield_amount: validate_yield(self.yield_amount)?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarvestPatch {
    pub date: Option<NaiveDate>,
    pub yield_amount: Option<f64>,
}

impl HarvestPatch {
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.yield_amount.is_none()
    }
}

/// A harvest joined with its crop, as listed to users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestRecord {
    pub id: u64,
    pub crop_id: u64,
    pub crop_name: String,
    pub date: NaiveDate,
    pub yield_amount: f64,
}

/// Harvest listing filter. Date bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HarvestFilter {
    pub owner: UserId,
    pub crop_id: Option<u64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl HarvestFilter {
    pub fn for_owner(owner: UserId) -> Self {
        Self {
            owner,
            ..Self::default()
        }
    }

    pub fn matches_date(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

/// Per-crop-name harvest totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropYieldStats {
    pub crop_name: String,
    pub count: usize,
    pub sum_yield: f64,
    pub avg_yield: f64,
}

/// Aggregate harvest statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarvestStats {
    pub total_yield: f64,
    pub total_harvests: usize,
    /// Sorted by `sum_yield`, largest first.
    pub by_crop: Vec<CropYieldStats>,
    pub top_crop: Option<String>,
}

pub fn validate_crop_name(name: &str) -> Result<String, StoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(StoreError::invalid("name", "crop name must be a non-empty string"));
    }
    Ok(trimmed.to_string())
}

pub fn validate_area(area: f64) -> Result<f64, StoreError> {
    if !(area.is_finite() && area > 0.0) {
        return Err(StoreError::invalid("area", format!("must be a positive number (got {area})")));
    }
    Ok(area)
}

pub fn validate_yield(yield_amount: f64) -> Result<f64, StoreError> {
    if !(yield_amount.is_finite() && yield_amount > 0.0) {
        return Err(StoreError::invalid(
            "yield_amount",
            format!("must be a positive number (got {yield_amount})"),
        ));
    }
    Ok(yield_amount)
}
