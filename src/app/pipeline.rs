//! Shared prediction logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! crop lookup -> training history -> estimation
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use rayon::prelude::*;
use tracing::debug;

use crate::domain::{Crop, EstimateInput, EstimationResult, HistoricalRecord, UserId};
use crate::error::AppError;
use crate::fit::YieldEstimator;
use crate::store::FarmRepository;

/// One stored crop with its estimate and the history it was trained on.
#[derive(Debug, Clone)]
pub struct CropPrediction {
    pub crop: Crop,
    pub result: EstimationResult,
    pub history: Vec<HistoricalRecord>,
}

/// Estimation target for a stored crop: its name, planting month and area.
pub fn input_for_crop(crop: &Crop) -> EstimateInput {
    EstimateInput {
        crop_name: crop.name.clone(),
        target_month: crop.planting_month(),
        target_area: crop.area,
    }
}

/// Predict the yield of one crop from the owner's history of that crop name.
pub fn predict_crop<R: FarmRepository + ?Sized>(
    repo: &R,
    owner: UserId,
    crop_id: u64,
    estimator: &YieldEstimator,
) -> Result<CropPrediction, AppError> {
    let crop = repo.get_crop(owner, crop_id)?;
    let history = repo.training_records(owner, &crop.name)?;
    estimate_crop(crop, history, estimator)
}

/// Predict every crop of `owner`.
///
/// Repository reads happen first, on the calling thread; the estimates are then
/// computed in parallel. Output order matches `list_crops`.
pub fn predict_all<R: FarmRepository + ?Sized>(
    repo: &R,
    owner: UserId,
    estimator: &YieldEstimator,
) -> Result<Vec<CropPrediction>, AppError> {
    let crops = repo.list_crops(owner)?;
    if crops.is_empty() {
        return Err(AppError::new(3, format!("No crops found for user {owner}.")));
    }

    let mut jobs = Vec::with_capacity(crops.len());
    for crop in crops {
        let history = repo.training_records(owner, &crop.name)?;
        jobs.push((crop, history));
    }

    debug!(owner, crops = jobs.len(), "batch prediction");

    jobs.into_par_iter()
        .map(|(crop, history)| estimate_crop(crop, history, estimator))
        .collect()
}

fn estimate_crop(
    crop: Crop,
    history: Vec<HistoricalRecord>,
    estimator: &YieldEstimator,
) -> Result<CropPrediction, AppError> {
    let result = estimator.estimate(&input_for_crop(&crop), &history)?;
    Ok(CropPrediction {
        crop,
        result,
        history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewCrop, NewHarvest};
    use crate::store::InMemoryStore;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn seeded() -> (InMemoryStore, u64) {
        let mut store = InMemoryStore::new();
        let mut target = 0;
        for (month, area, amount) in [(3, 2.0, 1300.0), (4, 3.0, 2100.0), (11, 4.0, 2480.0)] {
            let crop = store
                .create_crop(
                    1,
                    NewCrop {
                        name: "Maize".into(),
                        area,
                        planting_date: date(2024, month, 1),
                    },
                )
                .unwrap();
            store
                .create_harvest(
                    1,
                    crop.id,
                    NewHarvest {
                        date: date(2025, 1, 15),
                        yield_amount: amount,
                    },
                )
                .unwrap();
            target = crop.id;
        }
        (store, target)
    }

    #[test]
    fn predict_crop_uses_same_name_history() {
        let (store, id) = seeded();
        let p = predict_crop(&store, 1, id, &YieldEstimator::default()).unwrap();
        assert_eq!(p.history.len(), 3);
        assert_eq!(p.result.training_points, 3);
        assert!(p.result.used_regression_model);
        assert_eq!(p.result.month, 11);
        assert_eq!(p.result.area, 4.0);
    }

    #[test]
    fn predict_crop_of_another_owner_is_not_found() {
        let (store, id) = seeded();
        let err = predict_crop(&store, 2, id, &YieldEstimator::default()).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn predict_all_keeps_listing_order() {
        let (store, _) = seeded();
        let all = predict_all(&store, 1, &YieldEstimator::default()).unwrap();
        let ids: Vec<u64> = all.iter().map(|p| p.crop.id).collect();
        let listed: Vec<u64> = store.list_crops(1).unwrap().iter().map(|c| c.id).collect();
        assert_eq!(ids, listed);

        assert_eq!(
            predict_all(&store, 9, &YieldEstimator::default())
                .unwrap_err()
                .exit_code(),
            3
        );
    }
}
