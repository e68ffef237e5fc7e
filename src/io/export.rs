//! Export predictions to CSV or JSON.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::app::pipeline::CropPrediction;
use crate::domain::EstimationResult;
use crate::error::AppError;

/// Flat CSV row for one crop prediction.
#[derive(Debug, Serialize)]
struct PredictionRow<'a> {
    crop_id: u64,
    crop_name: &'a str,
    planting_date: String,
    area: f64,
    month: u32,
    season: &'static str,
    predicted_yield: String,
    predicted_yield_per_area: String,
    baseline_yield_per_area: String,
    yield_category: &'static str,
    confidence: &'static str,
    training_points: usize,
    used_regression_model: bool,
}

impl<'a> From<&'a CropPrediction> for PredictionRow<'a> {
    fn from(p: &'a CropPrediction) -> Self {
        let r = &p.result;
        Self {
            crop_id: p.crop.id,
            crop_name: &p.crop.name,
            planting_date: p.crop.planting_date.to_string(),
            area: r.area,
            month: r.month,
            season: r.season.display_name(),
            predicted_yield: format!("{:.4}", r.predicted_yield),
            predicted_yield_per_area: format!("{:.4}", r.predicted_yield_per_area),
            baseline_yield_per_area: format!("{:.4}", r.baseline_yield_per_area),
            yield_category: r.yield_category.display_name(),
            confidence: r.confidence.display_name(),
            training_points: r.training_points,
            used_regression_model: r.used_regression_model,
        }
    }
}

/// JSON record: the stored crop id next to the full estimator output.
#[derive(Debug, Serialize)]
struct PredictionJson<'a> {
    crop_id: u64,
    planting_date: String,
    #[serde(flatten)]
    result: &'a EstimationResult,
}

/// Write predictions to `path`. A `.json` extension selects JSON; anything
/// else is written as CSV.
pub fn export_predictions(path: &Path, rows: &[CropPrediction]) -> Result<(), AppError> {
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));

    if is_json {
        write_predictions_json(path, rows)
    } else {
        write_predictions_csv(path, rows)
    }
}

pub fn write_predictions_csv(path: &Path, rows: &[CropPrediction]) -> Result<(), AppError> {
    let file = create(path)?;
    let mut writer = csv::Writer::from_writer(file);

    for p in rows {
        writer
            .serialize(PredictionRow::from(p))
            .map_err(|e| AppError::new(4, format!("Failed to write export CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(4, format!("Failed to flush export CSV: {e}")))?;

    Ok(())
}

pub fn write_predictions_json(path: &Path, rows: &[CropPrediction]) -> Result<(), AppError> {
    let records: Vec<PredictionJson<'_>> = rows
        .iter()
        .map(|p| PredictionJson {
            crop_id: p.crop.id,
            planting_date: p.crop.planting_date.to_string(),
            result: &p.result,
        })
        .collect();

    let mut writer = BufWriter::new(create(path)?);
    serde_json::to_writer_pretty(&mut writer, &records)
        .map_err(|e| AppError::new(4, format!("Failed to write export JSON: {e}")))?;
    writer
        .write_all(b"\n")
        .and_then(|_| writer.flush())
        .map_err(|e| AppError::new(4, format!("Failed to write export JSON: {e}")))?;

    Ok(())
}

fn create(path: &Path) -> Result<File, AppError> {
    File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export file '{}': {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Confidence, Crop, Season, YieldCategory};
    use chrono::NaiveDate;

    fn prediction() -> CropPrediction {
        CropPrediction {
            crop: Crop {
                id: 3,
                owner: 1,
                name: "Maize".into(),
                area: 2.5,
                planting_date: NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            },
            result: EstimationResult {
                crop_name: "Maize".into(),
                month: 4,
                area: 2.5,
                season: Season::LongRains,
                predicted_yield: 1722.5,
                predicted_yield_per_area: 689.0,
                baseline_yield_per_area: 650.0,
                yield_category: YieldCategory::Medium,
                confidence: Confidence::Low,
                tips: vec!["a".into(), "b".into(), "c".into()],
                training_points: 0,
                used_regression_model: false,
            },
            history: Vec::new(),
        }
    }

    #[test]
    fn csv_export_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pred.csv");
        export_predictions(&path, &[prediction()]).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("crop_id,crop_name,planting_date,area,month,season"));
        assert!(lines[1].starts_with("3,Maize,2025-04-01,2.5,4,Long Rains,1722.5000"));
    }

    #[test]
    fn json_export_flattens_the_result() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pred.JSON");
        export_predictions(&path, &[prediction()]).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["crop_id"], 3);
        assert_eq!(value[0]["yield_category"], "Medium");
        assert_eq!(value[0]["season"], "Long Rains");
        assert_eq!(value[0]["tips"].as_array().unwrap().len(), 3);
    }
}
