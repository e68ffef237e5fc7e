//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the estimation and storage code stays free of presentation concerns
//! - output changes are localized
//!
//! Values are rounded here and only here; results keep full precision.

use crate::app::pipeline::CropPrediction;
use crate::domain::{Crop, EstimationResult, HarvestRecord, HarvestStats};

/// Format a single estimation as a labelled block with tips.
pub fn format_estimation(result: &EstimationResult) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "=== {} | month {} ({}) | {:.2} acres ===\n",
        result.crop_name,
        result.month,
        result.season.display_name(),
        result.area
    ));
    out.push_str(&format!(
        "Predicted yield : {:.2} kg ({:.2} kg/acre)\n",
        result.predicted_yield, result.predicted_yield_per_area
    ));
    out.push_str(&format!(
        "Baseline        : {:.2} kg/acre\n",
        result.baseline_yield_per_area
    ));
    out.push_str(&format!(
        "Category        : {}\n",
        result.yield_category.display_name()
    ));
    out.push_str(&format!(
        "Confidence      : {} ({} training point{}, {})\n",
        result.confidence.display_name(),
        result.training_points,
        if result.training_points == 1 { "" } else { "s" },
        if result.used_regression_model {
            "trend model blended with baseline"
        } else {
            "seasonal baseline only"
        }
    ));

    out.push_str("\nTips:\n");
    for tip in &result.tips {
        out.push_str(&format!("- {tip}\n"));
    }

    out
}

/// Batch prediction table.
pub fn format_predictions(rows: &[CropPrediction]) -> String {
    let mut out = header(
        &format!(
            "{:>5} {:<16} {:>8} {:>6} {:>12} {:>10} {:<7} {:<7} {:>3}",
            "id", "crop", "area", "month", "pred_kg", "kg/acre", "cat", "conf", "n"
        ),
        &[5, 16, 8, 6, 12, 10, 7, 7, 3],
    );

    for p in rows {
        let r = &p.result;
        push_line(
            &mut out,
            format!(
                "{:>5} {:<16} {:>8.2} {:>6} {:>12.2} {:>10.2} {:<7} {:<7} {:>3}",
                p.crop.id,
                truncate(&p.crop.name, 16),
                r.area,
                r.month,
                r.predicted_yield,
                r.predicted_yield_per_area,
                r.yield_category.display_name(),
                r.confidence.display_name(),
                r.training_points,
            ),
        );
    }

    out
}

pub fn format_crops(crops: &[Crop]) -> String {
    let mut out = header(
        &format!(
            "{:>5} {:<24} {:>10} {:<12}",
            "id", "name", "area", "planted"
        ),
        &[5, 24, 10, 12],
    );
    for c in crops {
        push_line(
            &mut out,
            format!(
                "{:>5} {:<24} {:>10.2} {:<12}",
                c.id,
                truncate(&c.name, 24),
                c.area,
                c.planting_date
            ),
        );
    }
    out
}

pub fn format_harvests(rows: &[HarvestRecord]) -> String {
    let mut out = header(
        &format!(
            "{:>5} {:>5} {:<20} {:<12} {:>12}",
            "id", "crop", "name", "date", "yield_kg"
        ),
        &[5, 5, 20, 12, 12],
    );
    for h in rows {
        push_line(
            &mut out,
            format!(
                "{:>5} {:>5} {:<20} {:<12} {:>12.2}",
                h.id,
                h.crop_id,
                truncate(&h.crop_name, 20),
                h.date,
                h.yield_amount
            ),
        );
    }
    out
}

pub fn format_stats(stats: &HarvestStats) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Harvests: {} | total yield: {:.2} kg | top crop: {}\n\n",
        stats.total_harvests,
        stats.total_yield,
        stats.top_crop.as_deref().unwrap_or("-")
    ));

    out.push_str(&header(
        &format!(
            "{:<20} {:>6} {:>12} {:>12}",
            "crop", "count", "sum_kg", "avg_kg"
        ),
        &[20, 6, 12, 12],
    ));
    for c in &stats.by_crop {
        push_line(
            &mut out,
            format!(
                "{:<20} {:>6} {:>12.2} {:>12.2}",
                truncate(&c.crop_name, 20),
                c.count,
                c.sum_yield,
                c.avg_yield
            ),
        );
    }
    out
}

fn header(title: &str, widths: &[usize]) -> String {
    let mut out = String::new();
    push_line(&mut out, title.to_string());
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_line(&mut out, rule.join(" "));
    out
}

fn push_line(out: &mut String, line: String) {
    out.push_str(line.trim_end());
    out.push('\n');
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
