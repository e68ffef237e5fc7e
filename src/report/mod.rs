//! Reporting utilities: harvest statistics and formatted terminal output.

use std::collections::HashMap;

use crate::domain::{CropYieldStats, HarvestRecord, HarvestStats};

pub mod format;

pub use format::*;

/// Aggregate harvests by crop name.
///
/// Per-crop rows are sorted by summed yield, largest first (ties by name), and
/// the top crop is the first row.
pub fn compute_harvest_stats(rows: &[HarvestRecord]) -> HarvestStats {
    let mut groups: HashMap<&str, (usize, f64)> = HashMap::new();
    for r in rows {
        let entry = groups.entry(r.crop_name.as_str()).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += r.yield_amount;
    }

    let mut by_crop: Vec<CropYieldStats> = groups
        .into_iter()
        .map(|(name, (count, sum))| CropYieldStats {
            crop_name: name.to_string(),
            count,
            sum_yield: sum,
            avg_yield: sum / count as f64,
        })
        .collect();
    by_crop.sort_by(|a, b| {
        b.sum_yield
            .partial_cmp(&a.sum_yield)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.crop_name.cmp(&b.crop_name))
    });

    HarvestStats {
        total_yield: rows.iter().map(|r| r.yield_amount).sum(),
        total_harvests: rows.len(),
        top_crop: by_crop.first().map(|c| c.crop_name.clone()),
        by_crop,
    }
}
