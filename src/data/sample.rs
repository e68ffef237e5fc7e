//! Synthetic planting and harvest history for demos.
//!
//! Every known crop is planted in each rainy season of each year. The harvest
//! per acre is the seasonal baseline times lognormal noise, with occasional
//! jumps standing in for data-entry mistakes (a total typed into the per-acre
//! field, a lost sack of records). The same seed always yields the same data.

use chrono::{Datelike, Duration, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{profile_for, NewCrop, NewHarvest, Season, UserId, KNOWN_CROPS};
use crate::error::AppError;
use crate::store::FarmRepository;

/// Harvest lag after planting, in days.
const GROWING_DAYS: std::ops::RangeInclusive<i64> = 90..=150;

#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    pub seed: u64,
    pub first_year: i32,
    pub years: u32,
    /// Log-scale noise of the per-acre yield.
    pub sigma: f64,
    pub jump_prob_high: f64,
    pub jump_prob_low: f64,
    pub jump_k_high: f64,
    pub jump_k_low: f64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            first_year: 2021,
            years: 4,
            sigma: 0.15,
            jump_prob_high: 0.05,
            jump_prob_low: 0.05,
            jump_k_high: 2.5,
            jump_k_low: 2.5,
        }
    }
}

/// One generated planting and its harvests.
#[derive(Debug, Clone, PartialEq)]
pub struct DemoPlanting {
    pub crop: NewCrop,
    pub harvests: Vec<NewHarvest>,
}

pub fn generate_demo_history(config: &DemoConfig) -> Result<Vec<DemoPlanting>, AppError> {
    if config.years == 0 {
        return Err(AppError::new(2, "Demo history needs at least one year."));
    }
    if !(config.sigma.is_finite() && config.sigma >= 0.0) {
        return Err(AppError::new(2, "Invalid noise level for demo history."));
    }
    if config.jump_prob_high < 0.0
        || config.jump_prob_low < 0.0
        || (config.jump_prob_high + config.jump_prob_low) >= 1.0
    {
        return Err(AppError::new(2, "Invalid jump probability settings."));
    }
    if !(config.jump_k_high.is_finite()
        && config.jump_k_low.is_finite()
        && config.jump_k_high > 0.0
        && config.jump_k_low > 0.0)
    {
        return Err(AppError::new(2, "Invalid jump magnitude settings."));
    }

    let end_year = i32::try_from(config.years)
        .ok()
        .and_then(|years| config.first_year.checked_add(years))
        .ok_or_else(|| {
            AppError::new(
                2,
                format!("{} year(s) from {} is out of range.", config.years, config.first_year),
            )
        })?;
    if NaiveDate::from_ymd_opt(config.first_year, 1, 1).is_none()
        || NaiveDate::from_ymd_opt(end_year - 1, 12, 31).is_none()
    {
        return Err(AppError::new(
            2,
            format!("Years {}..{end_year} are outside the supported calendar.", config.first_year),
        ));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;
    let correction = jump_mean_correction(config);

    let mut out = Vec::new();
    for year in config.first_year..end_year {
        for name in KNOWN_CROPS {
            let profile = profile_for(name);

            for months in [3..=5u32, 10..=11u32] {
                let month = rng.gen_range(months);
                let day = rng.gen_range(1..=28);
                let planting_date = NaiveDate::from_ymd_opt(year, month, day)
                    .ok_or_else(|| AppError::new(4, "Generated an invalid planting date."))?;

                // Quarter-acre plots between 0.5 and 5 acres.
                let area = rng.gen_range(2..=20) as f64 * 0.25;

                let z = normal.sample(&mut rng);
                let jump = sample_jump(&mut rng, config);
                let exponent = config.sigma * (z + jump) - correction;
                let per_acre =
                    profile.baseline * Season::from_month(planting_date.month()).factor() * exponent.exp();

                let harvest_date = planting_date + Duration::days(rng.gen_range(GROWING_DAYS));
                let yield_amount = ((per_acre * area) * 10.0).round() / 10.0;

                out.push(DemoPlanting {
                    crop: NewCrop {
                        name: name.to_string(),
                        area,
                        planting_date,
                    },
                    harvests: vec![NewHarvest {
                        date: harvest_date,
                        yield_amount: yield_amount.max(0.1),
                    }],
                });
            }
        }
    }

    Ok(out)
}

/// Write generated history into `repo`. Returns `(crops, harvests)` created.
pub fn seed_store<R: FarmRepository + ?Sized>(
    repo: &mut R,
    owner: UserId,
    history: Vec<DemoPlanting>,
) -> Result<(usize, usize), AppError> {
    let mut crops = 0;
    let mut harvests = 0;
    for planting in history {
        let crop = repo.create_crop(owner, planting.crop)?;
        crops += 1;
        for h in planting.harvests {
            repo.create_harvest(owner, crop.id, h)?;
            harvests += 1;
        }
    }
    Ok((crops, harvests))
}

// Mean correction so E[exp(log-noise)] == 1.0 (keeps the baseline unbiased).
fn jump_mean_correction(config: &DemoConfig) -> f64 {
    let s = config.sigma;
    let p_none = 1.0 - config.jump_prob_high - config.jump_prob_low;
    let m1 = p_none
        + config.jump_prob_high * (s * config.jump_k_high).exp()
        + config.jump_prob_low * (-s * config.jump_k_low).exp();
    0.5 * s * s + m1.ln()
}

fn sample_jump(rng: &mut StdRng, config: &DemoConfig) -> f64 {
    let roll: f64 = rng.r#gen();
    if roll < config.jump_prob_high {
        config.jump_k_high
    } else if roll < config.jump_prob_high + config.jump_prob_low {
        -config.jump_k_low
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    #[test]
    fn same_seed_same_history() {
        let a = generate_demo_history(&DemoConfig::default()).unwrap();
        let b = generate_demo_history(&DemoConfig::default()).unwrap();
        assert_eq!(a, b);

        let c = generate_demo_history(&DemoConfig {
            seed: 7,
            ..DemoConfig::default()
        })
        .unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn plantings_fall_in_rainy_seasons() {
        let config = DemoConfig::default();
        let history = generate_demo_history(&config).unwrap();
        assert_eq!(history.len(), KNOWN_CROPS.len() * 2 * config.years as usize);

        for p in &history {
            let season = Season::from_month(p.crop.planting_date.month());
            assert!(matches!(season, Season::LongRains | Season::ShortRains));
            assert!(p.crop.area >= 0.5 && p.crop.area <= 5.0);
            assert_eq!(p.harvests.len(), 1);
            assert!(p.harvests[0].date > p.crop.planting_date);
            assert!(p.harvests[0].yield_amount > 0.0);
        }
    }

    #[test]
    fn noise_is_centered_on_the_baseline() {
        let config = DemoConfig {
            years: 200,
            ..DemoConfig::default()
        };
        let history = generate_demo_history(&config).unwrap();
        let ratios: Vec<f64> = history
            .iter()
            .filter(|p| p.crop.name == "Beans")
            .map(|p| {
                let factor = Season::from_month(p.crop.planting_date.month()).factor();
                p.harvests[0].yield_amount / p.crop.area / (400.0 * factor)
            })
            .collect();
        let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
        assert!((mean - 1.0).abs() < 0.05, "mean ratio {mean}");
    }

    #[test]
    fn invalid_config_is_rejected() {
        let bad = DemoConfig {
            jump_prob_high: 0.6,
            jump_prob_low: 0.5,
            ..DemoConfig::default()
        };
        assert_eq!(generate_demo_history(&bad).unwrap_err().exit_code(), 2);
        let none = DemoConfig {
            years: 0,
            ..DemoConfig::default()
        };
        assert!(generate_demo_history(&none).is_err());
    }

    #[test]
    fn year_range_overflow_is_an_input_error() {
        let too_many = DemoConfig {
            years: u32::MAX,
            ..DemoConfig::default()
        };
        assert_eq!(generate_demo_history(&too_many).unwrap_err().exit_code(), 2);

        let too_late = DemoConfig {
            first_year: i32::MAX - 1,
            ..DemoConfig::default()
        };
        assert_eq!(generate_demo_history(&too_late).unwrap_err().exit_code(), 2);

        let off_calendar = DemoConfig {
            first_year: 1_000_000,
            years: 1,
            ..DemoConfig::default()
        };
        assert_eq!(generate_demo_history(&off_calendar).unwrap_err().exit_code(), 2);
    }

    #[test]
    fn seed_store_writes_everything() {
        let history = generate_demo_history(&DemoConfig::default()).unwrap();
        let n = history.len();
        let mut store = InMemoryStore::new();
        assert_eq!(seed_store(&mut store, 1, history).unwrap(), (n, n));
        assert_eq!(store.crop_count(), n);
        assert_eq!(store.harvest_count(), n);
    }
}
