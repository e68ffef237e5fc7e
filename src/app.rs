//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and parses CLI arguments
//! - opens the record store
//! - dispatches to record management, estimation and reporting
//! - prints tables/JSON and writes optional exports

use clap::Parser;
use serde::Serialize;

use crate::cli::{
    Command, CropAction, EstimateArgs, HarvestAction, ImportArgs, PredictArgs, SeedArgs, StatsArgs,
};
use crate::config::AppConfig;
use crate::domain::{CropPatch, EstimateInput, HarvestFilter, HarvestPatch, NewCrop, NewHarvest};
use crate::error::AppError;
use crate::fit::YieldEstimator;
use crate::store::{FarmRepository, JsonFileStore};

pub mod pipeline;

/// Row errors printed after an import; the rest are summarized.
const MAX_ROW_ERRORS_SHOWN: usize = 10;

/// Entry point for the `farm` binary.
pub fn run() -> Result<(), AppError> {
    crate::config::load_dotenv();

    // We want a bare `farm` (or `farm --store x.json`) to open the dashboard.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    let config = AppConfig::from_cli(&cli)?;

    // The dashboard owns the terminal; a stderr logger would draw over it.
    if !matches!(cli.command, Command::Tui) {
        crate::logging::init(config.verbosity)?;
    }

    match cli.command {
        Command::Crop { action } => handle_crop(&config, action),
        Command::Harvest { action } => handle_harvest(&config, action),
        Command::Predict(args) => handle_predict(&config, args),
        Command::Estimate(args) => handle_estimate(args),
        Command::Stats(args) => handle_stats(&config, args),
        Command::Import(args) => handle_import(&config, args),
        Command::Seed(args) => handle_seed(&config, args),
        Command::Tui => crate::tui::run(&config),
    }
}

fn handle_crop(config: &AppConfig, action: CropAction) -> Result<(), AppError> {
    let mut store = config.open_store()?;
    let owner = config.user;

    match action {
        CropAction::Add {
            name,
            area,
            planted,
        } => {
            let crop = store.create_crop(
                owner,
                NewCrop {
                    name,
                    area,
                    planting_date: planted,
                },
            )?;
            store.flush()?;
            println!("Created crop {}.", crop.id);
            print!("{}", crate::report::format_crops(&[crop]));
        }
        CropAction::List { json } => {
            let crops = store.list_crops(owner)?;
            if json {
                print_json(&crops)?;
            } else if crops.is_empty() {
                println!("No crops yet. Add one with `farm crop add`.");
            } else {
                print!("{}", crate::report::format_crops(&crops));
            }
        }
        CropAction::Update {
            id,
            name,
            area,
            planted,
        } => {
            let crop = store.update_crop(
                owner,
                id,
                CropPatch {
                    name,
                    area,
                    planting_date: planted,
                },
            )?;
            store.flush()?;
            print!("{}", crate::report::format_crops(&[crop]));
        }
        CropAction::Delete { id } => {
            let removed = store.delete_crop(owner, id)?;
            store.flush()?;
            println!("Deleted crop {id} and {removed} harvest(s).");
        }
    }

    Ok(())
}

fn handle_harvest(config: &AppConfig, action: HarvestAction) -> Result<(), AppError> {
    let mut store = config.open_store()?;
    let owner = config.user;

    match action {
        HarvestAction::Add {
            crop,
            date,
            yield_amount,
        } => {
            let harvest = store.create_harvest(owner, crop, NewHarvest { date, yield_amount })?;
            store.flush()?;
            println!(
                "Recorded harvest {} for crop {}: {:.2} kg on {}.",
                harvest.id, harvest.crop_id, harvest.yield_amount, harvest.date
            );
        }
        HarvestAction::List {
            crop,
            from,
            to,
            json,
        } => {
            let filter = HarvestFilter {
                owner,
                crop_id: crop,
                from,
                to,
            };
            let rows = store.list_harvests(&filter)?;
            if json {
                print_json(&rows)?;
            } else if rows.is_empty() {
                println!("No harvests match.");
            } else {
                print!("{}", crate::report::format_harvests(&rows));
            }
        }
        HarvestAction::Update {
            id,
            date,
            yield_amount,
        } => {
            let harvest = store.update_harvest(owner, id, HarvestPatch { date, yield_amount })?;
            store.flush()?;
            println!(
                "Updated harvest {}: {:.2} kg on {}.",
                harvest.id, harvest.yield_amount, harvest.date
            );
        }
        HarvestAction::Delete { id } => {
            store.delete_harvest(owner, id)?;
            store.flush()?;
            println!("Deleted harvest {id}.");
        }
    }

    Ok(())
}

fn handle_predict(config: &AppConfig, args: PredictArgs) -> Result<(), AppError> {
    let store = config.open_store()?;
    let estimator = YieldEstimator::default();

    let predictions = match args.crop {
        Some(id) if !args.all => vec![pipeline::predict_crop(&store, config.user, id, &estimator)?],
        _ => pipeline::predict_all(&store, config.user, &estimator)?,
    };

    if args.json {
        let results: Vec<_> = predictions.iter().map(|p| &p.result).collect();
        if args.all {
            print_json(&results)?;
        } else {
            print_json(&results[0])?;
        }
    } else if args.all {
        print!("{}", crate::report::format_predictions(&predictions));
    } else {
        for p in &predictions {
            print!("{}", crate::report::format_estimation(&p.result));
        }
    }

    if let Some(path) = &args.export {
        crate::io::export::export_predictions(path, &predictions)?;
        eprintln!("Wrote {} prediction(s) to {}.", predictions.len(), path.display());
    }

    Ok(())
}

fn handle_estimate(args: EstimateArgs) -> Result<(), AppError> {
    let history = match &args.history {
        Some(path) => {
            let (records, errors) = crate::io::ingest::load_history_csv(path)?;
            if !errors.is_empty() {
                eprintln!("Skipped {} unreadable history row(s).", errors.len());
            }
            records
        }
        None => Vec::new(),
    };

    let input = EstimateInput {
        crop_name: args.crop_name,
        target_month: args.month,
        target_area: args.area,
    };
    let result = YieldEstimator::default().estimate(&input, &history)?;

    if args.json {
        print_json(&result)
    } else {
        print!("{}", crate::report::format_estimation(&result));
        Ok(())
    }
}

fn handle_stats(config: &AppConfig, args: StatsArgs) -> Result<(), AppError> {
    let store = config.open_store()?;
    let filter = HarvestFilter {
        owner: config.user,
        crop_id: None,
        from: args.from,
        to: args.to,
    };
    let rows = store.list_harvests(&filter)?;
    let stats = crate::report::compute_harvest_stats(&rows);

    if args.json {
        print_json(&stats)
    } else {
        print!("{}", crate::report::format_stats(&stats));
        Ok(())
    }
}

fn handle_import(config: &AppConfig, args: ImportArgs) -> Result<(), AppError> {
    let path = match &args.file {
        Some(p) => crate::cli::picker::validate_csv_path(p)?,
        None => crate::cli::picker::prompt_for_import_csv()?,
    };

    let parsed = crate::io::ingest::read_import_csv(&path)?;
    let mut store = config.open_store()?;
    let summary = crate::io::ingest::apply_import(&mut store, config.user, parsed)?;
    store.flush()?;

    println!(
        "Imported {}: {} row(s) read, {} crop(s) and {} harvest(s) created, {} row(s) skipped.",
        path.display(),
        summary.rows_read,
        summary.crops_created,
        summary.harvests_created,
        summary.rows_skipped()
    );
    for err in summary.row_errors.iter().take(MAX_ROW_ERRORS_SHOWN) {
        println!("  line {}: {}", err.line, err.message);
    }
    if summary.rows_skipped() > MAX_ROW_ERRORS_SHOWN {
        println!("  ... and {} more", summary.rows_skipped() - MAX_ROW_ERRORS_SHOWN);
    }

    Ok(())
}

fn handle_seed(config: &AppConfig, args: SeedArgs) -> Result<(), AppError> {
    let demo = crate::data::DemoConfig {
        seed: args.seed,
        first_year: args.first_year,
        years: args.years,
        ..crate::data::DemoConfig::default()
    };
    let history = crate::data::generate_demo_history(&demo)?;

    let mut store: JsonFileStore = config.open_store()?;
    let (crops, harvests) = crate::data::seed_store(&mut store, config.user, history)?;
    store.flush()?;

    println!(
        "Seeded {crops} crop(s) and {harvests} harvest(s) for user {} into {}.",
        config.user,
        store.path().display()
    );
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::new(4, format!("Failed to serialize JSON: {e}")))?;
    println!("{text}");
    Ok(())
}

/// Rewrite argv so `farm` defaults to `farm tui`.
///
/// Rules:
/// - `farm`                          -> `farm tui`
/// - `farm --store x.json -v`        -> `farm --store x.json -v tui`
/// - `farm --help/--version/-h/help` -> unchanged (show top-level help/version)
/// - anything naming a subcommand    -> unchanged
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let rest = argv.get(1..).unwrap_or_default();

    let asks_help_or_version = rest
        .iter()
        .any(|a| matches!(a.as_str(), "-h" | "--help" | "-V" | "--version" | "help"));
    let names_subcommand = rest
        .iter()
        .any(|a| crate::cli::SUBCOMMANDS.contains(&a.as_str()));

    if !asks_help_or_version && !names_subcommand {
        argv.push("tui".to_string());
    }
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_farm_opens_the_dashboard() {
        assert_eq!(rewrite_args(argv(&["farm"])), argv(&["farm", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["farm", "--store", "x.json", "-v"])),
            argv(&["farm", "--store", "x.json", "-v", "tui"])
        );
    }

    #[test]
    fn explicit_commands_and_help_are_untouched() {
        for args in [
            &["farm", "stats"][..],
            &["farm", "-v", "crop", "list"][..],
            &["farm", "--help"][..],
            &["farm", "-V"][..],
        ] {
            assert_eq!(rewrite_args(argv(args)), argv(args));
        }
    }

    #[test]
    fn rewritten_args_parse() {
        let cli = crate::cli::Cli::parse_from(rewrite_args(argv(&["farm", "-u", "3"])));
        assert!(matches!(cli.command, Command::Tui));
        assert_eq!(cli.user, 3);
    }
}
