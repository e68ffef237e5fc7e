//! Command-line parsing for the `farm` yield estimator.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the estimation and storage code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};

pub mod picker;

/// Subcommand names, used when rewriting a bare `farm` into `farm tui`.
pub const SUBCOMMANDS: [&str; 8] = [
    "crop", "harvest", "predict", "estimate", "stats", "import", "seed", "tui",
];

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "farm", version, about = "Crop yield records and estimates")]
pub struct Cli {
    /// JSON record store.
    #[arg(long, global = true, env = "FARM_STORE", default_value = "farm.json")]
    pub store: PathBuf,

    /// Owner id for all record operations.
    #[arg(short = 'u', long, global = true, env = "FARM_USER", default_value_t = 1)]
    pub user: u64,

    /// Increase log verbosity (-v, -vv, -vvv). `RUST_LOG` overrides this.
    #[arg(short = 'v', long = "verbose", global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage crops (plantings).
    Crop {
        #[command(subcommand)]
        action: CropAction,
    },
    /// Manage harvests of your crops.
    Harvest {
        #[command(subcommand)]
        action: HarvestAction,
    },
    /// Predict the yield of stored crops from your harvest history.
    Predict(PredictArgs),
    /// Estimate a yield without touching the store.
    Estimate(EstimateArgs),
    /// Harvest statistics, grouped by crop name.
    Stats(StatsArgs),
    /// Bulk import crops and harvests from CSV.
    Import(ImportArgs),
    /// Write a deterministic synthetic history into the store (demo data).
    Seed(SeedArgs),
    /// Launch the interactive dashboard.
    ///
    /// Shows your crops, their predictions and a chart of the history behind each
    /// estimate. This is the default when no subcommand is given.
    Tui,
}

#[derive(Debug, Subcommand)]
pub enum CropAction {
    /// Add a crop.
    Add {
        /// Crop name, e.g. Maize.
        #[arg(long)]
        name: String,
        /// Planted area in acres.
        #[arg(long)]
        area: f64,
        /// Planting date (YYYY-MM-DD).
        #[arg(long, value_parser = parse_iso_date)]
        planted: NaiveDate,
    },
    /// List your crops, most recent planting first.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Change fields of a crop.
    Update {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        area: Option<f64>,
        #[arg(long, value_parser = parse_iso_date)]
        planted: Option<NaiveDate>,
    },
    /// Delete a crop and all its harvests.
    Delete { id: u64 },
}

#[derive(Debug, Subcommand)]
pub enum HarvestAction {
    /// Record a harvest of one of your crops.
    Add {
        /// Crop id.
        #[arg(long)]
        crop: u64,
        /// Harvest date (YYYY-MM-DD).
        #[arg(long, value_parser = parse_iso_date)]
        date: NaiveDate,
        /// Harvested amount in kg.
        #[arg(long = "yield")]
        yield_amount: f64,
    },
    /// List harvests, newest first.
    List {
        #[arg(long)]
        crop: Option<u64>,
        /// Earliest harvest date (inclusive).
        #[arg(long, value_parser = parse_iso_date)]
        from: Option<NaiveDate>,
        /// Latest harvest date (inclusive).
        #[arg(long, value_parser = parse_iso_date)]
        to: Option<NaiveDate>,
        #[arg(long)]
        json: bool,
    },
    /// Change fields of a harvest.
    Update {
        id: u64,
        #[arg(long, value_parser = parse_iso_date)]
        date: Option<NaiveDate>,
        #[arg(long = "yield")]
        yield_amount: Option<f64>,
    },
    /// Delete a harvest.
    Delete { id: u64 },
}

#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    /// Crop id to predict.
    #[arg(long, conflicts_with = "all", required_unless_present = "all")]
    pub crop: Option<u64>,

    /// Predict every crop you own.
    #[arg(long)]
    pub all: bool,

    /// Print JSON instead of a table.
    #[arg(long)]
    pub json: bool,

    /// Export predictions to CSV (or JSON with a `.json` extension).
    #[arg(long)]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct EstimateArgs {
    /// Crop name; unknown names use the default profile.
    #[arg(long)]
    pub crop_name: String,

    /// Planting month (1-12).
    #[arg(long)]
    pub month: u32,

    /// Area in acres.
    #[arg(long)]
    pub area: f64,

    /// History CSV with `month` (or `planting_date`), `area`, `yield_amount`.
    #[arg(long, value_name = "CSV")]
    pub history: Option<PathBuf>,

    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct StatsArgs {
    #[arg(long, value_parser = parse_iso_date)]
    pub from: Option<NaiveDate>,

    #[arg(long, value_parser = parse_iso_date)]
    pub to: Option<NaiveDate>,

    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct ImportArgs {
    /// CSV file to import. Without it, pick one interactively.
    #[arg(short = 'f', long = "file", value_name = "CSV")]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct SeedArgs {
    /// Random seed; the same seed always writes the same history.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// First harvest year.
    #[arg(long, default_value_t = 2021)]
    pub first_year: i32,

    /// Number of years to generate.
    #[arg(long, default_value_t = 4)]
    pub years: u32,
}

fn parse_iso_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| format!("expected YYYY-MM-DD, got '{s}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_options_after_the_subcommand() {
        let cli = Cli::parse_from([
            "farm", "predict", "--crop", "3", "--store", "x.json", "-u", "7", "-vv",
        ]);
        assert_eq!(cli.store, PathBuf::from("x.json"));
        assert_eq!(cli.user, 7);
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Predict(args) => {
                assert_eq!(args.crop, Some(3));
                assert!(!args.all);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn predict_needs_a_target() {
        assert!(Cli::try_parse_from(["farm", "predict"]).is_err());
        assert!(Cli::try_parse_from(["farm", "predict", "--crop", "1", "--all"]).is_err());
        assert!(Cli::try_parse_from(["farm", "predict", "--all"]).is_ok());
    }

    #[test]
    fn dates_must_be_iso() {
        let ok = Cli::try_parse_from([
            "farm", "crop", "add", "--name", "Maize", "--area", "2.5", "--planted", "2025-04-01",
        ]);
        assert!(ok.is_ok());
        let bad = Cli::try_parse_from([
            "farm", "crop", "add", "--name", "Maize", "--area", "2.5", "--planted", "01/04/2025",
        ]);
        assert!(bad.is_err());
    }

    #[test]
    fn subcommand_list_matches_definition() {
        let cmd = Cli::command();
        let names: Vec<&str> = cmd
            .get_subcommands()
            .map(|c| c.get_name())
            .filter(|n| *n != "help")
            .collect();
        for name in SUBCOMMANDS {
            assert!(names.contains(&name), "{name}");
        }
        assert_eq!(names.len(), SUBCOMMANDS.len());
    }
}
