//! Run configuration resolved from CLI flags and the environment.
//!
//! `.env` is loaded before argument parsing, so `FARM_STORE`, `FARM_USER` and
//! `RUST_LOG` can all live there.

use std::path::PathBuf;

use crate::cli::Cli;
use crate::domain::UserId;
use crate::error::AppError;
use crate::store::JsonFileStore;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub store_path: PathBuf,
    pub user: UserId,
    pub verbosity: u8,
}

impl AppConfig {
    pub fn from_cli(cli: &Cli) -> Result<Self, AppError> {
        if cli.store.as_os_str().is_empty() {
            return Err(AppError::new(2, "Store path must not be empty."));
        }
        Ok(Self {
            store_path: cli.store.clone(),
            user: cli.user,
            verbosity: cli.verbose,
        })
    }

    pub fn open_store(&self) -> Result<JsonFileStore, AppError> {
        Ok(JsonFileStore::open(&self.store_path)?)
    }
}

/// Load `.env` from the working directory (or a parent). A missing file is fine.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn config_copies_global_flags() {
        let cli = Cli::parse_from(["farm", "--store", "records.json", "-u", "4", "-v", "stats"]);
        let config = AppConfig::from_cli(&cli).unwrap();
        assert_eq!(config.store_path, PathBuf::from("records.json"));
        assert_eq!(config.user, 4);
        assert_eq!(config.verbosity, 1);
    }

    #[test]
    fn empty_store_path_is_rejected() {
        // clap may already refuse an empty path; either way it never reaches the store.
        if let Ok(cli) = Cli::try_parse_from(["farm", "--store", "", "stats"]) {
            assert_eq!(AppConfig::from_cli(&cli).unwrap_err().exit_code(), 2);
        }
    }
}
