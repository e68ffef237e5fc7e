//! `farm-yield` library crate.
//!
//! The binary (`farm`) is a thin wrapper around this library so that:
//!
//! - the estimator and the record store are testable without spawning processes
//! - the CLI and the dashboard share one prediction pipeline

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod report;
pub mod store;
pub mod tui;

pub use domain::{EstimateInput, EstimationResult, HistoricalRecord};
pub use error::{AppError, EstimateError, StoreError};
pub use fit::{estimate, YieldEstimator};
