//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - estimator inputs/outputs (`EstimateInput`, `HistoricalRecord`, `EstimationResult`)
//! - label enums (`Season`, `YieldCategory`, `Confidence`)
//! - stored records (`Crop`, `Harvest`) and their create/update payloads
//! - the static crop profile and tip tables (`profiles`)

pub mod profiles;
pub mod types;

pub use profiles::*;
pub use types::*;
