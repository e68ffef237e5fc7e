//! Input/output helpers.
//!
//! - CSV import and history ingest + validation (`ingest`)
//! - prediction exports (CSV/JSON) (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
