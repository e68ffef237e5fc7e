//! Yield model evaluation.
//!
//! Models are implemented as small, pure functions so that fitting and charting
//! code can share them.

pub mod model;

pub use model::*;
