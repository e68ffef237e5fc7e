//! Yield estimation.
//!
//! Responsibilities:
//!
//! - normalize raw harvest history into training samples (`fitter`)
//! - fit the ridge month-trend model (`fitter`)
//! - blend it with the seasonal baseline (`blend`)
//! - assemble the labelled result (`estimator`)

pub mod blend;
pub mod estimator;
pub mod fitter;

pub use blend::*;
pub use estimator::*;
pub use fitter::*;
