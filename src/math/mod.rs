//! Mathematical utilities: closed-form ridge regression.

pub mod ridge;

pub use ridge::*;
