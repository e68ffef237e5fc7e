//! Demo data generation.

pub mod sample;

pub use sample::{generate_demo_history, seed_store, DemoConfig, DemoPlanting};
