//! Core data model, configuration, error types, and pipeline orchestration.

pub mod config;
pub mod errors;
pub mod model;
pub mod orchestrator;

pub use config::Settings;
pub use errors::{HardGateError, Result, ResultExt};
pub use model::*;
pub use orchestrator::run_validation;
