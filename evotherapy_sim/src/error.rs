//! Error types for the experiment harness.

use evotherapy_core::{ConfigError, SeedError};
use thiserror::Error;

/// Errors surfaced by runs, settings loading and export.
#[derive(Debug, Error)]
pub enum SimError {
    /// Configuration rejected at setup
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Initial tumor could not be grown
    #[error("Seeding error: {0}")]
    Seed(#[from] SeedError),

    /// Settings or export file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings or export (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
