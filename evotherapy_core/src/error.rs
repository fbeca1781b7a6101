//! Error types for model configuration and tumor seeding.

use thiserror::Error;

/// Configuration rejected at run setup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Integration step must be finite and strictly positive
    #[error("Step size must be positive, got {0}")]
    NonPositiveStep(f64),

    /// Run length must be finite and strictly positive
    #[error("Duration must be positive, got {0}")]
    NonPositiveDuration(f64),

    /// Initial population has a negative entry or does not sum positively
    #[error("Invalid population vector: {0}")]
    InvalidPopulation(String),

    /// Grid with no cells
    #[error("Grid must have at least one cell")]
    EmptyGrid,

    /// Grid rows of unequal length, or row count != column count
    #[error("Grid must be square, got {rows}x{cols}")]
    NonSquareGrid { rows: usize, cols: usize },

    /// Unknown cell code in a grid literal
    #[error("Invalid cell code {0} (expected 0..=3)")]
    InvalidCellCode(u8),

    /// The seeded Sensitive block does not fit inside the grid
    #[error("Seed block {block}x{block} does not fit a {grid}x{grid} grid")]
    SeedBlockTooLarge { block: usize, grid: usize },

    /// Seeder growth stops before an attempt can pass the viability check
    #[error("Growth target {target} cells does not exceed the viability threshold {min_viable}")]
    UnreachableViability { target: f64, min_viable: usize },

    /// A parameter lies outside its admissible range
    #[error("Parameter `{field}` out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

impl ConfigError {
    /// Creates an out-of-range error.
    pub fn out_of_range(field: &'static str, value: f64) -> Self {
        Self::OutOfRange { field, value }
    }

    /// Creates an invalid population error.
    pub fn population(msg: impl Into<String>) -> Self {
        Self::InvalidPopulation(msg.into())
    }
}

/// Errors raised by the tumor seeder.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeedError {
    /// Seeder configuration is invalid
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Every attempt ended below the viability threshold
    #[error("No viable tumor after {attempts} attempts (best: {best_size} cells, need > {min_viable})")]
    Exhausted {
        attempts: u32,
        best_size: usize,
        min_viable: usize,
    },
}
