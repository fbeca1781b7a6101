//! Immutable model configuration for both engines.
//!
//! The mean-field and spatial engines use distinct constant sets (payoff
//! tables and kill powers differ), so each gets its own config value. Both
//! are validated once at run setup and never mutated afterwards.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Row-major 3x3 payoff table. `payoff[i][j]` is what phenotype `i` gets
/// when interacting with phenotype `j` (order: H, S, R).
pub type PayoffTable = [[f64; 3]; 3];

/// Configuration of the mean-field (replicator) engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeanFieldConfig {
    /// Payoff table
    pub payoff: PayoffTable,

    /// Selection pressure w0 in [0, 1]
    pub selection_pressure: f64,

    /// Fitness removed from Sensitive cells per unit of drug
    pub drug_kill_power: f64,

    /// Initial (H, S, R) fractions
    pub initial_population: [f64; 3],

    /// Simulated time span
    pub duration: f64,

    /// Integration step
    pub dt: f64,
}

impl Default for MeanFieldConfig {
    fn default() -> Self {
        Self {
            payoff: [
                [2.5, 1.5, 1.5],
                [4.0, 2.0, 2.8],
                [3.0, 1.0, 2.0],
            ],
            selection_pressure: 0.5,
            drug_kill_power: 2.5,
            initial_population: [0.6, 0.38, 0.02],
            duration: 200.0,
            dt: 0.1,
        }
    }
}

impl MeanFieldConfig {
    /// Checks every parameter; called by the orchestrator before the first step.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(ConfigError::NonPositiveStep(self.dt));
        }
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(ConfigError::NonPositiveDuration(self.duration));
        }
        validate_game(&self.payoff, self.selection_pressure, self.drug_kill_power)?;

        if self.initial_population.iter().any(|x| !x.is_finite() || *x < 0.0) {
            return Err(ConfigError::population(format!(
                "negative or non-finite entry in {:?}",
                self.initial_population
            )));
        }
        let total: f64 = self.initial_population.iter().sum();
        if total <= 0.0 {
            return Err(ConfigError::population("fractions must sum to a positive value"));
        }
        Ok(())
    }

    /// Number of points on the time axis: `ceil(duration / dt)`.
    pub fn num_points(&self) -> usize {
        // Tolerance absorbs ratios like 200 / 0.1 landing a hair above an integer
        ((self.duration / self.dt) - 1e-9).ceil().max(1.0) as usize
    }

    /// Initial tumor burden (S + R) of the normalized initial population.
    pub fn initial_burden(&self) -> f64 {
        let [h, s, r] = self.initial_population;
        let total = h + s + r;
        if total > 0.0 {
            (s + r) / total
        } else {
            0.0
        }
    }
}

/// Tuning for the tumor seeder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeederConfig {
    /// Side length of the centred Sensitive block
    pub seed_block: usize,

    /// Growth stops once S + R reaches this fraction of the grid area
    pub target_fraction: f64,

    /// Probability that a newborn Sensitive cell mutates to Resistant
    pub mutation_rate: f64,

    /// Growth iterations per attempt
    pub max_growth_iterations: usize,

    /// An attempt is viable when S + R is strictly above this count
    pub min_viable_cells: usize,

    /// Attempt bound, at least 1 (None = retry until viable)
    pub max_attempts: Option<u32>,
}

impl Default for SeederConfig {
    fn default() -> Self {
        Self {
            seed_block: 3,
            target_fraction: 0.20,
            mutation_rate: 0.05,
            max_growth_iterations: 2000,
            min_viable_cells: 50,
            max_attempts: None,
        }
    }
}

/// Configuration of the spatial (cellular automaton) engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpatialConfig {
    /// Payoff table
    pub payoff: PayoffTable,

    /// Selection pressure w0 in [0, 1]
    pub selection_pressure: f64,

    /// Fitness removed from Sensitive cells per unit of drug
    pub drug_kill_power: f64,

    /// Extra death probability of Sensitive cells per unit of drug
    pub drug_death_coefficient: f64,

    /// Per-step death probability of every occupied cell
    pub natural_death_rate: f64,

    /// Side length of the square grid
    pub grid_size: usize,

    /// Cumulative dose above which the run ends (patient death)
    pub toxicity_limit: f64,

    /// Number of discrete steps
    pub time_steps: usize,

    /// Steps at which the grid is captured (None = 0, 33%, 66%, last)
    pub snapshot_steps: Option<Vec<usize>>,

    /// Tumor seeder tuning
    pub seeder: SeederConfig,
}

impl Default for SpatialConfig {
    fn default() -> Self {
        Self {
            payoff: [
                [3.0, 1.5, 1.5],
                [4.0, 2.0, 2.8],
                [3.0, 1.0, 2.0],
            ],
            selection_pressure: 0.5,
            drug_kill_power: 0.8,
            drug_death_coefficient: 0.15,
            natural_death_rate: 0.05,
            grid_size: 50,
            toxicity_limit: 400.0,
            time_steps: 5000,
            snapshot_steps: None,
            seeder: SeederConfig::default(),
        }
    }
}

impl SpatialConfig {
    /// Checks every parameter; called by the orchestrator before seeding.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grid_size == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        validate_game(&self.payoff, self.selection_pressure, self.drug_kill_power)?;
        check_probability("natural_death_rate", self.natural_death_rate)?;
        if !(self.drug_death_coefficient.is_finite() && self.drug_death_coefficient >= 0.0) {
            return Err(ConfigError::out_of_range(
                "drug_death_coefficient",
                self.drug_death_coefficient,
            ));
        }
        if self.toxicity_limit.is_nan() || self.toxicity_limit < 0.0 {
            return Err(ConfigError::out_of_range("toxicity_limit", self.toxicity_limit));
        }
        self.seeder.validate(self.grid_size)
    }

    /// Number of cells in the grid.
    pub fn area(&self) -> usize {
        self.grid_size * self.grid_size
    }

    /// Designated snapshot steps, falling back to `[0, T*0.33, T*0.66, T-1]`.
    pub fn snapshot_steps(&self) -> Vec<usize> {
        match &self.snapshot_steps {
            Some(steps) => steps.clone(),
            None => {
                let t = self.time_steps as f64;
                vec![
                    0,
                    (t * 0.33) as usize,
                    (t * 0.66) as usize,
                    self.time_steps.saturating_sub(1),
                ]
            }
        }
    }
}

impl SeederConfig {
    /// Checks the seeder tuning against a grid of side `grid_size`.
    pub fn validate(&self, grid_size: usize) -> Result<(), ConfigError> {
        if self.seed_block == 0 || self.seed_block > grid_size {
            return Err(ConfigError::SeedBlockTooLarge {
                block: self.seed_block,
                grid: grid_size,
            });
        }
        check_probability("seeder.target_fraction", self.target_fraction)?;
        check_probability("seeder.mutation_rate", self.mutation_rate)?;

        // Growth halts at the target, so the target must clear the threshold
        let target = (grid_size * grid_size) as f64 * self.target_fraction;
        if target <= self.min_viable_cells as f64 {
            return Err(ConfigError::UnreachableViability {
                target,
                min_viable: self.min_viable_cells,
            });
        }
        if self.max_attempts == Some(0) {
            return Err(ConfigError::out_of_range("seeder.max_attempts", 0.0));
        }
        Ok(())
    }
}

fn validate_game(payoff: &PayoffTable, w0: f64, kill_power: f64) -> Result<(), ConfigError> {
    check_probability("selection_pressure", w0)?;
    if !(kill_power.is_finite() && kill_power >= 0.0) {
        return Err(ConfigError::out_of_range("drug_kill_power", kill_power));
    }
    if let Some(bad) = payoff.iter().flatten().find(|v| !v.is_finite()) {
        return Err(ConfigError::out_of_range("payoff", *bad));
    }
    Ok(())
}

fn check_probability(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::out_of_range(field, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(MeanFieldConfig::default().validate().is_ok());
        assert!(SpatialConfig::default().validate().is_ok());
    }

    #[test]
    fn test_mean_field_time_axis_length() {
        let config = MeanFieldConfig::default();
        assert_eq!(config.num_points(), 2000);

        let config = MeanFieldConfig { duration: 1.05, dt: 0.1, ..Default::default() };
        assert_eq!(config.num_points(), 11);
    }

    #[test]
    fn test_rejects_bad_step_and_population() {
        let config = MeanFieldConfig { dt: -0.1, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::NonPositiveStep(-0.1)));

        let config = MeanFieldConfig { initial_population: [0.0, 0.0, 0.0], ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPopulation(_))));

        let config = MeanFieldConfig { initial_population: [1.2, -0.2, 0.0], ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPopulation(_))));
    }

    #[test]
    fn test_rejects_bad_grid() {
        let config = SpatialConfig { grid_size: 0, ..Default::default() };
        assert_eq!(config.validate(), Err(ConfigError::EmptyGrid));

        let config = SpatialConfig { grid_size: 2, ..Default::default() };
        assert_eq!(
            config.validate(),
            Err(ConfigError::SeedBlockTooLarge { block: 3, grid: 2 })
        );

        let config = SpatialConfig { natural_death_rate: 1.5, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::OutOfRange { .. })));
    }

    #[test]
    fn test_rejects_grid_too_small_for_viable_tumor() {
        let config = SpatialConfig { grid_size: 7, ..Default::default() };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnreachableViability { min_viable: 50, .. })
        ));

        // 15x15 targets 45 cells, 16x16 targets 51.2
        let config = SpatialConfig { grid_size: 15, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::UnreachableViability { .. })));
        let config = SpatialConfig { grid_size: 16, ..Default::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_zero_attempt_bound() {
        let mut config = SpatialConfig::default();
        config.seeder.max_attempts = Some(0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::out_of_range("seeder.max_attempts", 0.0))
        );

        config.seeder.max_attempts = Some(1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_snapshot_steps() {
        let config = SpatialConfig::default();
        assert_eq!(config.snapshot_steps(), vec![0, 1650, 3300, 4999]);

        let config = SpatialConfig { snapshot_steps: Some(vec![3, 7]), ..Default::default() };
        assert_eq!(config.snapshot_steps(), vec![3, 7]);
    }

    #[test]
    fn test_initial_burden_normalized() {
        let config = MeanFieldConfig { initial_population: [1.2, 0.6, 0.2], ..Default::default() };
        assert!((config.initial_burden() - 0.4).abs() < 1e-12);
    }
}
