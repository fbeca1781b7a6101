//! Experiment runner - executes policy comparisons on either engine.

use crate::error::SimError;
use crate::mean_field::{run_mean_field, MeanFieldResult};
use crate::policies::PolicyId;
use crate::settings::ExperimentSettings;
use crate::spatial::{run_spatial, RunOutcome, SpatialResult};

use evotherapy_core::policy::{AdaptiveTherapy, ConstantDose, SpatialStackelberg, StackelbergProbe};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::info;

/// Simulation engine selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Engine {
    /// Replicator dynamics on population fractions
    MeanField,

    /// Stochastic automaton on a toroidal grid
    Spatial,
}

impl Engine {
    pub fn all() -> Vec<Engine> {
        vec![Engine::MeanField, Engine::Spatial]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Engine::MeanField => "mean-field",
            Engine::Spatial => "spatial",
        }
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mean-field" | "mean_field" | "meanfield" | "ode" => Ok(Engine::MeanField),
            "spatial" | "grid" | "ca" => Ok(Engine::Spatial),
            _ => Err(format!("Unknown engine: {}", s)),
        }
    }
}

/// Headline numbers of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Policy that was run
    pub policy: PolicyId,

    /// Engine it ran on
    pub engine: Engine,

    /// Recorded points (mean-field) or executed steps (spatial)
    pub steps: usize,

    /// Final S + R share
    pub final_burden: f64,

    /// Final (H, S, R) shares
    pub final_fractions: [f64; 3],

    /// Cumulative dose delivered
    pub total_toxicity: f64,

    /// Whether the patient survived the toxicity limit
    pub survived: bool,

    /// Step at which the toxicity limit ended the run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub death_step: Option<usize>,
}

impl RunSummary {
    pub fn from_mean_field(policy: PolicyId, result: &MeanFieldResult) -> Self {
        Self {
            policy,
            engine: Engine::MeanField,
            steps: result.len(),
            final_burden: result.final_burden(),
            final_fractions: result.final_population(),
            total_toxicity: result.total_toxicity(),
            survived: true,
            death_step: None,
        }
    }

    pub fn from_spatial(policy: PolicyId, result: &SpatialResult) -> Self {
        let death_step = match result.outcome {
            RunOutcome::Completed => None,
            RunOutcome::ToxicityLimit { step, .. } => Some(step),
        };
        Self {
            policy,
            engine: Engine::Spatial,
            steps: result.len(),
            final_burden: result.final_burden(),
            final_fractions: result.final_fractions(),
            total_toxicity: result.total_toxicity(),
            survived: death_step.is_none(),
            death_step,
        }
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:<24} {:<10} steps={:<5} burden={:.3} resistant={:.3} toxicity={:.1}",
            self.policy.label(),
            self.engine.name(),
            self.steps,
            self.final_burden,
            self.final_fractions[2],
            self.total_toxicity
        )?;
        if let Some(step) = self.death_step {
            write!(f, " DIED at step {}", step)?;
        }
        Ok(())
    }
}

/// Runs policies against the configured engines.
pub struct ExperimentRunner {
    /// Master seed
    seed: u64,

    /// Engine configurations
    settings: ExperimentSettings,
}

impl ExperimentRunner {
    /// Creates a runner with default settings.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            settings: ExperimentSettings::default(),
        }
    }

    /// Sets the engine configurations.
    pub fn with_settings(mut self, settings: ExperimentSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn settings(&self) -> &ExperimentSettings {
        &self.settings
    }

    /// Seed of the spatial generator. Every policy gets the same one, so all
    /// spatial runs start from the same seeded tumor.
    pub fn spatial_seed(&self) -> u64 {
        self.seed.wrapping_mul(0x9e3779b97f4a7c15)
    }

    /// Runs `policy` on the mean-field engine.
    pub fn run_mean_field(&self, policy: PolicyId) -> Result<MeanFieldResult, SimError> {
        info!("Starting mean-field run: {}", policy.label());
        let config = &self.settings.mean_field;

        let result = match policy {
            PolicyId::Mtd => run_mean_field(config, &ConstantDose::max())?,
            PolicyId::Metronomic => run_mean_field(config, &ConstantDose::low())?,
            PolicyId::Adaptive => run_mean_field(config, &AdaptiveTherapy::mean_field(config))?,
            PolicyId::Stackelberg => run_mean_field(config, &StackelbergProbe::default())?,
        };
        Ok(result)
    }

    /// Runs `policy` on the spatial engine.
    pub fn run_spatial(&self, policy: PolicyId) -> Result<SpatialResult, SimError> {
        info!("Starting spatial run: {} (seed={})", policy.label(), self.seed);
        let config = &self.settings.spatial;
        let mut rng = ChaCha8Rng::seed_from_u64(self.spatial_seed());

        let result = match policy {
            PolicyId::Mtd => run_spatial(config, &ConstantDose::max(), &mut rng)?,
            PolicyId::Metronomic => run_spatial(config, &ConstantDose::low(), &mut rng)?,
            PolicyId::Adaptive => run_spatial(config, &AdaptiveTherapy::spatial(), &mut rng)?,
            PolicyId::Stackelberg => run_spatial(config, &SpatialStackelberg::default(), &mut rng)?,
        };
        Ok(result)
    }

    /// Runs `policy` on `engine` and summarizes it.
    pub fn summarize(&self, engine: Engine, policy: PolicyId) -> Result<RunSummary, SimError> {
        match engine {
            Engine::MeanField => {
                let result = self.run_mean_field(policy)?;
                Ok(RunSummary::from_mean_field(policy, &result))
            }
            Engine::Spatial => {
                let result = self.run_spatial(policy)?;
                Ok(RunSummary::from_spatial(policy, &result))
            }
        }
    }
}
