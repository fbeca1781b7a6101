//! Mean-field run orchestrator.

use crate::dose::sanitize_dose;
use evotherapy_core::{ConfigError, DosingPolicy, MeanFieldConfig, Population, ReplicatorIntegrator};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Time series of a mean-field run. All series are index-aligned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanFieldResult {
    /// Policy that drove the run
    pub policy: String,

    /// Time axis: `k * dt`
    pub time: Vec<f64>,

    /// (H, S, R) fractions
    pub population: Vec<[f64; 3]>,

    /// Dose applied on the step leading to each point (0 at t = 0)
    pub dose: Vec<f64>,

    /// Cumulative `dose * dt`
    pub toxicity: Vec<f64>,
}

impl MeanFieldResult {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Final (H, S, R) fractions.
    pub fn final_population(&self) -> [f64; 3] {
        self.population.last().copied().unwrap_or_default()
    }

    /// Final S + R fraction.
    pub fn final_burden(&self) -> f64 {
        let [_, s, r] = self.final_population();
        s + r
    }

    pub fn total_toxicity(&self) -> f64 {
        self.toxicity.last().copied().unwrap_or(0.0)
    }
}

/// Runs the replicator engine under `policy` for the configured duration.
///
/// There is no early termination: the result always covers the full time
/// axis.
pub fn run_mean_field<P>(config: &MeanFieldConfig, policy: &P) -> Result<MeanFieldResult, ConfigError>
where
    P: DosingPolicy<Population>,
{
    config.validate()?;

    let integrator = ReplicatorIntegrator::from_config(config);
    let dt = integrator.dt();
    let num_points = config.num_points();

    let mut x = Population::from_config(config)?;
    let mut memory = P::Memory::default();
    let mut toxicity = 0.0;

    let mut result = MeanFieldResult {
        policy: policy.name().to_string(),
        time: Vec::with_capacity(num_points),
        population: Vec::with_capacity(num_points),
        dose: Vec::with_capacity(num_points),
        toxicity: Vec::with_capacity(num_points),
    };
    result.time.push(0.0);
    result.population.push(x.to_array());
    result.dose.push(0.0);
    result.toxicity.push(0.0);

    for k in 1..num_points {
        let t = k as f64 * dt;
        let step = k - 1;

        // 1. Decide
        let dose = sanitize_dose(policy.decide(&x, step, &mut memory), policy.name(), step);

        // 2. Accumulate toxicity
        toxicity += dose * dt;

        // 3. Integrate
        x = integrator.step(&x, t, dose);

        result.time.push(t);
        result.population.push(x.to_array());
        result.dose.push(dose);
        result.toxicity.push(toxicity);
    }

    info!(
        "mean-field {}: {} points, final burden {:.4}, toxicity {:.1}",
        result.policy,
        result.len(),
        result.final_burden(),
        toxicity
    );

    Ok(result)
}
