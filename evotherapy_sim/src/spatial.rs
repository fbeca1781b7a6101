//! Spatial run orchestrator.
//!
//! Seeds a tumor, then alternates policy decisions and automaton steps.
//! The toxicity limit is checked after the dose is accumulated and before
//! the grid is stepped; crossing it ends the run (patient death) with a
//! history shorter than the configured step count.

use crate::dose::sanitize_dose;
use evotherapy_core::{
    CellGrid, DosingPolicy, SeedError, SpatialAutomaton, SpatialConfig, StepStats, TumorSeeder,
};
use rand::Rng;
use std::collections::BTreeSet;
use tracing::{info, warn};

/// Grid captured at a designated step.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub step: usize,
    pub grid: CellGrid,
}

/// How a spatial run ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunOutcome {
    /// Every configured step executed
    Completed,

    /// Cumulative dose exceeded the limit at `step`; that step did not run
    ToxicityLimit { step: usize, toxicity: f64 },
}

/// Time series of a spatial run. Fraction series are grid-area fractions.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialResult {
    /// Policy that drove the run
    pub policy: String,

    /// Executed step indices
    pub time: Vec<usize>,

    pub healthy: Vec<f64>,

    pub sensitive: Vec<f64>,

    pub resistant: Vec<f64>,

    /// Dose applied on each executed step
    pub dose: Vec<f64>,

    /// Cumulative dose after each executed step
    pub toxicity: Vec<f64>,

    /// Designated snapshot steps, including any the run never reached
    pub snapshot_schedule: Vec<usize>,

    /// Grids captured at the designated steps that were reached
    pub snapshots: Vec<Snapshot>,

    /// The seeded starting grid
    pub initial_grid: CellGrid,

    pub outcome: RunOutcome,

    /// Deaths, births and mutations summed over all steps
    pub totals: StepStats,
}

impl SpatialResult {
    /// Number of executed steps.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Steps at which snapshots were captured.
    pub fn snapshot_steps(&self) -> Vec<usize> {
        self.snapshots.iter().map(|s| s.step).collect()
    }

    /// Designated steps lost to early termination.
    pub fn missed_snapshot_steps(&self) -> Vec<usize> {
        let captured = self.snapshot_steps();
        self.snapshot_schedule
            .iter()
            .copied()
            .filter(|step| !captured.contains(step))
            .collect()
    }

    /// True when the toxicity limit ended the run.
    pub fn terminated_early(&self) -> bool {
        matches!(self.outcome, RunOutcome::ToxicityLimit { .. })
    }

    /// Final (H, S, R) grid fractions; the seeded grid if no step ran.
    pub fn final_fractions(&self) -> [f64; 3] {
        match (self.healthy.last(), self.sensitive.last(), self.resistant.last()) {
            (Some(h), Some(s), Some(r)) => [*h, *s, *r],
            _ => self.initial_grid.census().fractions(),
        }
    }

    pub fn final_burden(&self) -> f64 {
        let [_, s, r] = self.final_fractions();
        s + r
    }

    /// Cumulative dose actually delivered.
    pub fn total_toxicity(&self) -> f64 {
        self.toxicity.last().copied().unwrap_or(0.0)
    }
}

/// Runs the spatial engine under `policy`.
///
/// `rng` drives seeding and every stochastic step, so a seeded generator
/// makes the whole run reproducible.
pub fn run_spatial<P, R>(config: &SpatialConfig, policy: &P, rng: &mut R) -> Result<SpatialResult, SeedError>
where
    P: DosingPolicy<CellGrid>,
    R: Rng + ?Sized,
{
    let seeder = TumorSeeder::new(config)?;
    let automaton = SpatialAutomaton::from_config(config);
    let snapshot_schedule = config.snapshot_steps();
    let snapshot_steps: BTreeSet<usize> = snapshot_schedule.iter().copied().collect();
    let area = config.area() as f64;

    let mut grid = seeder.seed(rng)?;
    let initial_grid = grid.clone();
    let mut memory = P::Memory::default();
    let mut toxicity = 0.0;
    let mut totals = StepStats::default();
    let mut outcome = RunOutcome::Completed;

    let capacity = config.time_steps;
    let mut result_time = Vec::with_capacity(capacity);
    let mut healthy = Vec::with_capacity(capacity);
    let mut sensitive = Vec::with_capacity(capacity);
    let mut resistant = Vec::with_capacity(capacity);
    let mut doses = Vec::with_capacity(capacity);
    let mut toxicities = Vec::with_capacity(capacity);
    let mut snapshots = Vec::new();

    for step in 0..config.time_steps {
        // 1. Decide
        let dose = sanitize_dose(policy.decide(&grid, step, &mut memory), policy.name(), step);

        // 2. Accumulate toxicity and check the limit before stepping
        toxicity += dose;
        if toxicity > config.toxicity_limit {
            warn!(
                "{}: toxicity limit {} exceeded at step {} (patient death)",
                policy.name(),
                config.toxicity_limit,
                step
            );
            outcome = RunOutcome::ToxicityLimit { step, toxicity };
            break;
        }

        // 3. Evolve
        let stats = automaton.step(&mut grid, dose, rng);
        totals.deaths += stats.deaths;
        totals.births += stats.births;
        totals.mutations += stats.mutations;

        // 4. Record
        let census = grid.census();
        result_time.push(step);
        healthy.push(census.healthy as f64 / area);
        sensitive.push(census.sensitive as f64 / area);
        resistant.push(census.resistant as f64 / area);
        doses.push(dose);
        toxicities.push(toxicity);

        if snapshot_steps.contains(&step) {
            snapshots.push(Snapshot { step, grid: grid.clone() });
        }
    }

    let result = SpatialResult {
        policy: policy.name().to_string(),
        time: result_time,
        healthy,
        sensitive,
        resistant,
        dose: doses,
        toxicity: toxicities,
        snapshot_schedule,
        snapshots,
        initial_grid,
        outcome,
        totals,
    };

    info!(
        "spatial {}: {} steps, final burden {:.3}, toxicity {:.1}",
        result.policy,
        result.len(),
        result.final_burden(),
        result.total_toxicity()
    );

    Ok(result)
}
