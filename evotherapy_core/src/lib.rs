//! EvoTherapy Core - evolutionary game model of tumor therapy
//!
//! Three phenotypes compete: Healthy (H), drug-Sensitive (S) and
//! drug-Resistant (R). Fitness follows a payoff matrix game; a drug lowers
//! the fitness of Sensitive cells only. Two engines evolve the game:
//!
//! 1. **Mean-field**: replicator dynamics on population fractions, RK4
//! 2. **Spatial**: stochastic death/reproduction on a toroidal grid
//!
//! Dosing policies observe either engine and choose the drug each step.

pub mod automaton;
pub mod config;
pub mod error;
pub mod fitness;
pub mod grid;
pub mod phenotype;
pub mod policy;
pub mod replicator;
pub mod seeder;

// Re-export key types for convenience
pub use automaton::{SpatialAutomaton, StepStats};
pub use config::{MeanFieldConfig, PayoffTable, SeederConfig, SpatialConfig};
pub use error::{ConfigError, SeedError};
pub use fitness::FitnessModel;
pub use grid::{Census, CellGrid};
pub use phenotype::{Cell, Phenotype};
pub use policy::{DosingPolicy, TumorObservation};
pub use replicator::{Population, ReplicatorIntegrator};
pub use seeder::TumorSeeder;
