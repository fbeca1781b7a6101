//! EvoTherapy experiment harness
//!
//! Drives the four dosing policies against both engines of
//! `evotherapy_core` and collects comparable results:
//!
//! - **Mean-field runs**: full-length time series, toxicity weighted by dt
//! - **Spatial runs**: seeded tumor, toxicity limit ends the run early
//! - **Export**: time series, grid snapshots and summaries as JSON
//!
//! Every random draw comes from a generator seeded by the runner seed, so a
//! whole comparison is reproducible.
//!
//! # Usage
//!
//! ```ignore
//! use evotherapy_sim::{ExperimentRunner, PolicyId};
//!
//! let runner = ExperimentRunner::new(42);
//! let result = runner.run_spatial(PolicyId::Adaptive)?;
//! println!("final burden {:.3}", result.final_burden());
//! ```

mod dose;
mod error;
mod exporter;
mod mean_field;
mod policies;
mod runner;
mod settings;
mod spatial;

pub use dose::sanitize_dose;
pub use error::SimError;
pub use exporter::{ExperimentExport, SnapshotFrame, SpatialExport};
pub use mean_field::{run_mean_field, MeanFieldResult};
pub use policies::PolicyId;
pub use runner::{Engine, ExperimentRunner, RunSummary};
pub use settings::ExperimentSettings;
pub use spatial::{run_spatial, RunOutcome, Snapshot, SpatialResult};
