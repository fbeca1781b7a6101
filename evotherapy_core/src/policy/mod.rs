//! Dosing policies.
//!
//! A policy observes the simulation state once per step and returns the drug
//! concentration for that step. Policies with feedback keep their state in a
//! per-run [`DosingPolicy::Memory`] value: the orchestrator creates it with
//! `Default` at run start and hands it back unchanged on every call, so the
//! first call always sees the uninitialized state and sets itself up.

mod adaptive;
mod constant;
mod probe;
mod spatial_probe;

pub use adaptive::{AdaptiveMemory, AdaptiveTherapy, Baseline};
pub use constant::ConstantDose;
pub use probe::{ProbeMemory, ProbePhase, StackelbergProbe};
pub use spatial_probe::{
    ResistanceEstimate, SpatialProbeMemory, SpatialProbePhase, SpatialStackelberg,
};

use crate::grid::CellGrid;
use crate::replicator::Population;

/// Anything a policy can read a tumor burden from.
pub trait TumorObservation {
    /// Combined Sensitive + Resistant share (population fraction or grid-area
    /// fraction).
    fn tumor_burden(&self) -> f64;
}

impl TumorObservation for Population {
    fn tumor_burden(&self) -> f64 {
        Population::tumor_burden(self)
    }
}

impl TumorObservation for CellGrid {
    fn tumor_burden(&self) -> f64 {
        self.tumor_fraction()
    }
}

/// A dosing controller over observations of type `O`.
pub trait DosingPolicy<O: ?Sized> {
    /// Per-run private state. `Default` is the uninitialized state.
    type Memory: Default;

    /// Short identifier used in logs and exports.
    fn name(&self) -> &str;

    /// Drug concentration for `step`, nominally in [0, 1].
    fn decide(&self, observation: &O, step: usize, memory: &mut Self::Memory) -> f64;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::TumorObservation;

    /// Synthetic observation carrying a fixed burden.
    #[derive(Debug, Clone, Copy)]
    pub struct Burden(pub f64);

    impl TumorObservation for Burden {
        fn tumor_burden(&self) -> f64 {
            self.0
        }
    }
}
