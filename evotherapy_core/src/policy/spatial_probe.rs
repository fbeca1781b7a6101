//! Stackelberg-style probe policy for the spatial engine.
//!
//! ```text
//!   Probe   --(timer > probe_steps, relative shrinkage > threshold)--> Control
//!           --(timer > probe_steps, otherwise)------------------------> Holiday
//!   Control --(in-band timer > reprobe_steps)--> Probe
//!   Holiday --(timer > holiday_steps)--> Probe
//! ```
//!
//! Shrinkage is relative to the burden recorded when the probe started, so
//! the same threshold works across tumor sizes. Inside Control the timer
//! only advances while the burden sits between the two thresholds.

use super::{DosingPolicy, TumorObservation};
use tracing::debug;

/// Phase of the spatial probe state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpatialProbePhase {
    Probe,
    Control,
    Holiday,
}

/// Resistance level inferred from the last probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResistanceEstimate {
    #[default]
    Unknown,
    Low,
    High,
}

/// Spatial probe-and-classify controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialStackelberg {
    /// Dose applied while probing
    pub probe_dose: f64,

    /// Probe lasts until the timer exceeds this
    pub probe_steps: u32,

    /// Relative shrinkage that classifies the tumor as responsive
    pub shrinkage_threshold: f64,

    /// Dose applied above `control_upper`
    pub control_dose: f64,

    pub control_upper: f64,

    pub control_lower: f64,

    /// Re-probe once the in-band timer exceeds this
    pub reprobe_steps: u32,

    /// Holiday lasts until the timer exceeds this
    pub holiday_steps: u32,
}

impl Default for SpatialStackelberg {
    fn default() -> Self {
        Self {
            probe_dose: 0.7,
            probe_steps: 5,
            shrinkage_threshold: 0.05,
            control_dose: 0.8,
            control_upper: 0.30,
            control_lower: 0.20,
            reprobe_steps: 50,
            holiday_steps: 40,
        }
    }
}

/// Memory of [`SpatialStackelberg`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SpatialProbeMemory {
    state: Option<SpatialProbeState>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SpatialProbeState {
    phase: SpatialProbePhase,
    timer: u32,
    last_size: f64,
    estimate: ResistanceEstimate,
}

impl SpatialProbeMemory {
    pub fn phase(&self) -> Option<SpatialProbePhase> {
        self.state.map(|s| s.phase)
    }

    pub fn timer(&self) -> Option<u32> {
        self.state.map(|s| s.timer)
    }

    /// Burden recorded at the last phase entry.
    pub fn last_size(&self) -> Option<f64> {
        self.state.map(|s| s.last_size)
    }

    pub fn estimate(&self) -> ResistanceEstimate {
        self.state.map(|s| s.estimate).unwrap_or_default()
    }
}

impl SpatialProbeState {
    fn enter(&mut self, phase: SpatialProbePhase, burden: f64) {
        self.phase = phase;
        self.timer = 0;
        self.last_size = burden;
    }
}

impl<O: TumorObservation + ?Sized> DosingPolicy<O> for SpatialStackelberg {
    type Memory = SpatialProbeMemory;

    fn name(&self) -> &str {
        "stackelberg"
    }

    fn decide(&self, observation: &O, step: usize, memory: &mut SpatialProbeMemory) -> f64 {
        let burden = observation.tumor_burden();
        let state = memory.state.get_or_insert(SpatialProbeState {
            phase: SpatialProbePhase::Probe,
            timer: 0,
            last_size: burden,
            estimate: ResistanceEstimate::Unknown,
        });

        match state.phase {
            SpatialProbePhase::Probe => {
                state.timer += 1;
                if state.timer <= self.probe_steps {
                    return self.probe_dose;
                }

                let response = if state.last_size > 0.0 {
                    (state.last_size - burden) / state.last_size
                } else {
                    0.0
                };

                let next = if response > self.shrinkage_threshold {
                    state.estimate = ResistanceEstimate::Low;
                    SpatialProbePhase::Control
                } else {
                    state.estimate = ResistanceEstimate::High;
                    SpatialProbePhase::Holiday
                };
                debug!(
                    "step {}: probe response {:.3} -> resistance {:?}, {:?}",
                    step, response, state.estimate, next
                );
                state.enter(next, burden);
                0.0
            }
            SpatialProbePhase::Control => {
                if burden > self.control_upper {
                    return self.control_dose;
                }
                if burden < self.control_lower {
                    return 0.0;
                }
                state.timer += 1;
                if state.timer > self.reprobe_steps {
                    state.enter(SpatialProbePhase::Probe, burden);
                }
                0.0
            }
            SpatialProbePhase::Holiday => {
                state.timer += 1;
                if state.timer > self.holiday_steps {
                    state.enter(SpatialProbePhase::Probe, burden);
                }
                0.0
            }
        }
    }
}
