//! Stackelberg-style probe policy for the mean-field engine.
//!
//! ```text
//!   ProbeStart --(timer > probe_steps)--> Measure
//!   Measure    --(shrinkage > threshold)--> AdaptiveControl
//!              --(otherwise)-------------> FullBreak
//!   FullBreak  --(timer > break_steps)---> ProbeStart
//!   AdaptiveControl --(timer > reprobe, if enabled)--> ProbeStart
//! ```
//!
//! Shrinkage is measured in absolute burden units against the burden seen
//! when the probe started.

use super::{DosingPolicy, TumorObservation};
use tracing::debug;

/// Phase of the mean-field probe state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbePhase {
    ProbeStart,
    Measure,
    AdaptiveControl,
    FullBreak,
}

/// Mean-field probe-and-classify controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StackelbergProbe {
    /// Dose applied while probing
    pub probe_dose: f64,

    /// Probe lasts until the timer exceeds this
    pub probe_steps: u32,

    /// Absolute shrinkage that classifies the tumor as responsive
    pub shrinkage_threshold: f64,

    /// Dose applied above `control_upper`
    pub control_dose: f64,

    pub control_upper: f64,

    pub control_lower: f64,

    /// Re-probe after this many control steps (None = stay in control)
    pub control_reprobe_steps: Option<u32>,

    /// Holiday lasts until the timer exceeds this
    pub break_steps: u32,
}

impl Default for StackelbergProbe {
    fn default() -> Self {
        Self {
            probe_dose: 0.7,
            probe_steps: 20,
            shrinkage_threshold: 0.01,
            control_dose: 0.8,
            control_upper: 0.3,
            control_lower: 0.2,
            control_reprobe_steps: None,
            break_steps: 30,
        }
    }
}

/// Memory of [`StackelbergProbe`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProbeMemory {
    state: Option<ProbeState>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ProbeState {
    phase: ProbePhase,
    timer: u32,
    baseline: f64,
}

impl ProbeMemory {
    pub fn phase(&self) -> Option<ProbePhase> {
        self.state.map(|s| s.phase)
    }

    pub fn timer(&self) -> Option<u32> {
        self.state.map(|s| s.timer)
    }

    /// Burden recorded when the current probe started.
    pub fn baseline(&self) -> Option<f64> {
        self.state.map(|s| s.baseline)
    }
}

impl<O: TumorObservation + ?Sized> DosingPolicy<O> for StackelbergProbe {
    type Memory = ProbeMemory;

    fn name(&self) -> &str {
        "stackelberg"
    }

    fn decide(&self, observation: &O, step: usize, memory: &mut ProbeMemory) -> f64 {
        let burden = observation.tumor_burden();
        let state = memory.state.get_or_insert(ProbeState {
            phase: ProbePhase::ProbeStart,
            timer: 0,
            baseline: burden,
        });

        match state.phase {
            ProbePhase::ProbeStart => {
                state.timer += 1;
                if state.timer > self.probe_steps {
                    state.phase = ProbePhase::Measure;
                }
                self.probe_dose
            }
            ProbePhase::Measure => {
                let shrinkage = state.baseline - burden;
                state.phase = if shrinkage > self.shrinkage_threshold {
                    ProbePhase::AdaptiveControl
                } else {
                    ProbePhase::FullBreak
                };
                state.timer = 0;
                debug!("step {}: probe shrinkage {:.4} -> {:?}", step, shrinkage, state.phase);
                0.0
            }
            ProbePhase::AdaptiveControl => {
                if burden > self.control_upper {
                    return self.control_dose;
                }
                if burden < self.control_lower {
                    return 0.0;
                }
                if let Some(reprobe) = self.control_reprobe_steps {
                    state.timer += 1;
                    if state.timer > reprobe {
                        *state = ProbeState {
                            phase: ProbePhase::ProbeStart,
                            timer: 0,
                            baseline: burden,
                        };
                    }
                }
                0.0
            }
            ProbePhase::FullBreak => {
                state.timer += 1;
                if state.timer > self.break_steps {
                    *state = ProbeState {
                        phase: ProbePhase::ProbeStart,
                        timer: 0,
                        baseline: burden,
                    };
                }
                0.0
            }
        }
    }
}
