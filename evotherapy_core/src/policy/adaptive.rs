//! Adaptive therapy: bang-bang dosing with hysteresis around a baseline.
//!
//! Treat at full dose until the tumor burden drops below `low * baseline`,
//! then hold a drug holiday until it rises above `high * baseline`.

use super::{DosingPolicy, TumorObservation};
use crate::config::MeanFieldConfig;
use tracing::debug;

/// Where the reference tumor burden comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Baseline {
    /// A known burden, e.g. the configured initial population
    Fixed(f64),

    /// The burden seen on the first call, floored at the given value
    FirstObservation { floor: f64 },
}

/// Hysteresis controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptiveTherapy {
    baseline: Baseline,
    low: f64,
    high: f64,
}

/// Memory of [`AdaptiveTherapy`]; `None` until the first call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AdaptiveMemory {
    state: Option<AdaptiveState>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct AdaptiveState {
    treating: bool,
    baseline: f64,
}

impl AdaptiveMemory {
    /// Whether the controller is currently dosing (None before first call).
    pub fn treating(&self) -> Option<bool> {
        self.state.map(|s| s.treating)
    }

    /// Baseline burden in use (None before first call).
    pub fn baseline(&self) -> Option<f64> {
        self.state.map(|s| s.baseline)
    }
}

impl AdaptiveTherapy {
    pub fn new(baseline: Baseline, low: f64, high: f64) -> Self {
        Self { baseline, low, high }
    }

    /// Mean-field tuning: baseline is the configured initial S + R, stop
    /// below 50%, restart above 99%.
    pub fn mean_field(config: &MeanFieldConfig) -> Self {
        Self::new(Baseline::Fixed(config.initial_burden()), 0.5, 0.99)
    }

    /// Spatial tuning: baseline is the first observed burden (at least 1%),
    /// stop below 65%, restart above 90%.
    pub fn spatial() -> Self {
        Self::new(Baseline::FirstObservation { floor: 0.01 }, 0.65, 0.9)
    }
}

impl<O: TumorObservation + ?Sized> DosingPolicy<O> for AdaptiveTherapy {
    type Memory = AdaptiveMemory;

    fn name(&self) -> &str {
        "adaptive"
    }

    fn decide(&self, observation: &O, step: usize, memory: &mut AdaptiveMemory) -> f64 {
        let burden = observation.tumor_burden();

        let state = memory.state.get_or_insert_with(|| AdaptiveState {
            treating: true,
            baseline: match self.baseline {
                Baseline::Fixed(b) => b,
                Baseline::FirstObservation { floor } => burden.max(floor),
            },
        });

        if state.treating {
            if burden < self.low * state.baseline {
                debug!("step {}: burden {:.4} below stop threshold, holiday", step, burden);
                state.treating = false;
                return 0.0;
            }
            1.0
        } else {
            if burden > self.high * state.baseline {
                debug!("step {}: burden {:.4} above restart threshold, treating", step, burden);
                state.treating = true;
                return 1.0;
            }
            0.0
        }
    }
}
