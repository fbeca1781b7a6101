//! Registry of the dosing strategies compared in every experiment.

use serde::Serialize;

/// Policy identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyId {
    /// Policy A: maximum tolerated dose every step
    Mtd,

    /// Policy B: low constant dose
    Metronomic,

    /// Policy C: burden-threshold hysteresis
    Adaptive,

    /// Policy D: probe-then-control leader strategy
    Stackelberg,
}

impl PolicyId {
    /// Returns all policies in report order.
    pub fn all() -> Vec<PolicyId> {
        vec![
            PolicyId::Mtd,
            PolicyId::Metronomic,
            PolicyId::Adaptive,
            PolicyId::Stackelberg,
        ]
    }

    /// Returns the policy name.
    pub fn name(&self) -> &'static str {
        match self {
            PolicyId::Mtd => "mtd",
            PolicyId::Metronomic => "metronomic",
            PolicyId::Adaptive => "adaptive",
            PolicyId::Stackelberg => "stackelberg",
        }
    }

    /// Report label.
    pub fn label(&self) -> &'static str {
        match self {
            PolicyId::Mtd => "Policy A: MTD",
            PolicyId::Metronomic => "Policy B: Metronomic",
            PolicyId::Adaptive => "Policy C: Adaptive",
            PolicyId::Stackelberg => "Policy D: Stackelberg",
        }
    }

    /// Returns a description of the policy.
    pub fn description(&self) -> &'static str {
        match self {
            PolicyId::Mtd => "Full dose (1.0) every step",
            PolicyId::Metronomic => "Constant low dose (0.4)",
            PolicyId::Adaptive => "Treat until burden halves, pause until it regrows",
            PolicyId::Stackelberg => "Probe tumor response, then hold burden in a band",
        }
    }
}

impl std::fmt::Display for PolicyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for PolicyId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mtd" | "a" | "max" => Ok(PolicyId::Mtd),
            "metronomic" | "b" | "low" => Ok(PolicyId::Metronomic),
            "adaptive" | "c" => Ok(PolicyId::Adaptive),
            "stackelberg" | "d" | "probe" => Ok(PolicyId::Stackelberg),
            _ => Err(format!("Unknown policy: {}", s)),
        }
    }
}
