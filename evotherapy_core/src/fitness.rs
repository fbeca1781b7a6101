//! Game-theoretic fitness model shared by both engines.
//!
//! Fitness of phenotype `i` against a mixture `p`:
//!
//! ```text
//! f_i = 1 - w0 + w0 * (A p)_i          (base)
//! f_S = f_S - drug * kill_power         (Sensitive only)
//! f   = max(f, 0)
//! ```
//!
//! The mean-field engine evaluates the vector form against the whole
//! population; the spatial engine evaluates the per-cell form against the
//! Moore neighbourhood of each cell.

use crate::config::{MeanFieldConfig, PayoffTable, SpatialConfig};
use crate::phenotype::Phenotype;
use nalgebra::{Matrix3, Vector3};

/// Payoff matrix, selection pressure and drug kill power.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessModel {
    payoff: Matrix3<f64>,
    selection_pressure: f64,
    drug_kill_power: f64,
}

impl FitnessModel {
    /// Creates a model from a row-major payoff table.
    pub fn new(payoff: &PayoffTable, selection_pressure: f64, drug_kill_power: f64) -> Self {
        Self {
            payoff: Matrix3::from_fn(|i, j| payoff[i][j]),
            selection_pressure,
            drug_kill_power,
        }
    }

    /// Model with the mean-field constant set.
    pub fn for_mean_field(config: &MeanFieldConfig) -> Self {
        Self::new(&config.payoff, config.selection_pressure, config.drug_kill_power)
    }

    /// Model with the spatial constant set (smaller kill power).
    pub fn for_spatial(config: &SpatialConfig) -> Self {
        Self::new(&config.payoff, config.selection_pressure, config.drug_kill_power)
    }

    pub fn payoff(&self) -> &Matrix3<f64> {
        &self.payoff
    }

    pub fn drug_kill_power(&self) -> f64 {
        self.drug_kill_power
    }

    /// Drug-free fitness of every phenotype, before clamping.
    pub fn base_fitness(&self, proportions: &Vector3<f64>) -> Vector3<f64> {
        let w = self.selection_pressure;
        (self.payoff * proportions).map(|payoff| 1.0 - w + w * payoff)
    }

    /// Fitness vector under `drug`, floored at zero.
    pub fn fitness(&self, proportions: &Vector3<f64>, drug: f64) -> Vector3<f64> {
        let mut f = self.base_fitness(proportions);
        f[Phenotype::Sensitive.index()] -= drug * self.drug_kill_power;
        f.map(|v| v.max(0.0))
    }

    /// Fitness of a single phenotype under `drug`, floored at zero.
    pub fn cell_fitness(&self, phenotype: Phenotype, proportions: &Vector3<f64>, drug: f64) -> f64 {
        let w = self.selection_pressure;
        let payoff = self.payoff.row(phenotype.index()).tr_dot(proportions);
        let mut f = 1.0 - w + w * payoff;
        if phenotype == Phenotype::Sensitive {
            f -= drug * self.drug_kill_power;
        }
        f.max(0.0)
    }
}

/// Converts neighbour counts (H, S, R) to proportions.
///
/// A cell with no occupied neighbours divides by 1, yielding all zeros.
pub fn neighbor_proportions(counts: [u32; 3]) -> Vector3<f64> {
    let total = counts.iter().sum::<u32>().max(1) as f64;
    Vector3::new(
        counts[0] as f64 / total,
        counts[1] as f64 / total,
        counts[2] as f64 / total,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn model(kill: f64) -> FitnessModel {
        FitnessModel::for_mean_field(&MeanFieldConfig {
            drug_kill_power: kill,
            ..Default::default()
        })
    }

    #[test]
    fn test_base_fitness_formula() {
        let m = model(2.5);
        let p = Vector3::new(0.6, 0.38, 0.02);
        let f = m.base_fitness(&p);

        // Healthy: 0.5 + 0.5 * (2.5*0.6 + 1.5*0.38 + 1.5*0.02)
        assert_relative_eq!(f[0], 0.5 + 0.5 * (1.5 + 0.57 + 0.03), epsilon = 1e-12);
        // Sensitive: 0.5 + 0.5 * (4.0*0.6 + 2.0*0.38 + 2.8*0.02)
        assert_relative_eq!(f[1], 0.5 + 0.5 * (2.4 + 0.76 + 0.056), epsilon = 1e-12);
    }

    #[test]
    fn test_zero_dose_applies_no_penalty() {
        let m = model(2.5);
        let p = Vector3::new(0.2, 0.5, 0.3);
        let base = m.base_fitness(&p);
        let f = m.fitness(&p, 0.0);

        for i in 0..3 {
            assert_relative_eq!(f[i], base[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_drug_only_hits_sensitive() {
        let m = model(0.5);
        let p = Vector3::new(0.3, 0.4, 0.3);
        let base = m.base_fitness(&p);
        let f = m.fitness(&p, 1.0);

        assert_relative_eq!(f[0], base[0], epsilon = 1e-12);
        assert_relative_eq!(f[1], base[1] - 0.5, epsilon = 1e-12);
        assert_relative_eq!(f[2], base[2], epsilon = 1e-12);
    }

    #[test]
    fn test_fitness_clamped_at_zero() {
        let m = model(100.0);
        let f = m.fitness(&Vector3::new(0.3, 0.4, 0.3), 1.0);
        assert_eq!(f[1], 0.0);
    }

    #[test]
    fn test_cell_fitness_matches_vector_form() {
        let m = FitnessModel::for_spatial(&SpatialConfig::default());
        let p = neighbor_proportions([3, 4, 1]);
        let f = m.fitness(&p, 0.7);

        for phenotype in Phenotype::ALL {
            assert_relative_eq!(
                m.cell_fitness(phenotype, &p, 0.7),
                f[phenotype.index()],
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn test_isolated_cell_has_zero_proportions() {
        let p = neighbor_proportions([0, 0, 0]);
        assert_eq!(p, Vector3::zeros());

        // Fitness falls back to 1 - w0
        let m = FitnessModel::for_spatial(&SpatialConfig::default());
        assert_relative_eq!(m.cell_fitness(Phenotype::Healthy, &p, 0.0), 0.5, epsilon = 1e-12);
    }
}
