//! The mean-field engine: replicator dynamics integrated with RK4.
//!
//! ```text
//! dx_i/dt = x_i * (f_i - f_avg),    f_avg = x . f
//! ```
//!
//! The drug concentration is an exogenous input sampled once per outer step
//! and held constant across all four Runge-Kutta stages.

use crate::config::MeanFieldConfig;
use crate::error::ConfigError;
use crate::fitness::FitnessModel;
use crate::phenotype::Phenotype;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Population fractions (H, S, R) on the probability simplex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Population(Vector3<f64>);

impl Population {
    /// Builds a population from raw fractions, normalizing them to sum 1.
    pub fn new(healthy: f64, sensitive: f64, resistant: f64) -> Result<Self, ConfigError> {
        let raw = Vector3::new(healthy, sensitive, resistant);
        if raw.iter().any(|x| !x.is_finite() || *x < 0.0) {
            return Err(ConfigError::population(format!("negative or non-finite entry in {:?}", raw.as_slice())));
        }
        let total = raw.sum();
        if total <= 0.0 {
            return Err(ConfigError::population("fractions must sum to a positive value"));
        }
        Ok(Self(raw / total))
    }

    /// Initial population of a mean-field run.
    pub fn from_config(config: &MeanFieldConfig) -> Result<Self, ConfigError> {
        let [h, s, r] = config.initial_population;
        Self::new(h, s, r)
    }

    /// Fraction of one phenotype.
    pub fn fraction(&self, phenotype: Phenotype) -> f64 {
        self.0[phenotype.index()]
    }

    pub fn healthy(&self) -> f64 {
        self.0[0]
    }

    pub fn sensitive(&self) -> f64 {
        self.0[1]
    }

    pub fn resistant(&self) -> f64 {
        self.0[2]
    }

    /// Combined S + R fraction.
    pub fn tumor_burden(&self) -> f64 {
        self.sensitive() + self.resistant()
    }

    pub fn as_vector(&self) -> &Vector3<f64> {
        &self.0
    }

    pub fn to_array(&self) -> [f64; 3] {
        [self.0[0], self.0[1], self.0[2]]
    }
}

/// Fixed-step RK4 integrator for the replicator equation.
#[derive(Debug, Clone, Copy)]
pub struct ReplicatorIntegrator {
    model: FitnessModel,
    dt: f64,
}

impl ReplicatorIntegrator {
    pub fn new(model: FitnessModel, dt: f64) -> Self {
        Self { model, dt }
    }

    /// Integrator with the mean-field constant set and step size.
    pub fn from_config(config: &MeanFieldConfig) -> Self {
        Self::new(FitnessModel::for_mean_field(config), config.dt)
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn model(&self) -> &FitnessModel {
        &self.model
    }

    /// Right-hand side of the replicator equation.
    ///
    /// `_t` is accepted for interface symmetry with ODE solvers; the
    /// dynamics are autonomous.
    pub fn derivative(&self, x: &Vector3<f64>, _t: f64, drug: f64) -> Vector3<f64> {
        let f = self.model.fitness(x, drug);
        let avg_fitness = x.dot(&f);
        x.component_mul(&f.add_scalar(-avg_fitness))
    }

    /// Advances the population by one step of size `dt`.
    ///
    /// After the RK4 update, negative components are floored to 0 and the
    /// vector is renormalized to sum 1.
    pub fn step(&self, population: &Population, t: f64, drug: f64) -> Population {
        let dt = self.dt;
        let x = population.0;

        let k1 = self.derivative(&x, t, drug);
        let k2 = self.derivative(&(x + k1 * (0.5 * dt)), t + 0.5 * dt, drug);
        let k3 = self.derivative(&(x + k2 * (0.5 * dt)), t + 0.5 * dt, drug);
        let k4 = self.derivative(&(x + k3 * dt), t + dt, drug);

        let next = (x + (k1 + k2 * 2.0 + k3 * 2.0 + k4) * (dt / 6.0)).map(|v| v.max(0.0));
        let total = next.sum();
        if total > 0.0 && total.is_finite() {
            Population(next / total)
        } else {
            // Only reachable with a pathological step; keep the last valid state
            *population
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_population_normalizes() {
        let p = Population::new(2.0, 1.0, 1.0).unwrap();
        assert_relative_eq!(p.healthy(), 0.5, epsilon = 1e-12);
        assert_relative_eq!(p.tumor_burden(), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_population_rejects_degenerate() {
        assert!(Population::new(0.0, 0.0, 0.0).is_err());
        assert!(Population::new(1.0, -0.1, 0.1).is_err());
        assert!(Population::new(f64::NAN, 0.5, 0.5).is_err());
    }

    #[test]
    fn test_derivative_sums_to_zero() {
        let integrator = ReplicatorIntegrator::from_config(&MeanFieldConfig::default());
        let x = Vector3::new(0.6, 0.38, 0.02);
        let dx = integrator.derivative(&x, 0.0, 0.5);
        assert_relative_eq!(dx.sum(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_vertex_is_fixed_point() {
        let integrator = ReplicatorIntegrator::from_config(&MeanFieldConfig::default());

        for vertex in [Vector3::x(), Vector3::y(), Vector3::z()] {
            let dx = integrator.derivative(&vertex, 0.0, 0.0);
            assert!(dx.norm() < 1e-12);

            let p = Population(vertex);
            let next = integrator.step(&p, 0.0, 0.0);
            assert!((next.as_vector() - p.as_vector()).norm() < 1e-12);
        }
    }

    #[test]
    fn test_sensitive_declines_under_full_dose() {
        let config = MeanFieldConfig { drug_kill_power: 5.0, ..Default::default() };
        let integrator = ReplicatorIntegrator::from_config(&config);
        let mut p = Population::from_config(&config).unwrap();

        for k in 0..200 {
            let next = integrator.step(&p, k as f64 * config.dt, 1.0);
            assert!(next.sensitive() <= p.sensitive() + 1e-12);
            p = next;
        }
    }

    #[test]
    fn test_sensitive_grows_without_drug() {
        // S out-competes H and R in the default table
        let config = MeanFieldConfig::default();
        let integrator = ReplicatorIntegrator::from_config(&config);
        let p = Population::from_config(&config).unwrap();
        let next = integrator.step(&p, 0.0, 0.0);
        assert!(next.sensitive() > p.sensitive());
    }

    proptest! {
        #[test]
        fn prop_step_stays_on_simplex(
            h in 0.0f64..1.0,
            s in 0.0f64..1.0,
            r in 0.0f64..1.0,
            drug in 0.0f64..1.0,
        ) {
            prop_assume!(h + s + r > 1e-6);
            let integrator = ReplicatorIntegrator::from_config(&MeanFieldConfig::default());
            let mut p = Population::new(h, s, r).unwrap();

            for _ in 0..20 {
                p = integrator.step(&p, 0.0, drug);
                prop_assert!(p.as_vector().iter().all(|v| *v >= 0.0));
                prop_assert!((p.as_vector().sum() - 1.0).abs() < 1e-9);
            }
        }
    }
}
