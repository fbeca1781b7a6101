//! The spatial engine: a stochastic death/reproduction cellular automaton.
//!
//! One step:
//! 1. Compute the fitness field of the grid as it stands.
//! 2. Every occupied cell dies with the natural death rate; Sensitive cells
//!    carry an extra hazard proportional to the drug.
//! 3. Every empty cell (in shuffled order) is claimed by a neighbouring
//!    phenotype drawn with probability proportional to neighbour fitness.
//!
//! Reproduction reads the live grid, so a site filled earlier in the step
//! competes for sites visited later in the same step. Fitness values come
//! from the field computed in (1); sites that were empty at that point
//! carry fitness 0.

use crate::config::SpatialConfig;
use crate::fitness::{neighbor_proportions, FitnessModel};
use crate::grid::CellGrid;
use crate::phenotype::{Cell, Phenotype};
use nalgebra::DMatrix;
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;

/// Death and reproduction rule over a [`CellGrid`].
#[derive(Debug, Clone, Copy)]
pub struct SpatialAutomaton {
    model: FitnessModel,
    natural_death_rate: f64,
    drug_death_coefficient: f64,
}

/// What happened during one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    /// Cells removed by the death roll
    pub deaths: usize,

    /// Empty sites claimed by a neighbour
    pub births: usize,

    /// Sensitive newborns that mutated to Resistant
    pub mutations: usize,
}

impl SpatialAutomaton {
    pub fn new(model: FitnessModel, natural_death_rate: f64, drug_death_coefficient: f64) -> Self {
        Self {
            model,
            natural_death_rate,
            drug_death_coefficient,
        }
    }

    /// Automaton with the spatial constant set.
    pub fn from_config(config: &SpatialConfig) -> Self {
        Self::new(
            FitnessModel::for_spatial(config),
            config.natural_death_rate,
            config.drug_death_coefficient,
        )
    }

    pub fn model(&self) -> &FitnessModel {
        &self.model
    }

    /// Per-cell fitness against the Moore neighbourhood; 0 on empty sites.
    pub fn fitness_field(&self, grid: &CellGrid, drug: f64) -> DMatrix<f64> {
        let n = grid.size();
        DMatrix::from_fn(n, n, |r, c| match grid.get(r, c).phenotype() {
            None => 0.0,
            Some(phenotype) => {
                let proportions = neighbor_proportions(grid.neighbor_counts(r, c));
                self.model.cell_fitness(phenotype, &proportions, drug)
            }
        })
    }

    /// Death probability of a cell under `drug`.
    pub fn death_probability(&self, cell: Cell, drug: f64) -> f64 {
        match cell {
            Cell::Empty => 0.0,
            Cell::Occupied(Phenotype::Sensitive) if drug > 0.0 => {
                self.natural_death_rate + drug * self.drug_death_coefficient
            }
            Cell::Occupied(_) => self.natural_death_rate,
        }
    }

    /// Advances the grid in place by one therapy step.
    pub fn step<R: Rng + ?Sized>(&self, grid: &mut CellGrid, drug: f64, rng: &mut R) -> StepStats {
        self.step_with_mutation(grid, drug, 0.0, rng)
    }

    /// Advances the grid in place; Sensitive newborns turn Resistant with
    /// probability `mutation_rate`.
    pub fn step_with_mutation<R: Rng + ?Sized>(
        &self,
        grid: &mut CellGrid,
        drug: f64,
        mutation_rate: f64,
        rng: &mut R,
    ) -> StepStats {
        let fitness = self.fitness_field(grid, drug);
        let mut stats = StepStats {
            deaths: self.apply_deaths(grid, drug, rng),
            ..Default::default()
        };

        let mut empty = grid.empty_sites();
        empty.shuffle(rng);

        let mut neighbors: Vec<Cell> = Vec::with_capacity(8);
        let mut weights: Vec<f64> = Vec::with_capacity(8);

        for (row, col) in empty {
            neighbors.clear();
            weights.clear();
            for (nr, nc) in grid.neighbors(row, col) {
                let cell = grid.get(nr, nc);
                if !cell.is_empty() {
                    neighbors.push(cell);
                    weights.push(fitness[(nr, nc)]);
                }
            }

            if neighbors.is_empty() {
                continue;
            }
            if weights.iter().sum::<f64>() == 0.0 {
                continue;
            }
            let Ok(dist) = WeightedIndex::new(&weights) else {
                continue;
            };

            let mut winner = neighbors[dist.sample(rng)];
            if winner == Cell::SENSITIVE && mutation_rate > 0.0 && rng.gen::<f64>() < mutation_rate {
                winner = Cell::RESISTANT;
                stats.mutations += 1;
            }
            grid.set(row, col, winner);
            stats.births += 1;
        }

        stats
    }

    fn apply_deaths<R: Rng + ?Sized>(&self, grid: &mut CellGrid, drug: f64, rng: &mut R) -> usize {
        let n = grid.size();
        let mut deaths = 0;
        for row in 0..n {
            for col in 0..n {
                let roll: f64 = rng.gen();
                let cell = grid.get(row, col);
                if !cell.is_empty() && roll < self.death_probability(cell, drug) {
                    grid.set(row, col, Cell::Empty);
                    deaths += 1;
                }
            }
        }
        deaths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn automaton() -> SpatialAutomaton {
        SpatialAutomaton::from_config(&SpatialConfig::default())
    }

    #[test]
    fn test_fitness_field_zero_on_empty() {
        let grid = CellGrid::from_rows(&[
            vec![0, 1, 1],
            vec![2, 0, 2],
            vec![3, 3, 0],
        ])
        .unwrap();
        let field = automaton().fitness_field(&grid, 0.0);

        assert_eq!(field[(0, 0)], 0.0);
        assert_eq!(field[(1, 1)], 0.0);
        assert!(field[(0, 1)] > 0.0);
        assert!(field.iter().all(|f| *f >= 0.0));
    }

    #[test]
    fn test_drug_lowers_sensitive_field_only() {
        let grid = CellGrid::from_rows(&[
            vec![1, 2, 3],
            vec![2, 1, 2],
            vec![3, 2, 1],
        ])
        .unwrap();
        let a = automaton();
        let clean = a.fitness_field(&grid, 0.0);
        let dosed = a.fitness_field(&grid, 1.0);

        assert!(dosed[(0, 1)] < clean[(0, 1)]);
        assert_eq!(dosed[(0, 0)], clean[(0, 0)]);
        assert_eq!(dosed[(0, 2)], clean[(0, 2)]);
    }

    #[test]
    fn test_death_probability() {
        let a = automaton();
        assert_eq!(a.death_probability(Cell::Empty, 1.0), 0.0);
        assert_eq!(a.death_probability(Cell::HEALTHY, 1.0), 0.05);
        assert!((a.death_probability(Cell::SENSITIVE, 1.0) - 0.20).abs() < 1e-12);
        assert_eq!(a.death_probability(Cell::SENSITIVE, 0.0), 0.05);
    }

    #[test]
    fn test_isolated_empty_site_stays_empty() {
        let mut grid = CellGrid::filled(5, Cell::Empty).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let stats = automaton().step(&mut grid, 0.0, &mut rng);

        assert_eq!(stats, StepStats::default());
        assert_eq!(grid.census().empty, 25);
    }

    #[test]
    fn test_zero_fitness_neighbors_do_not_reproduce() {
        // Lone Sensitive cell under a lethal dose: fitness 0, no births
        let config = SpatialConfig {
            drug_kill_power: 100.0,
            natural_death_rate: 0.0,
            drug_death_coefficient: 0.0,
            ..Default::default()
        };
        let a = SpatialAutomaton::from_config(&config);
        let mut grid = CellGrid::filled(5, Cell::Empty).unwrap();
        grid.set(2, 2, Cell::SENSITIVE);

        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let stats = a.step(&mut grid, 1.0, &mut rng);

        assert_eq!(stats.births, 0);
        assert_eq!(grid.census().sensitive, 1);
    }

    #[test]
    fn test_one_step_fills_only_first_ring() {
        // Newborns are visible to later sites but carry fitness 0 from the
        // start-of-step field, so one step grows exactly the first ring.
        let config = SpatialConfig { natural_death_rate: 0.0, ..Default::default() };
        let a = SpatialAutomaton::from_config(&config);
        let mut grid = CellGrid::filled(7, Cell::Empty).unwrap();
        grid.set(3, 3, Cell::HEALTHY);

        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let stats = a.step(&mut grid, 0.0, &mut rng);

        assert_eq!(stats.births, 8);
        assert_eq!(grid.census().healthy, 9);
    }

    #[test]
    fn test_refilled_site_reproduces_in_same_step() {
        // The Sensitive cell at (3, 3) always dies. Column 4 touches no other
        // start-of-step cell, so it can only be filled from (3, 3) after a
        // Healthy birth there, carrying the dead cell's start-of-step fitness.
        let config = SpatialConfig {
            natural_death_rate: 0.0,
            drug_death_coefficient: 1.0,
            ..Default::default()
        };
        let a = SpatialAutomaton::from_config(&config);
        let mut start = CellGrid::filled(7, Cell::Empty).unwrap();
        start.set(3, 2, Cell::HEALTHY);
        start.set(3, 3, Cell::SENSITIVE);
        assert!(a.fitness_field(&start, 1.0)[(3, 3)] > 0.0);

        let mut second_ring_births = 0;
        for seed in 0..32 {
            let mut grid = start.clone();
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let stats = a.step(&mut grid, 1.0, &mut rng);

            assert_eq!(stats.deaths, 1);
            assert_eq!(grid.census().sensitive, 0);
            let column_4 = (2..=4).filter(|r| !grid.get(*r, 4).is_empty()).count();
            if column_4 > 0 {
                assert_eq!(grid.get(3, 3), Cell::HEALTHY);
                assert!((2..=4).all(|r| grid.get(r, 4) != Cell::SENSITIVE));
                second_ring_births += column_4;
            }
            // Column 5 only touches newborns, which carry fitness 0
            assert!((0..7).all(|r| grid.get(r, 5).is_empty()));
        }
        assert!(second_ring_births > 0);
    }

    #[test]
    fn test_step_is_deterministic_for_seed() {
        let mut a_grid = CellGrid::filled(10, Cell::HEALTHY).unwrap();
        a_grid.set(5, 5, Cell::SENSITIVE);
        let mut b_grid = a_grid.clone();

        let mut rng_a = ChaCha8Rng::seed_from_u64(99);
        let mut rng_b = ChaCha8Rng::seed_from_u64(99);
        for _ in 0..20 {
            automaton().step(&mut a_grid, 0.5, &mut rng_a);
            automaton().step(&mut b_grid, 0.5, &mut rng_b);
        }
        assert_eq!(a_grid, b_grid);
    }

    #[test]
    fn test_full_mutation_turns_sensitive_births_resistant() {
        let config = SpatialConfig { natural_death_rate: 0.0, ..Default::default() };
        let a = SpatialAutomaton::from_config(&config);
        let mut grid = CellGrid::filled(5, Cell::Empty).unwrap();
        grid.set(2, 2, Cell::SENSITIVE);

        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let stats = a.step_with_mutation(&mut grid, 0.0, 1.0, &mut rng);

        assert_eq!(stats.mutations, 8);
        assert_eq!(grid.census().resistant, 8);
        assert_eq!(grid.census().sensitive, 1);
    }

    proptest! {
        #[test]
        fn prop_census_invariant(seed in any::<u64>(), drug in 0.0f64..1.0) {
            let mut grid = CellGrid::filled(12, Cell::HEALTHY).unwrap();
            for r in 5..8 {
                for c in 5..8 {
                    grid.set(r, c, Cell::SENSITIVE);
                }
            }
            grid.set(0, 0, Cell::RESISTANT);

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            for _ in 0..10 {
                automaton().step(&mut grid, drug, &mut rng);
                prop_assert_eq!(grid.census().total(), 144);
                prop_assert!(grid.to_rows().iter().flatten().all(|code| *code <= 3));
            }
        }
    }
}
