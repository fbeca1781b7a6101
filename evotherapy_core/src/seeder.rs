//! Tumor seeder - grows a viable initial grid before a spatial run.
//!
//! Each attempt starts from an all-Healthy grid with a centred block of
//! Sensitive cells, then runs drug-free automaton steps with mutation until
//! the tumor (S + R) reaches the target share of the grid or the iteration
//! bound is hit. Attempts that end at or below the viability threshold are
//! discarded and the procedure restarts from scratch.

use crate::automaton::SpatialAutomaton;
use crate::config::{SeederConfig, SpatialConfig};
use crate::error::SeedError;
use crate::grid::CellGrid;
use crate::phenotype::Cell;
use rand::Rng;
use tracing::{debug, info};

/// Builds initial grids for spatial runs.
#[derive(Debug, Clone)]
pub struct TumorSeeder {
    automaton: SpatialAutomaton,
    grid_size: usize,
    config: SeederConfig,
}

impl TumorSeeder {
    /// Creates a seeder for the given spatial configuration.
    pub fn new(config: &SpatialConfig) -> Result<Self, SeedError> {
        config.validate()?;
        Ok(Self {
            automaton: SpatialAutomaton::from_config(config),
            grid_size: config.grid_size,
            config: config.seeder.clone(),
        })
    }

    /// Overrides the attempt bound.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = Some(attempts);
        self
    }

    /// Number of S + R cells an attempt aims for.
    pub fn target_size(&self) -> f64 {
        (self.grid_size * self.grid_size) as f64 * self.config.target_fraction
    }

    /// Grows grids until one is viable.
    ///
    /// Without an attempt bound this retries forever; the seeded block makes
    /// success almost sure for sensible tuning.
    pub fn seed<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<CellGrid, SeedError> {
        let mut attempts = 0u32;
        let mut best_size = 0usize;

        loop {
            attempts += 1;
            let grid = self.grow(rng)?;
            let size = grid.census().tumor();

            if size > self.config.min_viable_cells {
                info!("Tumor generated after {} attempt(s): {} cells", attempts, size);
                return Ok(grid);
            }

            debug!(
                "Seeding attempt {} failed: {} tumor cells (need > {})",
                attempts, size, self.config.min_viable_cells
            );
            best_size = best_size.max(size);

            if let Some(max) = self.config.max_attempts {
                if attempts >= max {
                    return Err(SeedError::Exhausted {
                        attempts,
                        best_size,
                        min_viable: self.config.min_viable_cells,
                    });
                }
            }
        }
    }

    /// One growth attempt.
    fn grow<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<CellGrid, SeedError> {
        let mut grid = CellGrid::filled(self.grid_size, Cell::HEALTHY)?;

        // Centred block: rows/cols mid-1..=mid+1 for the default 3x3
        let mid = self.grid_size / 2;
        let start = (mid + self.grid_size - self.config.seed_block / 2) % self.grid_size;
        for dr in 0..self.config.seed_block {
            for dc in 0..self.config.seed_block {
                let row = (start + dr) % self.grid_size;
                let col = (start + dc) % self.grid_size;
                grid.set(row, col, Cell::SENSITIVE);
            }
        }

        let target = self.target_size();
        for _ in 0..self.config.max_growth_iterations {
            self.automaton
                .step_with_mutation(&mut grid, 0.0, self.config.mutation_rate, rng);

            if grid.census().tumor() as f64 >= target {
                break;
            }
        }

        Ok(grid)
    }
}
