//! Toroidal square grid of cell sites.

use crate::error::ConfigError;
use crate::phenotype::{Cell, Phenotype};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Offsets of the 8 Moore neighbours.
pub const MOORE_OFFSETS: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

/// Cell counts by content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Census {
    pub empty: usize,
    pub healthy: usize,
    pub sensitive: usize,
    pub resistant: usize,
}

impl Census {
    /// Total number of sites.
    pub fn total(&self) -> usize {
        self.empty + self.healthy + self.sensitive + self.resistant
    }

    /// S + R cell count.
    pub fn tumor(&self) -> usize {
        self.sensitive + self.resistant
    }

    /// Fractions (H, S, R) of the grid area.
    pub fn fractions(&self) -> [f64; 3] {
        let area = self.total().max(1) as f64;
        [
            self.healthy as f64 / area,
            self.sensitive as f64 / area,
            self.resistant as f64 / area,
        ]
    }
}

/// Square grid with wrap-around adjacency.
#[derive(Debug, Clone, PartialEq)]
pub struct CellGrid {
    cells: DMatrix<Cell>,
}

impl CellGrid {
    /// Creates a `size x size` grid filled with `fill`.
    pub fn filled(size: usize, fill: Cell) -> Result<Self, ConfigError> {
        if size == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        Ok(Self {
            cells: DMatrix::from_element(size, size, fill),
        })
    }

    /// Builds a grid from rows of cell codes.
    pub fn from_rows(rows: &[Vec<u8>]) -> Result<Self, ConfigError> {
        let size = rows.len();
        if size == 0 {
            return Err(ConfigError::EmptyGrid);
        }
        if let Some(bad) = rows.iter().find(|row| row.len() != size) {
            return Err(ConfigError::NonSquareGrid { rows: size, cols: bad.len() });
        }

        let mut cells = DMatrix::from_element(size, size, Cell::Empty);
        for (r, row) in rows.iter().enumerate() {
            for (c, code) in row.iter().enumerate() {
                cells[(r, c)] = Cell::from_code(*code)?;
            }
        }
        Ok(Self { cells })
    }

    /// Side length.
    pub fn size(&self) -> usize {
        self.cells.nrows()
    }

    /// Number of sites.
    pub fn area(&self) -> usize {
        self.cells.len()
    }

    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[(row, col)]
    }

    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        self.cells[(row, col)] = cell;
    }

    /// Coordinates of the neighbour at `offset`, wrapping around the edges.
    pub fn wrap(&self, row: usize, col: usize, offset: (isize, isize)) -> (usize, usize) {
        let n = self.size() as isize;
        let r = (row as isize + offset.0).rem_euclid(n) as usize;
        let c = (col as isize + offset.1).rem_euclid(n) as usize;
        (r, c)
    }

    /// Iterator over the coordinates of the 8 Moore neighbours.
    pub fn neighbors(&self, row: usize, col: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        MOORE_OFFSETS.iter().map(move |&offset| self.wrap(row, col, offset))
    }

    /// Counts of (H, S, R) among the Moore neighbours.
    pub fn neighbor_counts(&self, row: usize, col: usize) -> [u32; 3] {
        let mut counts = [0u32; 3];
        for (r, c) in self.neighbors(row, col) {
            if let Some(p) = self.cells[(r, c)].phenotype() {
                counts[p.index()] += 1;
            }
        }
        counts
    }

    /// Coordinates of every empty site in row-major order.
    pub fn empty_sites(&self) -> Vec<(usize, usize)> {
        let n = self.size();
        (0..n)
            .flat_map(|r| (0..n).map(move |c| (r, c)))
            .filter(|&(r, c)| self.cells[(r, c)].is_empty())
            .collect()
    }

    /// Counts every kind of site.
    pub fn census(&self) -> Census {
        let mut census = Census::default();
        for cell in self.cells.iter() {
            match cell {
                Cell::Empty => census.empty += 1,
                Cell::Occupied(Phenotype::Healthy) => census.healthy += 1,
                Cell::Occupied(Phenotype::Sensitive) => census.sensitive += 1,
                Cell::Occupied(Phenotype::Resistant) => census.resistant += 1,
            }
        }
        census
    }

    /// S + R cells as a fraction of the grid area.
    pub fn tumor_fraction(&self) -> f64 {
        self.census().tumor() as f64 / self.area() as f64
    }

    /// Cell codes, one `Vec` per row.
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        self.cells
            .row_iter()
            .map(|row| row.iter().map(|cell| cell.code()).collect())
            .collect()
    }

    pub fn cells(&self) -> &DMatrix<Cell> {
        &self.cells
    }
}
