//! Cell phenotypes and grid cell codes.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// One of the three competing cell phenotypes.
///
/// The discriminant doubles as the row/column index into the payoff matrix
/// and the population vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phenotype {
    Healthy = 0,
    Sensitive = 1,
    Resistant = 2,
}

impl Phenotype {
    /// All phenotypes in payoff-matrix order.
    pub const ALL: [Phenotype; 3] = [Phenotype::Healthy, Phenotype::Sensitive, Phenotype::Resistant];

    /// Index into payoff rows and population vectors.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns true for the tumor phenotypes (S and R).
    pub fn is_tumor(self) -> bool {
        matches!(self, Phenotype::Sensitive | Phenotype::Resistant)
    }

    pub fn name(self) -> &'static str {
        match self {
            Phenotype::Healthy => "healthy",
            Phenotype::Sensitive => "sensitive",
            Phenotype::Resistant => "resistant",
        }
    }
}

/// Content of a single grid site.
///
/// Codes: `0 = Empty`, `1 = Healthy`, `2 = Sensitive`, `3 = Resistant`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    Occupied(Phenotype),
}

impl Cell {
    pub const HEALTHY: Cell = Cell::Occupied(Phenotype::Healthy);
    pub const SENSITIVE: Cell = Cell::Occupied(Phenotype::Sensitive);
    pub const RESISTANT: Cell = Cell::Occupied(Phenotype::Resistant);

    /// Numeric cell code.
    pub fn code(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Occupied(p) => p as u8 + 1,
        }
    }

    /// Parses a numeric cell code.
    pub fn from_code(code: u8) -> Result<Self, ConfigError> {
        match code {
            0 => Ok(Cell::Empty),
            1 => Ok(Cell::HEALTHY),
            2 => Ok(Cell::SENSITIVE),
            3 => Ok(Cell::RESISTANT),
            other => Err(ConfigError::InvalidCellCode(other)),
        }
    }

    /// Occupying phenotype, if any.
    pub fn phenotype(self) -> Option<Phenotype> {
        match self {
            Cell::Empty => None,
            Cell::Occupied(p) => Some(p),
        }
    }

    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_codes_roundtrip_all_values() {
        for code in 0..=3u8 {
            assert_eq!(Cell::from_code(code).unwrap().code(), code);
        }
        assert_eq!(Cell::from_code(4), Err(ConfigError::InvalidCellCode(4)));
    }

    #[test]
    fn test_tumor_phenotypes() {
        assert!(!Phenotype::Healthy.is_tumor());
        assert!(Phenotype::Sensitive.is_tumor());
        assert!(Phenotype::Resistant.is_tumor());
    }
}
