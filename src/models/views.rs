use serde::{Deserialize, Serialize};

use crate::models::Sector;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearTotal {
    pub year: i32,
    pub emissions: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorYearTotal {
    pub year: i32,
    pub sector: Sector,
    pub emissions: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorTotal {
    pub sector: Sector,
    pub emissions: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionTotal {
    pub region: String,
    pub emissions: f64,
}

/// Sector × year grid of `additional - reference` emissions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaGrid {
    pub reference_scenario: String,
    pub additional_scenario: String,
    pub sectors: Vec<Sector>,
    pub years: Vec<i32>,
    /// `cells[sector_idx][year_idx]`; `None` when either scenario lacks a value.
    pub cells: Vec<Vec<Option<f64>>>,
}

impl DeltaGrid {
    pub fn get(&self, sector: Sector, year: i32) -> Option<f64> {
        let row = self.sectors.iter().position(|s| *s == sector)?;
        let col = self.years.iter().position(|y| *y == year)?;
        self.cells[row][col]
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().flatten().all(Option::is_none)
    }

    /// Smallest and largest delta, ignoring empty cells.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut values = self.cells.iter().flatten().flatten().copied();
        let first = values.next()?;
        Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}
