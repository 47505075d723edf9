use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ProcessingError, Result};
use crate::models::EmissionTable;
use crate::utils::constants::{ALL_REGIONS_LABEL, ALL_SECTORS_LABEL};

/// Region choice: one region, or the aggregate over all of them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RegionFilter {
    #[default]
    All,
    Only(String),
}

/// Sector choice: one sector label, or all of them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SectorFilter {
    #[default]
    All,
    Only(String),
}

impl RegionFilter {
    /// `"all"` and the selector label map to [`RegionFilter::All`].
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("all") || value.eq_ignore_ascii_case(ALL_REGIONS_LABEL) {
            RegionFilter::All
        } else {
            RegionFilter::Only(value.to_string())
        }
    }

    pub fn matches(&self, region: &str) -> bool {
        match self {
            RegionFilter::All => true,
            RegionFilter::Only(name) => name == region,
        }
    }
}

impl SectorFilter {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.eq_ignore_ascii_case("all") || value.eq_ignore_ascii_case(ALL_SECTORS_LABEL) {
            SectorFilter::All
        } else {
            SectorFilter::Only(value.to_string())
        }
    }

    pub fn matches(&self, sector: &str) -> bool {
        match self {
            SectorFilter::All => true,
            SectorFilter::Only(name) => name == sector,
        }
    }
}

impl fmt::Display for RegionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionFilter::All => f.write_str(ALL_REGIONS_LABEL),
            RegionFilter::Only(name) => f.write_str(name),
        }
    }
}

impl fmt::Display for SectorFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SectorFilter::All => f.write_str(ALL_SECTORS_LABEL),
            SectorFilter::Only(name) => f.write_str(name),
        }
    }
}

/// The user's current filter choice, passed by value into every query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub scenario: String,
    pub region: RegionFilter,
    pub sector: SectorFilter,
    pub year: i32,
}

impl Selection {
    pub fn new(scenario: impl Into<String>, year: i32) -> Self {
        Self {
            scenario: scenario.into(),
            region: RegionFilter::All,
            sector: SectorFilter::All,
            year,
        }
    }

    pub fn with_region(mut self, region: RegionFilter) -> Self {
        self.region = region;
        self
    }

    pub fn with_sector(mut self, sector: SectorFilter) -> Self {
        self.sector = sector;
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = year;
        self
    }

    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = scenario.into();
        self
    }

    /// First scenario, all regions, all sectors, and `target_year` clamped
    /// into the observed year range.
    pub fn default_for(table: &EmissionTable, target_year: i32) -> Result<Self> {
        let scenario = table.scenarios().into_iter().next().ok_or_else(|| {
            ProcessingError::InvalidSelection("table has no scenarios".to_string())
        })?;
        let year = match table.year_range() {
            Some((lo, hi)) => target_year.clamp(lo, hi),
            None => target_year,
        };
        Ok(Self::new(scenario, year))
    }

    /// Reject names that do not occur in the table and years outside its range.
    pub fn validate_against(&self, table: &EmissionTable) -> Result<()> {
        let scenarios = table.scenarios();
        if !scenarios.contains(&self.scenario) {
            return Err(ProcessingError::InvalidSelection(format!(
                "unknown scenario '{}'; available: [{}]",
                self.scenario,
                scenarios.join(", ")
            )));
        }

        if let RegionFilter::Only(region) = &self.region {
            let regions = table.regions();
            if !regions.contains(region) {
                return Err(ProcessingError::InvalidSelection(format!(
                    "unknown region '{}'; available: [{}]",
                    region,
                    regions.join(", ")
                )));
            }
        }

        if let SectorFilter::Only(sector) = &self.sector {
            let sectors = table.sectors();
            if !sectors.contains(sector) {
                return Err(ProcessingError::InvalidSelection(format!(
                    "unknown sector '{}'; available: [{}]",
                    sector,
                    sectors.join(", ")
                )));
            }
        }

        if let Some((lo, hi)) = table.year_range() {
            if !(lo..=hi).contains(&self.year) {
                return Err(ProcessingError::InvalidSelection(format!(
                    "year {} is outside the observed range {}-{}",
                    self.year, lo, hi
                )));
            }
        }

        Ok(())
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {}",
            self.scenario, self.region, self.sector, self.year
        )
    }
}
