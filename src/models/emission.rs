use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::CellValue;

/// Economic sectors with a fixed display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sector {
    Agriculture,
    Buildings,
    Electricity,
    #[serde(rename = "Heavy Industry")]
    HeavyIndustry,
    #[serde(rename = "Oil and Gas")]
    OilAndGas,
    Transportation,
    #[serde(rename = "WCI Credits")]
    WciCredits,
    #[serde(rename = "Waste and Others")]
    WasteAndOthers,
}

impl Sector {
    /// Canonical display order.
    pub const ALL: [Sector; 8] = [
        Sector::Agriculture,
        Sector::Buildings,
        Sector::Electricity,
        Sector::HeavyIndustry,
        Sector::OilAndGas,
        Sector::Transportation,
        Sector::WciCredits,
        Sector::WasteAndOthers,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Sector::Agriculture => "Agriculture",
            Sector::Buildings => "Buildings",
            Sector::Electricity => "Electricity",
            Sector::HeavyIndustry => "Heavy Industry",
            Sector::OilAndGas => "Oil and Gas",
            Sector::Transportation => "Transportation",
            Sector::WciCredits => "WCI Credits",
            Sector::WasteAndOthers => "Waste and Others",
        }
    }

    /// Match a sheet label against the vocabulary (trimmed, case-insensitive).
    pub fn parse(label: &str) -> Option<Self> {
        let label = label.trim();
        Sector::ALL
            .into_iter()
            .find(|sector| sector.label().eq_ignore_ascii_case(label))
    }

    pub fn display_index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One unpivoted cell before type coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEmissionRow {
    pub year: CellValue,
    pub sector: CellValue,
    pub scenario: String,
    pub region: String,
    pub emissions: CellValue,
}

/// One row of the normalized long-format table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmissionRecord {
    pub year: Option<i32>,
    pub sector: String,
    pub scenario: String,
    pub region: String,
    pub emissions: Option<f64>,
}

impl EmissionRecord {
    pub fn new(
        year: Option<i32>,
        sector: impl Into<String>,
        scenario: impl Into<String>,
        region: impl Into<String>,
        emissions: Option<f64>,
    ) -> Self {
        Self {
            year,
            sector: sector.into(),
            scenario: scenario.into(),
            region: region.into(),
            emissions,
        }
    }

    /// Sector in the fixed vocabulary, if any.
    pub fn known_sector(&self) -> Option<Sector> {
        Sector::parse(&self.sector)
    }

    /// Year and emissions when both are present.
    pub fn value_point(&self) -> Option<(i32, f64)> {
        match (self.year, self.emissions) {
            (Some(year), Some(value)) => Some((year, value)),
            _ => None,
        }
    }
}
