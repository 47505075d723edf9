use tracing::debug;

use crate::models::{CellValue, EmissionRecord, EmissionTable, RawEmissionRow};

/// Coerce a cell to a year. Whole numbers and numeric text convert;
/// anything else (text, fractions, empty) is `None`.
pub fn coerce_year(cell: &CellValue) -> Option<i32> {
    let value = cell.as_f64()?;
    if value.fract() != 0.0 || value < i32::MIN as f64 || value > i32::MAX as f64 {
        return None;
    }
    Some(value as i32)
}

/// Coerce a cell to an emissions value; non-numeric cells become `None`.
pub fn coerce_emissions(cell: &CellValue) -> Option<f64> {
    cell.as_f64()
}

/// Turns raw unpivoted rows into typed, trimmed records.
pub struct Normalizer;

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Coerce and trim every row. Rows with a null year or value are kept;
    /// aggregation drops them later.
    pub fn normalize(&self, rows: Vec<RawEmissionRow>) -> EmissionTable {
        let records: Vec<EmissionRecord> = rows.into_iter().map(|r| self.normalize_row(r)).collect();

        let null_years = records.iter().filter(|r| r.year.is_none()).count();
        let null_values = records.iter().filter(|r| r.emissions.is_none()).count();
        debug!(
            records = records.len(),
            null_years, null_values, "Normalized emissions table"
        );

        EmissionTable::new(records)
    }

    pub fn normalize_row(&self, row: RawEmissionRow) -> EmissionRecord {
        EmissionRecord {
            year: coerce_year(&row.year),
            sector: row.sector.to_trimmed_string(),
            scenario: row.scenario.trim().to_string(),
            region: row.region.trim().to_string(),
            emissions: coerce_emissions(&row.emissions),
        }
    }

    /// Re-apply trimming and numeric cleanup to an already typed record.
    /// A normalized record comes back unchanged.
    pub fn normalize_record(&self, record: EmissionRecord) -> EmissionRecord {
        EmissionRecord {
            year: record.year,
            sector: record.sector.trim().to_string(),
            scenario: record.scenario.trim().to_string(),
            region: record.region.trim().to_string(),
            emissions: record.emissions.filter(|v| v.is_finite()),
        }
    }

    pub fn renormalize(&self, table: &EmissionTable) -> EmissionTable {
        EmissionTable::new(
            table
                .records()
                .iter()
                .cloned()
                .map(|r| self.normalize_record(r))
                .collect(),
        )
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}
