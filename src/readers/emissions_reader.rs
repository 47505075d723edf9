use std::path::Path;
use tracing::{debug, info};

use crate::error::Result;
use crate::models::RawEmissionRow;
use crate::readers::workbook_reader::{SheetTable, WorkbookReader};
use crate::utils::constants::{SECTOR_COLUMN, YEAR_COLUMN};

/// Outcome of loading the primary workbook.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub sheets_read: Vec<String>,
    pub sheets_skipped: Vec<String>,
    pub rows: usize,
}

impl LoadReport {
    pub fn summary(&self) -> String {
        let mut summary = format!(
            "Workbook Load Summary:\n\
            - Sheets read: {}\n\
            - Sheets skipped: {}\n\
            - Long-format rows: {}",
            self.sheets_read.len(),
            self.sheets_skipped.len(),
            self.rows
        );
        if !self.sheets_skipped.is_empty() {
            summary.push_str(&format!(
                "\n- Skipped (missing id columns): {}",
                self.sheets_skipped.join(", ")
            ));
        }
        summary
    }
}

/// Reads the primary workbook (one sheet per region) and unpivots the
/// scenario columns into long rows.
pub struct EmissionsReader {
    year_column: String,
    sector_column: String,
}

impl EmissionsReader {
    pub fn new() -> Self {
        Self {
            year_column: YEAR_COLUMN.to_string(),
            sector_column: SECTOR_COLUMN.to_string(),
        }
    }

    pub fn with_id_columns(year_column: &str, sector_column: &str) -> Self {
        Self {
            year_column: year_column.trim().to_string(),
            sector_column: sector_column.trim().to_string(),
        }
    }

    /// Read the workbook at `path` into raw long rows.
    pub fn read_workbook(&self, path: &Path) -> Result<(Vec<RawEmissionRow>, LoadReport)> {
        let sheets = WorkbookReader::new().read_sheets(path)?;
        let (rows, report) = self.unpivot_sheets(&sheets);
        info!(
            path = %path.display(),
            sheets = report.sheets_read.len(),
            skipped = report.sheets_skipped.len(),
            rows = report.rows,
            "Loaded emissions workbook"
        );
        Ok((rows, report))
    }

    /// Unpivot every qualifying sheet; sheets without both id columns are skipped.
    pub fn unpivot_sheets(&self, sheets: &[SheetTable]) -> (Vec<RawEmissionRow>, LoadReport) {
        let mut rows = Vec::new();
        let mut report = LoadReport::default();

        for sheet in sheets {
            match self.unpivot_sheet(sheet) {
                Some(sheet_rows) => {
                    report.sheets_read.push(sheet.name.clone());
                    rows.extend(sheet_rows);
                }
                None => {
                    debug!(sheet = %sheet.name, "Skipping sheet without id columns");
                    report.sheets_skipped.push(sheet.name.clone());
                }
            }
        }

        report.rows = rows.len();
        (rows, report)
    }

    /// Melt one sheet: every non-id column is a scenario. Rows come out
    /// scenario by scenario, each in sheet row order.
    pub fn unpivot_sheet(&self, sheet: &SheetTable) -> Option<Vec<RawEmissionRow>> {
        let year_idx = sheet.column_index(&self.year_column)?;
        let sector_idx = sheet.column_index(&self.sector_column)?;

        let scenario_columns: Vec<(usize, &String)> = sheet
            .headers
            .iter()
            .enumerate()
            .filter(|(_, h)| **h != self.year_column && **h != self.sector_column)
            .collect();

        let mut rows = Vec::with_capacity(scenario_columns.len() * sheet.row_count());
        for (col_idx, scenario) in scenario_columns {
            for row in &sheet.rows {
                rows.push(RawEmissionRow {
                    year: row[year_idx].clone(),
                    sector: row[sector_idx].clone(),
                    scenario: scenario.clone(),
                    region: sheet.name.clone(),
                    emissions: row[col_idx].clone(),
                });
            }
        }

        Some(rows)
    }
}

impl Default for EmissionsReader {
    fn default() -> Self {
        Self::new()
    }
}
