use std::path::Path;
use tracing::info;

use crate::error::Result;
use crate::readers::workbook_reader::{concat_sheets, SheetTable, WorkbookReader};

/// Reads the secondary national-summary workbook. Its schema is not fixed,
/// so sheets are stacked as-is and columns are discovered afterwards.
pub struct NationalReader;

impl NationalReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read_combined(&self, path: &Path) -> Result<SheetTable> {
        let sheets = WorkbookReader::new().read_sheets(path)?;
        Ok(self.combine(&sheets))
    }

    pub fn combine(&self, sheets: &[SheetTable]) -> SheetTable {
        let combined = concat_sheets("national", sheets);
        info!(
            sheets = sheets.len(),
            rows = combined.row_count(),
            columns = combined.headers.len(),
            "Combined national summary sheets"
        );
        combined
    }
}

impl Default for NationalReader {
    fn default() -> Self {
        Self::new()
    }
}
