use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::models::EmissionTable;

const HEADER: [&str; 5] = ["year", "sector", "scenario", "region", "emissions"];

/// Writes the long-format table as CSV with a header row. Missing years and
/// emissions are written as empty fields.
pub struct CsvWriter {
    delimiter: u8,
}

impl CsvWriter {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn write_table(&self, table: &EmissionTable, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = NamedTempFile::new_in(dir)?;

        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .from_writer(temp.reopen()?);
        writer.write_record(HEADER)?;
        for record in table.records() {
            writer.serialize(record)?;
        }
        writer.flush()?;
        drop(writer);

        temp.persist(path).map_err(|e| ProcessingError::Io(e.error))?;
        debug!(rows = table.len(), path = %path.display(), "Wrote CSV export");
        Ok(())
    }
}

impl Default for CsvWriter {
    fn default() -> Self {
        Self::new()
    }
}
