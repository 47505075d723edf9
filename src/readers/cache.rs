use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::readers::workbook_reader::{SheetTable, WorkbookReader};

struct CachedWorkbook {
    modified: Option<SystemTime>,
    sheets: Arc<Vec<SheetTable>>,
}

/// Memoizes parsed workbooks keyed on path and modification time, so a
/// session that re-runs its queries does not re-parse unchanged files.
#[derive(Default)]
pub struct WorkbookCache {
    entries: HashMap<PathBuf, CachedWorkbook>,
    hits: usize,
    misses: usize,
}

impl WorkbookCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheets(&mut self, path: &Path) -> Result<Arc<Vec<SheetTable>>> {
        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.entries.remove(path);
                return Err(ProcessingError::MissingFile {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        let modified = metadata.modified().ok();

        if let Some(entry) = self.entries.get(path) {
            if entry.modified.is_some() && entry.modified == modified {
                self.hits += 1;
                debug!(path = %path.display(), "Workbook cache hit");
                return Ok(Arc::clone(&entry.sheets));
            }
        }

        self.misses += 1;
        debug!(path = %path.display(), "Workbook cache miss");
        let sheets = Arc::new(WorkbookReader::new().read_sheets(path)?);
        self.entries.insert(
            path.to_path_buf(),
            CachedWorkbook {
                modified,
                sheets: Arc::clone(&sheets),
            },
        );
        Ok(sheets)
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }
}
