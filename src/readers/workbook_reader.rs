use calamine::{open_workbook_auto, Data, Range, Reader};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::models::CellValue;

/// One worksheet: a header row and rectangular data rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetTable {
    /// Build from a header row and data rows; rows are padded or cut to the
    /// header width and header cells are trimmed.
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let headers: Vec<String> = headers
            .into_iter()
            .enumerate()
            .map(|(idx, h)| {
                let h = h.trim();
                if h.is_empty() {
                    format!("column_{}", idx + 1)
                } else {
                    h.to_string()
                }
            })
            .collect();
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, CellValue::Empty);
                row
            })
            .collect();

        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// First header equal to `name` after trimming.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.headers.iter().position(|h| h == name)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn from_range(name: &str, range: &Range<Data>) -> Self {
        let mut rows = range.rows();
        let headers = match rows.next() {
            Some(header_row) => header_row
                .iter()
                .map(|cell| cell_from_data(cell).to_trimmed_string())
                .collect(),
            None => Vec::new(),
        };
        let body = rows
            .filter(|row| row.iter().any(|c| !matches!(c, Data::Empty)))
            .map(|row| row.iter().map(cell_from_data).collect())
            .collect();

        Self::new(name, headers, body)
    }
}

/// Convert a calamine cell into the backend-independent cell model.
pub fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
        _ => CellValue::Empty,
    }
}

pub struct WorkbookReader;

impl WorkbookReader {
    pub fn new() -> Self {
        Self
    }

    /// Read every worksheet of the workbook at `path`, in workbook order.
    pub fn read_sheets(&self, path: &Path) -> Result<Vec<SheetTable>> {
        if !path.exists() {
            return Err(ProcessingError::MissingFile {
                path: path.to_path_buf(),
            });
        }

        let mut workbook = open_workbook_auto(path)?;
        let sheet_names = workbook.sheet_names().to_vec();
        if sheet_names.is_empty() {
            return Err(ProcessingError::InvalidFormat(format!(
                "workbook {} has no worksheets",
                path.display()
            )));
        }

        let mut sheets = Vec::with_capacity(sheet_names.len());
        for sheet_name in &sheet_names {
            let range = workbook.worksheet_range(sheet_name)?;
            let sheet = SheetTable::from_range(sheet_name, &range);
            debug!(
                sheet = %sheet_name,
                rows = sheet.row_count(),
                columns = sheet.headers.len(),
                "Read worksheet"
            );
            sheets.push(sheet);
        }

        Ok(sheets)
    }
}

impl Default for WorkbookReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Stack sheets on top of each other, aligning columns by header name.
/// Columns appear in first-seen order; cells a sheet does not have are empty.
pub fn concat_sheets(name: &str, sheets: &[SheetTable]) -> SheetTable {
    let mut headers: Vec<String> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for sheet in sheets {
        for header in &sheet.headers {
            if !positions.contains_key(header) {
                positions.insert(header.clone(), headers.len());
                headers.push(header.clone());
            }
        }
    }

    let mut rows = Vec::with_capacity(sheets.iter().map(SheetTable::row_count).sum());
    for sheet in sheets {
        // Duplicate headers inside one sheet keep the first occurrence
        let mut mapping: Vec<Option<usize>> = Vec::with_capacity(sheet.headers.len());
        let mut seen = vec![false; headers.len()];
        for header in &sheet.headers {
            let target = positions[header];
            if seen[target] {
                mapping.push(None);
            } else {
                seen[target] = true;
                mapping.push(Some(target));
            }
        }

        for row in &sheet.rows {
            let mut combined = vec![CellValue::Empty; headers.len()];
            for (cell, target) in row.iter().zip(&mapping) {
                if let Some(target) = target {
                    combined[*target] = cell.clone();
                }
            }
            rows.push(combined);
        }
    }

    SheetTable {
        name: name.to_string(),
        headers,
        rows,
    }
}
