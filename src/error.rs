use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProcessingError>;

#[derive(Error, Debug)]
pub enum ProcessingError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Workbook file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("Spreadsheet error: {0}")]
    Excel(#[from] calamine::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parquet write error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error(
        "Could not discover {} column(s); searched headers: [{}]",
        missing.join(", "),
        available.join(", ")
    )]
    SchemaDiscovery {
        missing: Vec<String>,
        available: Vec<String>,
    },

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Chart rendering error: {0}")]
    Render(String),
}

impl ProcessingError {
    /// Missing-input errors are reported to the user rather than treated as bugs.
    pub fn is_missing_file(&self) -> bool {
        matches!(self, ProcessingError::MissingFile { .. })
    }
}
