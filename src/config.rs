use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;
use validator::Validate;

use crate::error::Result;
use crate::utils::constants::{
    COMPRESSION_SNAPPY, DEFAULT_CHART_HEIGHT, DEFAULT_CHART_WIDTH, DEFAULT_CONFIG_FILE,
    DEFAULT_OUTPUT_DIR, DEFAULT_PRIMARY_WORKBOOK, DEFAULT_TARGET_YEAR, ENV_PREFIX, SECTOR_COLUMN,
    YEAR_COLUMN,
};
use crate::writers::ChartFormat;

/// Runtime settings: built-in defaults, then `ghg.toml` (or an explicit
/// file), then `GHG_*` environment variables, then command-line flags.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Settings {
    pub primary_workbook: PathBuf,

    pub secondary_workbook: Option<PathBuf>,

    #[validate(range(min = 1900, max = 2100))]
    pub default_year: i32,

    pub output_dir: PathBuf,

    #[validate(range(min = 200, max = 8000))]
    pub chart_width: u32,

    #[validate(range(min = 150, max = 8000))]
    pub chart_height: u32,

    pub chart_format: ChartFormat,

    #[validate(length(min = 1))]
    pub year_column: String,

    #[validate(length(min = 1))]
    pub sector_column: String,

    #[validate(length(min = 1))]
    pub compression: String,
}

/// Values given on the command line; `None` leaves the layered value alone.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub primary_workbook: Option<PathBuf>,
    pub secondary_workbook: Option<PathBuf>,
    pub default_year: Option<i32>,
    pub output_dir: Option<PathBuf>,
}

impl Settings {
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("primary_workbook", DEFAULT_PRIMARY_WORKBOOK)?
            .set_default("default_year", DEFAULT_TARGET_YEAR as i64)?
            .set_default("output_dir", DEFAULT_OUTPUT_DIR)?
            .set_default("chart_width", DEFAULT_CHART_WIDTH as i64)?
            .set_default("chart_height", DEFAULT_CHART_HEIGHT as i64)?
            .set_default("chart_format", "svg")?
            .set_default("year_column", YEAR_COLUMN)?
            .set_default("sector_column", SECTOR_COLUMN)?
            .set_default("compression", COMPRESSION_SNAPPY)?;

        builder = match config_path {
            Some(path) => {
                debug!(path = %path.display(), "Loading configuration file");
                builder.add_source(File::from(path))
            }
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let settings: Settings = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Apply command-line values and re-validate.
    pub fn with_overrides(mut self, overrides: SettingsOverrides) -> Result<Self> {
        if let Some(path) = overrides.primary_workbook {
            self.primary_workbook = path;
        }
        if let Some(path) = overrides.secondary_workbook {
            self.secondary_workbook = Some(path);
        }
        if let Some(year) = overrides.default_year {
            self.default_year = year;
        }
        if let Some(dir) = overrides.output_dir {
            self.output_dir = dir;
        }
        self.validate()?;
        Ok(self)
    }
}
