/// Primary workbook id columns
pub const YEAR_COLUMN: &str = "Year";
pub const SECTOR_COLUMN: &str = "Economic Sector";

/// Selector labels for the aggregate options
pub const ALL_REGIONS_LABEL: &str = "All provinces";
pub const ALL_SECTORS_LABEL: &str = "All sectors";

/// Scenario keywords used by the delta heatmap
pub const REFERENCE_KEYWORD: &str = "reference";
pub const ADDITIONAL_KEYWORD: &str = "additional";

/// Canonical scenario names
pub const REFERENCE_CASE: &str = "Reference Case";
pub const ADDITIONAL_MEASURES_CASE: &str = "Additional Measures Case";

/// Secondary workbook defaults
pub const DEFAULT_NATIONAL_SCENARIO: &str = "National total";
pub const TOTAL_TOKENS: &[&str] = &[
    "total",
    "totals",
    "grand total",
    "total emissions",
    "national total",
    "all sectors",
];

/// Year preselected when the workbook covers it
pub const DEFAULT_TARGET_YEAR: i32 = 2030;

/// File names
pub const DEFAULT_PRIMARY_WORKBOOK: &str = "Tab2_detailed_GHG_emissions_GES_detaillees_EN.xlsx";
pub const DEFAULT_CONFIG_FILE: &str = "ghg";
pub const ENV_PREFIX: &str = "GHG";

/// Output defaults
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_CHART_WIDTH: u32 = 1024;
pub const DEFAULT_CHART_HEIGHT: u32 = 640;
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
