use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::writers::ChartFormat;

#[derive(Parser)]
#[command(name = "ghg-processor")]
#[command(about = "Greenhouse-gas emissions projection workbook processor")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Suppress progress spinners")]
    pub quiet: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Configuration file [default: ghg.toml if present]")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Primary (provincial) workbook")]
    pub workbook: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Secondary (national summary) workbook")]
    pub national: Option<PathBuf>,

    #[arg(long, global = true, help = "Target year for the default selection [default: 2030]")]
    pub default_year: Option<i32>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Summarize the primary workbook: sheets, scenarios, regions, years, data quality
    Summary,

    /// Compute every view for a selection and print it
    Query {
        #[command(flatten)]
        selection: SelectionArgs,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Write chart files for a selection
    Render {
        #[command(flatten)]
        selection: SelectionArgs,

        #[arg(short, long, value_enum, help = "Chart format [default: from configuration]")]
        format: Option<ChartFormat>,

        #[arg(short, long, help = "Output directory [default: from configuration]")]
        output_dir: Option<PathBuf>,
    },

    /// Export the normalized long-format table
    Export {
        #[arg(
            short,
            long,
            help = "Output file path [default: <output_dir>/ghg-emissions-{YYMMDD}.{ext}]"
        )]
        output_file: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = ExportFormat::Parquet)]
        format: ExportFormat,

        #[arg(long, help = "Parquet compression [default: from configuration]")]
        compression: Option<String>,
    },

    /// Interactive session: change the selection and redraw the views
    Explore {
        #[command(flatten)]
        selection: SelectionArgs,
    },
}

/// Filter flags shared by the view commands. Unset flags fall back to the
/// default selection for the loaded table.
#[derive(Args, Debug, Clone, Default)]
pub struct SelectionArgs {
    #[arg(short, long, help = "Scenario [default: first in sorted order]")]
    pub scenario: Option<String>,

    #[arg(short, long, help = "Region name or 'all'")]
    pub region: Option<String>,

    #[arg(long, help = "Sector name or 'all'")]
    pub sector: Option<String>,

    #[arg(short, long, help = "Snapshot year [default: 2030 clamped to the data]")]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Parquet,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Parquet => "parquet",
            ExportFormat::Csv => "csv",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_arguments() {
        let cli = Cli::parse_from([
            "ghg-processor",
            "--workbook",
            "data.xlsx",
            "query",
            "--scenario",
            "Reference Case",
            "--region",
            "Ontario",
            "--year",
            "2035",
            "--format",
            "json",
        ]);

        assert_eq!(cli.workbook, Some(PathBuf::from("data.xlsx")));
        match cli.command {
            Commands::Query { selection, format } => {
                assert_eq!(selection.scenario.as_deref(), Some("Reference Case"));
                assert_eq!(selection.region.as_deref(), Some("Ontario"));
                assert_eq!(selection.sector, None);
                assert_eq!(selection.year, Some(2035));
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("expected query"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["ghg-processor", "export", "--format", "csv", "-v", "-q"]);
        assert!(cli.verbose);
        assert!(cli.quiet);
        assert!(matches!(
            cli.command,
            Commands::Export {
                format: ExportFormat::Csv,
                ..
            }
        ));
    }

    #[test]
    fn test_default_year_flag() {
        let cli = Cli::parse_from(["ghg-processor", "summary", "--default-year", "2035"]);
        assert_eq!(cli.default_year, Some(2035));

        let cli = Cli::parse_from(["ghg-processor", "summary"]);
        assert_eq!(cli.default_year, None);
    }

    #[test]
    fn test_render_format() {
        let cli = Cli::parse_from(["ghg-processor", "render", "--format", "png"]);
        match cli.command {
            Commands::Render { format, output_dir, .. } => {
                assert_eq!(format, Some(ChartFormat::Png));
                assert_eq!(output_dir, None);
            }
            _ => panic!("expected render"),
        }
    }
}
