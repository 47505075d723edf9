use std::io::{self, Write};
use tracing::{debug, info};

use crate::cli::args::{Cli, Commands, ExportFormat, OutputFormat, SelectionArgs};
use crate::cli::explore::{run_session, ExploreSession};
use crate::config::{Settings, SettingsOverrides};
use crate::dashboard::{Dashboard, NationalSource};
use crate::error::Result;
use crate::models::{EmissionTable, RegionFilter, SectorFilter, Selection};
use crate::processors::{IntegrityChecker, Normalizer};
use crate::readers::{EmissionsReader, LoadReport};
use crate::utils::filename::generate_default_export_filename;
use crate::utils::progress::ProgressReporter;
use crate::writers::{ChartWriter, CsvWriter, ParquetWriter};

pub fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?.with_overrides(overrides_from(&cli))?;
    debug!(?settings, "Resolved settings");

    match cli.command {
        Commands::Summary => {
            let (table, report) = load_table(&settings, cli.quiet)?;
            println!("{}", report.summary());

            let checker = IntegrityChecker::new();
            let integrity = checker.check_integrity(&table);
            println!("\n{}", checker.generate_summary(&integrity));
            println!("Sectors: {}", table.sectors().join(", "));

            let selection = Selection::default_for(&table, settings.default_year)?;
            println!("Default selection: {}", selection);
        }

        Commands::Query { selection, format } => {
            let silent = cli.quiet || format == OutputFormat::Json;
            let (table, _report) = load_table(&settings, silent)?;
            let selection = resolve_selection(&selection, &table, settings.default_year)?;

            let national = NationalSource::load(settings.secondary_workbook.as_deref());
            let dashboard = Dashboard::build(&table, &selection, national);

            match format {
                OutputFormat::Table => println!("{}", dashboard.text_report()),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&dashboard)?),
            }
        }

        Commands::Render {
            selection, format, ..
        } => {
            let (table, _report) = load_table(&settings, cli.quiet)?;
            let selection = resolve_selection(&selection, &table, settings.default_year)?;

            let national = NationalSource::load(settings.secondary_workbook.as_deref());
            let dashboard = Dashboard::build(&table, &selection, national);

            let writer = ChartWriter::new(format.unwrap_or(settings.chart_format))
                .with_size(settings.chart_width, settings.chart_height);
            let progress = ProgressReporter::new_spinner("Rendering charts...", cli.quiet);
            let summary = writer.render_dashboard(&dashboard, &settings.output_dir)?;
            progress.finish_with_message(&format!("Rendered {} chart(s)", summary.written.len()));

            for path in &summary.written {
                println!("Wrote {}", path.display());
            }
            for (view, error) in &summary.failed {
                println!("⚠️  {} not rendered: {}", view, error);
            }
            for notice in &dashboard.notices {
                println!("{}", notice);
            }
            println!("Charts written to {}", settings.output_dir.display());
        }

        Commands::Export {
            output_file,
            format,
            compression,
        } => {
            let (table, _report) = load_table(&settings, cli.quiet)?;
            let output_file = output_file.unwrap_or_else(|| {
                generate_default_export_filename(&settings.output_dir, format.extension())
            });
            if let Some(parent) = output_file.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }

            println!(
                "Writing {} records to {}...",
                table.len(),
                output_file.display()
            );
            match format {
                ExportFormat::Parquet => {
                    let compression = compression.as_deref().unwrap_or(&settings.compression);
                    let writer = ParquetWriter::new().with_compression(compression)?;
                    writer.write_table(&table, &output_file)?;
                    println!("\n{}", writer.get_file_info(&output_file)?.summary());
                }
                ExportFormat::Csv => CsvWriter::new().write_table(&table, &output_file)?,
            }
            println!("Export complete!");
        }

        Commands::Explore { selection } => {
            let mut session = ExploreSession::start(settings, &selection)?;
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            run_session(&mut session, stdin.lock(), &mut stdout)?;
            stdout.flush()?;
        }
    }

    Ok(())
}

/// Command-line values that take precedence over the layered settings.
pub fn overrides_from(cli: &Cli) -> SettingsOverrides {
    let output_dir = match &cli.command {
        Commands::Render { output_dir, .. } => output_dir.clone(),
        _ => None,
    };
    SettingsOverrides {
        primary_workbook: cli.workbook.clone(),
        secondary_workbook: cli.national.clone(),
        default_year: cli.default_year,
        output_dir,
    }
}

/// Load and normalize the primary workbook. A missing file is fatal.
pub fn load_table(settings: &Settings, silent: bool) -> Result<(EmissionTable, LoadReport)> {
    let path = &settings.primary_workbook;
    let progress = ProgressReporter::new_spinner(&format!("Loading {}...", path.display()), silent);

    let reader = EmissionsReader::with_id_columns(&settings.year_column, &settings.sector_column);
    let (rows, report) = reader.read_workbook(path)?;
    progress.set_message("Normalizing...");
    let table = Normalizer::new().normalize(rows);

    progress.finish_and_clear();
    info!(records = table.len(), "Emissions table ready");
    Ok((table, report))
}

/// Start from the default selection and apply any flags, rejecting names
/// and years the table does not contain.
pub fn resolve_selection(
    args: &SelectionArgs,
    table: &EmissionTable,
    default_year: i32,
) -> Result<Selection> {
    let mut selection = Selection::default_for(table, default_year)?;
    if let Some(scenario) = &args.scenario {
        selection = selection.with_scenario(scenario.trim());
    }
    if let Some(region) = &args.region {
        selection = selection.with_region(RegionFilter::parse(region));
    }
    if let Some(sector) = &args.sector {
        selection = selection.with_sector(SectorFilter::parse(sector));
    }
    if let Some(year) = args.year {
        selection = selection.with_year(year);
    }
    selection.validate_against(table)?;
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingError;
    use crate::models::EmissionRecord;

    fn table() -> EmissionTable {
        EmissionTable::new(vec![
            EmissionRecord::new(Some(2025), "Agriculture", "Reference Case", "Ontario", Some(1.0)),
            EmissionRecord::new(Some(2035), "Buildings", "Additional Measures Case", "Quebec", Some(2.0)),
        ])
    }

    #[test]
    fn test_resolve_defaults() {
        let selection = resolve_selection(&SelectionArgs::default(), &table(), 2030).unwrap();
        assert_eq!(selection.scenario, "Additional Measures Case");
        assert_eq!(selection.region, RegionFilter::All);
        assert_eq!(selection.sector, SectorFilter::All);
        assert_eq!(selection.year, 2030);
    }

    #[test]
    fn test_resolve_applies_flags() {
        let args = SelectionArgs {
            scenario: Some(" Reference Case ".to_string()),
            region: Some("Ontario".to_string()),
            sector: Some("all".to_string()),
            year: Some(2035),
        };
        let selection = resolve_selection(&args, &table(), 2030).unwrap();
        assert_eq!(selection.scenario, "Reference Case");
        assert_eq!(selection.region, RegionFilter::Only("Ontario".to_string()));
        assert_eq!(selection.sector, SectorFilter::All);
        assert_eq!(selection.year, 2035);
    }

    #[test]
    fn test_overrides_carry_default_year_and_output_dir() {
        use clap::Parser;

        let cli = Cli::parse_from([
            "ghg-processor",
            "--default-year",
            "2035",
            "render",
            "--output-dir",
            "charts",
        ]);
        let overrides = overrides_from(&cli);

        assert_eq!(overrides.default_year, Some(2035));
        assert_eq!(overrides.output_dir, Some(std::path::PathBuf::from("charts")));
        assert_eq!(overrides.primary_workbook, None);
    }

    #[test]
    fn test_resolve_rejects_unknown_region() {
        let args = SelectionArgs {
            region: Some("Atlantis".to_string()),
            ..Default::default()
        };
        let err = resolve_selection(&args, &table(), 2030).unwrap_err();
        assert!(matches!(err, ProcessingError::InvalidSelection(_)));
        assert!(err.to_string().contains("Ontario, Quebec"));
    }
}
