use ghg_processor::cli::{run_session, ExploreSession, SelectionArgs};
use ghg_processor::config::{Settings, SettingsOverrides};
use ghg_processor::dashboard::{Dashboard, NationalSource, NoticeKind, ViewOutcome};
use ghg_processor::models::{RegionFilter, Sector, SectorFilter, Selection};
use ghg_processor::processors::{
    sector_snapshot, trend, IntegrityChecker, Normalizer,
};
use ghg_processor::readers::{EmissionsReader, WorkbookCache};
use ghg_processor::writers::{CsvWriter, ParquetWriter};
use ghg_processor::{ProcessingError, Result};
use pretty_assertions::assert_eq;
use rust_xlsxwriter::Workbook;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const REF: &str = "Reference Case";
const ADD: &str = "Additional Measures Case";

enum Cell {
    S(&'static str),
    N(f64),
}

use Cell::{N, S};

fn write_workbook(path: &Path, sheets: &[(&str, Vec<Vec<Cell>>)]) {
    let mut workbook = Workbook::new();
    for (name, rows) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name).unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                match cell {
                    S(text) => worksheet.write_string(r as u32, c as u16, *text).unwrap(),
                    N(value) => worksheet.write_number(r as u32, c as u16, *value).unwrap(),
                };
            }
        }
    }
    workbook.save(path).unwrap();
}

fn primary_workbook(dir: &Path) -> PathBuf {
    let path = dir.join("provincial.xlsx");
    let header = || vec![S("Year"), S("Economic Sector"), S(REF), S(ADD)];
    write_workbook(
        &path,
        &[
            (
                "Ontario",
                vec![
                    header(),
                    vec![N(2030.0), S("Agriculture"), N(10.0), N(7.0)],
                    vec![N(2030.0), S("Totals"), N(100.0), N(90.0)],
                    vec![N(2035.0), S("Agriculture"), N(9.0), N(6.0)],
                ],
            ),
            (
                "Quebec",
                vec![
                    header(),
                    vec![N(2030.0), S("Agriculture"), N(5.0), N(4.0)],
                    vec![S("N/A"), S("Buildings"), N(3.0), S("n/a")],
                ],
            ),
            ("Notes", vec![vec![S("Source")], vec![S("ECCC projections")]]),
        ],
    );
    path
}

fn national_workbook(dir: &Path, year_header: &'static str) -> PathBuf {
    let path = dir.join("national.xlsx");
    let header = || vec![S(year_header), S("Scenario"), S("Sector"), S("Emissions (Mt)")];
    write_workbook(
        &path,
        &[
            (
                "Detailed",
                vec![
                    header(),
                    vec![N(2030.0), S("Reference Case (Detailed)"), S("Total"), N(650.0)],
                    vec![N(2030.0), S("Reference Case (Detailed)"), S("Buildings"), N(80.0)],
                ],
            ),
            (
                "Summary",
                vec![
                    header(),
                    vec![N(2030.0), S("Additional Measures scenario summary"), S("Total"), N(600.0)],
                ],
            ),
        ],
    );
    path
}

fn settings_for(dir: &Path, primary: PathBuf, national: Option<PathBuf>) -> Settings {
    let config = dir.join("ghg.toml");
    std::fs::write(&config, "").unwrap();
    Settings::load(Some(&config))
        .unwrap()
        .with_overrides(SettingsOverrides {
            primary_workbook: Some(primary),
            secondary_workbook: national,
            default_year: None,
            output_dir: Some(dir.join("output")),
        })
        .unwrap()
}

fn load(path: &Path) -> ghg_processor::models::EmissionTable {
    let (rows, _report) = EmissionsReader::new().read_workbook(path).unwrap();
    Normalizer::new().normalize(rows)
}

#[test]
fn test_reshape_tags_regions_and_skips_sheets_without_id_columns() {
    let dir = TempDir::new().unwrap();
    let path = primary_workbook(dir.path());

    let (rows, report) = EmissionsReader::new().read_workbook(&path).unwrap();

    assert_eq!(report.sheets_read, vec!["Ontario", "Quebec"]);
    assert_eq!(report.sheets_skipped, vec!["Notes"]);
    assert_eq!(rows.len(), 3 * 2 + 2 * 2);
    assert_eq!(rows.iter().filter(|r| r.region == "Ontario").count(), 6);
    assert_eq!(rows.iter().filter(|r| r.region == "Quebec").count(), 4);
}

#[test]
fn test_coercion_turns_text_into_nulls() {
    let dir = TempDir::new().unwrap();
    let table = load(&primary_workbook(dir.path()));

    let buildings: Vec<_> = table
        .records()
        .iter()
        .filter(|r| r.sector == "Buildings")
        .collect();
    assert_eq!(buildings.len(), 2);
    assert!(buildings.iter().all(|r| r.year.is_none()));
    let additional = buildings.iter().find(|r| r.scenario == ADD).unwrap();
    assert_eq!(additional.emissions, None);

    let report = IntegrityChecker::new().check_integrity(&table);
    assert_eq!(report.null_years, 2);
    assert_eq!(report.null_emissions, 1);
    assert_eq!(report.unknown_sectors, vec!["Totals"]);
}

#[test]
fn test_totals_only_reach_unrestricted_views() {
    let dir = TempDir::new().unwrap();
    let table = load(&primary_workbook(dir.path()));
    let selection = Selection::new(REF, 2030);

    let snapshot = sector_snapshot(&table, &selection);
    assert!(snapshot.iter().all(|row| row.sector == Sector::Agriculture));
    assert_eq!(snapshot[0].emissions, 15.0);

    let totals = trend(&table, &selection.clone().with_sector(SectorFilter::Only("Totals".into())));
    assert_eq!(totals.len(), 1);
    assert_eq!(totals[0].emissions, 100.0);
}

#[test]
fn test_trend_sums_regions() {
    let dir = TempDir::new().unwrap();
    let table = load(&primary_workbook(dir.path()));
    let selection =
        Selection::new(REF, 2030).with_sector(SectorFilter::Only("Agriculture".to_string()));

    let rows = trend(&table, &selection);

    assert_eq!(rows.len(), 2);
    assert_eq!((rows[0].year, rows[0].emissions), (2030, 15.0));
    assert_eq!((rows[1].year, rows[1].emissions), (2035, 9.0));
}

#[test]
fn test_dashboard_delta_and_national_trend() {
    let dir = TempDir::new().unwrap();
    let table = load(&primary_workbook(dir.path()));
    let national = national_workbook(dir.path(), "Year");
    let selection = Selection::new(REF, 2030).with_region(RegionFilter::Only("Ontario".into()));

    let dashboard = Dashboard::build(&table, &selection, NationalSource::load(Some(&national)));

    assert_eq!(dashboard.ready_views(), 6);
    let grid = dashboard.scenario_delta.data().unwrap();
    assert_eq!(grid.get(Sector::Agriculture, 2030), Some(-3.0));
    assert_eq!(grid.get(Sector::Agriculture, 2035), Some(-3.0));

    let points = dashboard.national_trend.data().unwrap();
    assert_eq!(points.len(), 2);
    assert_eq!(points[0].scenario, ADD);
    assert_eq!(points[0].value, 600.0);
    assert_eq!(points[1].scenario, REF);
    assert_eq!(points[1].value, 650.0);

    let regions = dashboard.region_snapshot.data().unwrap();
    assert_eq!(regions[0].region, "Ontario");
    assert_eq!(regions[0].emissions, 110.0);
}

#[test]
fn test_missing_year_header_only_disables_national_trend() {
    let dir = TempDir::new().unwrap();
    let table = load(&primary_workbook(dir.path()));
    let national = national_workbook(dir.path(), "Period");

    let dashboard = Dashboard::build(
        &table,
        &Selection::new(REF, 2030),
        NationalSource::load(Some(&national)),
    );

    assert!(matches!(dashboard.national_trend, ViewOutcome::Unavailable(_)));
    assert_eq!(dashboard.ready_views(), 5);
    let notice = dashboard
        .notices
        .iter()
        .find(|n| n.kind == NoticeKind::SchemaDiscovery)
        .unwrap();
    assert!(notice.message.contains("year"));
    assert!(notice.message.contains("Period"));
}

#[test]
fn test_normalization_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let table = load(&primary_workbook(dir.path()));

    let again = Normalizer::new().renormalize(&table);

    assert_eq!(again.records(), table.records());
}

#[test]
fn test_missing_primary_workbook_is_fatal() {
    let dir = TempDir::new().unwrap();
    let err = EmissionsReader::new()
        .read_workbook(&dir.path().join("absent.xlsx"))
        .unwrap_err();

    assert!(err.is_missing_file());
}

#[test]
fn test_export_roundtrip() -> Result<()> {
    let dir = TempDir::new()?;
    let table = load(&primary_workbook(dir.path()));

    let parquet_path = dir.path().join("emissions.parquet");
    let writer = ParquetWriter::new().with_compression("zstd")?;
    writer.write_table(&table, &parquet_path)?;
    assert_eq!(writer.read_table(&parquet_path)?.records(), table.records());
    assert_eq!(writer.get_file_info(&parquet_path)?.total_rows, 10);

    let csv_path = dir.path().join("emissions.csv");
    CsvWriter::new().write_table(&table, &csv_path)?;
    let content = std::fs::read_to_string(&csv_path)?;
    assert_eq!(content.lines().count(), 11);
    assert!(content.contains(",Buildings,Additional Measures Case,Quebec,"));
    Ok(())
}

#[test]
fn test_workbook_cache_reuses_unchanged_files() {
    let dir = TempDir::new().unwrap();
    let path = primary_workbook(dir.path());
    let mut cache = WorkbookCache::new();

    let first = cache.sheets(&path).unwrap();
    let second = cache.sheets(&path).unwrap();

    assert_eq!(first.len(), 3);
    assert!(std::sync::Arc::ptr_eq(&first, &second));
    assert_eq!((cache.hits(), cache.misses()), (1, 1));

    std::fs::remove_file(&path).unwrap();
    assert!(matches!(
        cache.sheets(&path),
        Err(ProcessingError::MissingFile { .. })
    ));
}

#[test]
fn test_explore_session_updates_selection() {
    let dir = TempDir::new().unwrap();
    let primary = primary_workbook(dir.path());
    let settings = settings_for(dir.path(), primary, None);

    let mut session = ExploreSession::start(settings, &SelectionArgs::default()).unwrap();
    assert_eq!(session.selection().scenario, ADD);
    assert_eq!(session.selection().year, 2030);

    let input = "region Ontario\nyear 2035\nregion Atlantis\nscenario Reference Case\nquit\nyear 2030\n";
    let mut out = Vec::new();
    run_session(&mut session, input.as_bytes(), &mut out).unwrap();
    let out = String::from_utf8(out).unwrap();

    let selection = session.selection();
    assert_eq!(selection.scenario, REF);
    assert_eq!(selection.region, RegionFilter::Only("Ontario".to_string()));
    assert_eq!(selection.year, 2035);
    assert!(out.contains("unknown region 'Atlantis'"));
    assert!(out.contains("Emissions by province"));

    // Start plus four redraws, each served from the cache after the first parse
    assert_eq!(session.cache().misses(), 1);
    assert_eq!(session.cache().hits(), 4);
}
