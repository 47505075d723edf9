use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

use crate::error::ProcessingError;
use crate::models::{
    DeltaGrid, EmissionTable, NationalTrendPoint, RegionTotal, SectorTotal, SectorYearTotal,
    Selection, YearTotal,
};
use crate::processors::{
    region_snapshot, scenario_delta, sector_breakdown, sector_snapshot, trend,
    NationalSummaryProcessor,
};
use crate::readers::{NationalReader, SheetTable, WorkbookCache};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Trend,
    SectorBreakdown,
    SectorSnapshot,
    RegionSnapshot,
    ScenarioDelta,
    NationalTrend,
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            View::Trend => "Total emissions trend",
            View::SectorBreakdown => "Emissions by sector over time",
            View::SectorSnapshot => "Emissions by sector",
            View::RegionSnapshot => "Emissions by province",
            View::ScenarioDelta => "Additional measures vs reference",
            View::NationalTrend => "National emissions by scenario",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    MissingFile,
    SchemaDiscovery,
    EmptyResult,
    ParsingFailure,
}

/// A user-visible message about a degraded or empty view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub view: View,
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn is_warning(&self) -> bool {
        self.kind != NoticeKind::EmptyResult
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.is_warning() { "⚠️ " } else { "ℹ️ " };
        write!(f, "{} {}: {}", marker, self.view, self.message)
    }
}

/// Result of one view. Only `Ready` carries data; the other states are
/// reported through a matching [`Notice`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum ViewOutcome<T> {
    Ready(T),
    NoData,
    Unavailable(String),
    Failed(String),
}

impl<T> ViewOutcome<T> {
    pub fn data(&self) -> Option<&T> {
        match self {
            ViewOutcome::Ready(data) => Some(data),
            _ => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ViewOutcome::Ready(_))
    }
}

/// What is known about the secondary workbook before the dashboard is built.
#[derive(Debug)]
pub enum NationalSource {
    NotConfigured,
    Loaded(SheetTable),
    Error(ProcessingError),
}

impl NationalSource {
    pub fn load(path: Option<&Path>) -> Self {
        match path {
            None => NationalSource::NotConfigured,
            Some(path) => match NationalReader::new().read_combined(path) {
                Ok(frame) => NationalSource::Loaded(frame),
                Err(e) => NationalSource::Error(e),
            },
        }
    }

    pub fn load_cached(path: Option<&Path>, cache: &mut WorkbookCache) -> Self {
        match path {
            None => NationalSource::NotConfigured,
            Some(path) => match cache.sheets(path) {
                Ok(sheets) => NationalSource::Loaded(NationalReader::new().combine(&sheets)),
                Err(e) => NationalSource::Error(e),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub selection: Selection,
    pub trend: ViewOutcome<Vec<YearTotal>>,
    pub sector_breakdown: ViewOutcome<Vec<SectorYearTotal>>,
    pub sector_snapshot: ViewOutcome<Vec<SectorTotal>>,
    pub region_snapshot: ViewOutcome<Vec<RegionTotal>>,
    pub scenario_delta: ViewOutcome<DeltaGrid>,
    pub national_trend: ViewOutcome<Vec<NationalTrendPoint>>,
    pub notices: Vec<Notice>,
}

impl Dashboard {
    /// Compute every view for `selection`. A failing view never prevents
    /// the others from being produced.
    pub fn build(table: &EmissionTable, selection: &Selection, national: NationalSource) -> Self {
        let mut notices = Vec::new();

        let trend = rows_outcome(View::Trend, trend(table, selection), &mut notices);
        let sector_breakdown = rows_outcome(
            View::SectorBreakdown,
            sector_breakdown(table, selection),
            &mut notices,
        );
        let sector_snapshot = rows_outcome(
            View::SectorSnapshot,
            sector_snapshot(table, selection),
            &mut notices,
        );
        let region_snapshot = rows_outcome(
            View::RegionSnapshot,
            region_snapshot(table, selection),
            &mut notices,
        );

        let scenario_delta = match scenario_delta(table, selection) {
            Ok(grid) if grid.is_empty() => {
                push_notice(&mut notices, View::ScenarioDelta, NoticeKind::EmptyResult, "no data for the current filter");
                ViewOutcome::NoData
            }
            Ok(grid) => ViewOutcome::Ready(grid),
            Err(unavailable) => {
                let message = unavailable.to_string();
                push_notice(&mut notices, View::ScenarioDelta, NoticeKind::SchemaDiscovery, &message);
                ViewOutcome::Unavailable(message)
            }
        };

        let national_trend = national_outcome(national, &mut notices);

        Self {
            selection: selection.clone(),
            trend,
            sector_breakdown,
            sector_snapshot,
            region_snapshot,
            scenario_delta,
            national_trend,
            notices,
        }
    }

    pub fn ready_views(&self) -> usize {
        [
            self.trend.is_ready(),
            self.sector_breakdown.is_ready(),
            self.sector_snapshot.is_ready(),
            self.region_snapshot.is_ready(),
            self.scenario_delta.is_ready(),
            self.national_trend.is_ready(),
        ]
        .iter()
        .filter(|ready| **ready)
        .count()
    }

    /// Plain-text rendering of every view for the terminal.
    pub fn text_report(&self) -> String {
        let mut out = String::new();
        let selection = &self.selection;

        out.push_str(&format!("Selection: {}\n", selection));

        out.push_str(&format!(
            "\n{} ({} / {} / {}):\n",
            View::Trend,
            selection.scenario,
            selection.region,
            selection.sector
        ));
        if let Some(rows) = self.trend.data() {
            for row in rows {
                out.push_str(&format!("  {:>6}  {:>12.2}\n", row.year, row.emissions));
            }
        } else {
            out.push_str(&outcome_line(&self.trend));
        }

        out.push_str(&format!(
            "\n{} ({} / {}):\n",
            View::SectorBreakdown,
            selection.scenario,
            selection.region
        ));
        if let Some(rows) = self.sector_breakdown.data() {
            for row in rows {
                out.push_str(&format!(
                    "  {:>6}  {:<20} {:>12.2}\n",
                    row.year,
                    row.sector.label(),
                    row.emissions
                ));
            }
        } else {
            out.push_str(&outcome_line(&self.sector_breakdown));
        }

        out.push_str(&format!(
            "\n{} ({} / {} / {}):\n",
            View::SectorSnapshot,
            selection.scenario,
            selection.region,
            selection.year
        ));
        if let Some(rows) = self.sector_snapshot.data() {
            for row in rows {
                out.push_str(&format!("  {:<20} {:>12.2}\n", row.sector.label(), row.emissions));
            }
        } else {
            out.push_str(&outcome_line(&self.sector_snapshot));
        }

        out.push_str(&format!(
            "\n{} ({} / {}):\n",
            View::RegionSnapshot,
            selection.scenario,
            selection.year
        ));
        if let Some(rows) = self.region_snapshot.data() {
            for row in rows {
                out.push_str(&format!("  {:<28} {:>12.2}\n", row.region, row.emissions));
            }
        } else {
            out.push_str(&outcome_line(&self.region_snapshot));
        }

        out.push_str(&format!("\n{} ({}):\n", View::ScenarioDelta, selection.region));
        if let Some(grid) = self.scenario_delta.data() {
            out.push_str(&format!(
                "  {} minus {}\n",
                grid.additional_scenario, grid.reference_scenario
            ));
            out.push_str(&format!("  {:<20}", "Sector"));
            for year in &grid.years {
                out.push_str(&format!(" {:>8}", year));
            }
            out.push('\n');
            for (sector, row) in grid.sectors.iter().zip(&grid.cells) {
                out.push_str(&format!("  {:<20}", sector.label()));
                for cell in row {
                    match cell {
                        Some(delta) => out.push_str(&format!(" {:>8.2}", delta)),
                        None => out.push_str(&format!(" {:>8}", "-")),
                    }
                }
                out.push('\n');
            }
        } else {
            out.push_str(&outcome_line(&self.scenario_delta));
        }

        out.push_str(&format!("\n{}:\n", View::NationalTrend));
        if let Some(points) = self.national_trend.data() {
            for point in points {
                out.push_str(&format!(
                    "  {:<28} {:<18} {:>6} {:>12.2}\n",
                    point.scenario,
                    point.detail_type.label(),
                    point.year,
                    point.value
                ));
            }
        } else {
            out.push_str(&outcome_line(&self.national_trend));
        }

        if !self.notices.is_empty() {
            out.push_str("\nNotices:\n");
            for notice in &self.notices {
                out.push_str(&format!("  {}\n", notice));
            }
        }

        out
    }
}

fn push_notice(notices: &mut Vec<Notice>, view: View, kind: NoticeKind, message: &str) {
    let notice = Notice {
        view,
        kind,
        message: message.to_string(),
    };
    if notice.is_warning() {
        warn!(view = ?view, kind = ?kind, "{}", message);
    } else {
        info!(view = ?view, "{}", message);
    }
    notices.push(notice);
}

fn rows_outcome<T>(view: View, rows: Vec<T>, notices: &mut Vec<Notice>) -> ViewOutcome<Vec<T>> {
    if rows.is_empty() {
        push_notice(notices, view, NoticeKind::EmptyResult, "no data for the current filter");
        ViewOutcome::NoData
    } else {
        ViewOutcome::Ready(rows)
    }
}

fn national_outcome(
    national: NationalSource,
    notices: &mut Vec<Notice>,
) -> ViewOutcome<Vec<NationalTrendPoint>> {
    let view = View::NationalTrend;
    let frame = match national {
        NationalSource::NotConfigured => {
            let message = "no national summary workbook configured";
            push_notice(notices, view, NoticeKind::MissingFile, message);
            return ViewOutcome::Unavailable(message.to_string());
        }
        NationalSource::Error(e @ ProcessingError::MissingFile { .. }) => {
            let message = e.to_string();
            push_notice(notices, view, NoticeKind::MissingFile, &message);
            return ViewOutcome::Unavailable(message);
        }
        NationalSource::Error(e) => {
            let message = e.to_string();
            push_notice(notices, view, NoticeKind::ParsingFailure, &message);
            return ViewOutcome::Failed(message);
        }
        NationalSource::Loaded(frame) => frame,
    };

    match NationalSummaryProcessor::new().process(&frame) {
        Ok(points) => rows_outcome(view, points, notices),
        Err(e @ ProcessingError::SchemaDiscovery { .. }) => {
            let message = e.to_string();
            push_notice(notices, view, NoticeKind::SchemaDiscovery, &message);
            ViewOutcome::Unavailable(message)
        }
        Err(e) => {
            let message = e.to_string();
            push_notice(notices, view, NoticeKind::ParsingFailure, &message);
            ViewOutcome::Failed(message)
        }
    }
}

fn outcome_line<T>(outcome: &ViewOutcome<T>) -> String {
    match outcome {
        ViewOutcome::Ready(_) => String::new(),
        ViewOutcome::NoData => "  (no data for the current filter)\n".to_string(),
        ViewOutcome::Unavailable(reason) => format!("  (unavailable: {})\n", reason),
        ViewOutcome::Failed(reason) => format!("  (failed: {})\n", reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CellValue, EmissionRecord, RegionFilter};

    const REF: &str = "Reference Case";
    const ADD: &str = "Additional Measures Case";

    fn table() -> EmissionTable {
        EmissionTable::new(vec![
            EmissionRecord::new(Some(2030), "Agriculture", REF, "Ontario", Some(10.0)),
            EmissionRecord::new(Some(2030), "Agriculture", ADD, "Ontario", Some(7.0)),
            EmissionRecord::new(Some(2030), "Agriculture", REF, "Quebec", Some(5.0)),
        ])
    }

    fn national_frame(headers: &[&str]) -> SheetTable {
        SheetTable::new(
            "national",
            headers.iter().map(|s| s.to_string()).collect(),
            vec![vec![
                CellValue::Number(2030.0),
                CellValue::text("Reference Case"),
                CellValue::Number(650.0),
            ]],
        )
    }

    #[test]
    fn test_all_views_ready() {
        let national = NationalSource::Loaded(national_frame(&["Year", "Scenario", "Emissions"]));
        let dashboard = Dashboard::build(&table(), &Selection::new(REF, 2030), national);

        assert_eq!(dashboard.ready_views(), 6);
        assert!(dashboard.notices.is_empty());
        assert_eq!(dashboard.trend.data().unwrap()[0].emissions, 15.0);
        assert_eq!(dashboard.region_snapshot.data().unwrap()[0].region, "Ontario");
    }

    #[test]
    fn test_missing_year_column_only_disables_national_trend() {
        let national = NationalSource::Loaded(national_frame(&["Period", "Scenario", "Emissions"]));
        let dashboard = Dashboard::build(&table(), &Selection::new(REF, 2030), national);

        assert!(matches!(dashboard.national_trend, ViewOutcome::Unavailable(_)));
        assert!(dashboard.trend.is_ready());
        assert!(dashboard.sector_breakdown.is_ready());
        assert!(dashboard.sector_snapshot.is_ready());
        assert!(dashboard.region_snapshot.is_ready());

        assert_eq!(dashboard.notices.len(), 1);
        let notice = &dashboard.notices[0];
        assert_eq!(notice.kind, NoticeKind::SchemaDiscovery);
        assert!(notice.message.contains("Period"));
        assert!(notice.is_warning());
    }

    #[test]
    fn test_missing_secondary_file_is_a_warning() {
        let national = NationalSource::load(Some(Path::new("missing/national.xlsx")));
        let dashboard = Dashboard::build(&table(), &Selection::new(REF, 2030), national);

        assert!(matches!(dashboard.national_trend, ViewOutcome::Unavailable(_)));
        assert_eq!(dashboard.notices[0].kind, NoticeKind::MissingFile);
        assert_eq!(dashboard.ready_views(), 5);
    }

    #[test]
    fn test_empty_filter_is_reported_as_no_data() {
        let selection = Selection::new(REF, 2030).with_region(RegionFilter::Only("Nunavut".to_string()));
        let dashboard = Dashboard::build(&table(), &selection, NationalSource::NotConfigured);

        assert_eq!(dashboard.trend, ViewOutcome::NoData);
        assert_eq!(dashboard.sector_breakdown, ViewOutcome::NoData);
        assert_eq!(dashboard.scenario_delta, ViewOutcome::NoData);
        // The region snapshot ignores the region filter
        assert!(dashboard.region_snapshot.is_ready());

        let empty_notices = dashboard
            .notices
            .iter()
            .filter(|n| n.kind == NoticeKind::EmptyResult)
            .count();
        assert_eq!(empty_notices, 4);
        assert!(dashboard.text_report().contains("no data for the current filter"));
    }

    #[test]
    fn test_dashboard_serializes_to_json() {
        let dashboard = Dashboard::build(&table(), &Selection::new(REF, 2030), NationalSource::NotConfigured);
        let json = serde_json::to_value(&dashboard).unwrap();

        assert_eq!(json["trend"]["status"], "ready");
        assert_eq!(json["national_trend"]["status"], "unavailable");
        assert_eq!(json["scenario_delta"]["data"]["sectors"][0], "Agriculture");
    }
}
