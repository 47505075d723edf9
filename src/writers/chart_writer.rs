use plotters::coord::Shift;
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

use crate::dashboard::{Dashboard, View};
use crate::error::{ProcessingError, Result};
use crate::models::{
    DeltaGrid, NationalTrendPoint, RegionTotal, Sector, SectorTotal, SectorYearTotal, YearTotal,
};
use crate::utils::constants::{DEFAULT_CHART_HEIGHT, DEFAULT_CHART_WIDTH};
use crate::utils::slugify;

const Y_DESC: &str = "Emissions (Mt CO2 eq)";

const SECTOR_COLORS: [RGBColor; 8] = [
    RGBColor(102, 166, 30),
    RGBColor(231, 138, 195),
    RGBColor(255, 217, 47),
    RGBColor(117, 112, 179),
    RGBColor(166, 118, 29),
    RGBColor(31, 120, 180),
    RGBColor(102, 102, 102),
    RGBColor(227, 26, 28),
];

const SERIES_COLORS: [RGBColor; 6] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    #[default]
    Svg,
    Png,
}

impl ChartFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ChartFormat::Svg => "svg",
            ChartFormat::Png => "png",
        }
    }
}

impl fmt::Display for ChartFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ChartFormat {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "svg" => Ok(ChartFormat::Svg),
            "png" => Ok(ChartFormat::Png),
            other => Err(ProcessingError::InvalidFormat(format!(
                "Unsupported chart format: {}",
                other
            ))),
        }
    }
}

/// Charts written for a dashboard, plus the views that failed to render.
#[derive(Debug, Default)]
pub struct RenderSummary {
    pub written: Vec<PathBuf>,
    pub failed: Vec<(View, String)>,
}

fn render_err<E: fmt::Display>(e: E) -> ProcessingError {
    ProcessingError::Render(e.to_string())
}

fn no_data(view: View) -> ProcessingError {
    ProcessingError::Render(format!("{}: no data to chart", view))
}

/// Opens the backend for the configured format, runs the draw function and
/// flushes the result to `path`.
macro_rules! with_backend {
    ($writer:expr, $path:expr, $draw:ident($($arg:expr),*)) => {{
        match $writer.format {
            ChartFormat::Svg => {
                let root = SVGBackend::new($path, $writer.size).into_drawing_area();
                $draw(&root, $($arg),*)?;
                root.present().map_err(render_err)
            }
            ChartFormat::Png => {
                let root = BitMapBackend::new($path, $writer.size).into_drawing_area();
                $draw(&root, $($arg),*)?;
                root.present().map_err(render_err)
            }
        }
    }};
}

pub struct ChartWriter {
    format: ChartFormat,
    size: (u32, u32),
}

impl ChartWriter {
    pub fn new(format: ChartFormat) -> Self {
        Self {
            format,
            size: (DEFAULT_CHART_WIDTH, DEFAULT_CHART_HEIGHT),
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn format(&self) -> ChartFormat {
        self.format
    }

    pub fn chart_path(&self, dir: &Path, view: View) -> PathBuf {
        dir.join(format!("{}.{}", slugify(view.title()), self.format.extension()))
    }

    /// Render every ready view into `dir`. A chart that fails is recorded
    /// and skipped.
    pub fn render_dashboard(&self, dashboard: &Dashboard, dir: &Path) -> Result<RenderSummary> {
        std::fs::create_dir_all(dir)?;
        let selection = &dashboard.selection;
        let mut summary = RenderSummary::default();

        let mut record = |view: View, result: Option<Result<()>>| match result {
            None => {}
            Some(Ok(())) => {
                let path = self.chart_path(dir, view);
                debug!(view = ?view, path = %path.display(), "Chart written");
                summary.written.push(path);
            }
            Some(Err(e)) => {
                warn!(view = ?view, error = %e, "Chart rendering failed");
                summary.failed.push((view, e.to_string()));
            }
        };

        record(
            View::Trend,
            dashboard.trend.data().map(|rows| {
                let title = format!(
                    "{} ({}, {}, {})",
                    View::Trend,
                    selection.scenario,
                    selection.region,
                    selection.sector
                );
                self.trend(rows, &title, &self.chart_path(dir, View::Trend))
            }),
        );
        record(
            View::SectorBreakdown,
            dashboard.sector_breakdown.data().map(|rows| {
                let title = format!(
                    "{} ({}, {})",
                    View::SectorBreakdown,
                    selection.scenario,
                    selection.region
                );
                self.sector_breakdown(rows, &title, &self.chart_path(dir, View::SectorBreakdown))
            }),
        );
        record(
            View::SectorSnapshot,
            dashboard.sector_snapshot.data().map(|rows| {
                let title = format!(
                    "{} ({}, {}, {})",
                    View::SectorSnapshot,
                    selection.scenario,
                    selection.region,
                    selection.year
                );
                self.sector_snapshot(rows, &title, &self.chart_path(dir, View::SectorSnapshot))
            }),
        );
        record(
            View::RegionSnapshot,
            dashboard.region_snapshot.data().map(|rows| {
                let title = format!(
                    "{} ({}, {})",
                    View::RegionSnapshot,
                    selection.scenario,
                    selection.year
                );
                self.region_snapshot(rows, &title, &self.chart_path(dir, View::RegionSnapshot))
            }),
        );
        record(
            View::ScenarioDelta,
            dashboard.scenario_delta.data().map(|grid| {
                let title = format!("{} ({})", View::ScenarioDelta, selection.region);
                self.scenario_delta(grid, &title, &self.chart_path(dir, View::ScenarioDelta))
            }),
        );
        record(
            View::NationalTrend,
            dashboard.national_trend.data().map(|points| {
                let title = View::NationalTrend.title();
                self.national_trend(points, title, &self.chart_path(dir, View::NationalTrend))
            }),
        );

        Ok(summary)
    }

    /// Line chart of total emissions by year.
    pub fn trend(&self, rows: &[YearTotal], title: &str, path: &Path) -> Result<()> {
        if rows.is_empty() {
            return Err(no_data(View::Trend));
        }
        with_backend!(self, path, draw_trend(rows, title))
    }

    /// Stacked area chart of sector emissions by year.
    pub fn sector_breakdown(&self, rows: &[SectorYearTotal], title: &str, path: &Path) -> Result<()> {
        if rows.is_empty() {
            return Err(no_data(View::SectorBreakdown));
        }
        with_backend!(self, path, draw_stacked_sectors(rows, title))
    }

    pub fn sector_snapshot(&self, rows: &[SectorTotal], title: &str, path: &Path) -> Result<()> {
        if rows.is_empty() {
            return Err(no_data(View::SectorSnapshot));
        }
        let bars: Vec<(String, f64, RGBColor)> = rows
            .iter()
            .map(|r| {
                (
                    r.sector.label().to_string(),
                    r.emissions,
                    sector_color(r.sector),
                )
            })
            .collect();
        with_backend!(self, path, draw_bars(&bars, title))
    }

    pub fn region_snapshot(&self, rows: &[RegionTotal], title: &str, path: &Path) -> Result<()> {
        if rows.is_empty() {
            return Err(no_data(View::RegionSnapshot));
        }
        let bars: Vec<(String, f64, RGBColor)> = rows
            .iter()
            .map(|r| (r.region.clone(), r.emissions, SERIES_COLORS[0]))
            .collect();
        with_backend!(self, path, draw_bars(&bars, title))
    }

    /// Diverging heatmap: reductions in green, increases in red.
    pub fn scenario_delta(&self, grid: &DeltaGrid, title: &str, path: &Path) -> Result<()> {
        if grid.is_empty() {
            return Err(no_data(View::ScenarioDelta));
        }
        with_backend!(self, path, draw_heatmap(grid, title))
    }

    /// One line per (scenario, detail type) series.
    pub fn national_trend(&self, points: &[NationalTrendPoint], title: &str, path: &Path) -> Result<()> {
        if points.is_empty() {
            return Err(no_data(View::NationalTrend));
        }
        with_backend!(self, path, draw_national(points, title))
    }
}

fn sector_color(sector: Sector) -> RGBColor {
    SECTOR_COLORS[sector.display_index() % SECTOR_COLORS.len()]
}

/// Padded value range that always contains zero.
fn value_bounds(values: impl IntoIterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let pad = ((hi - lo) * 0.05).max(1e-6);
    (if lo < 0.0 { lo - pad } else { lo }, hi + pad)
}

fn year_bounds(years: impl IntoIterator<Item = i32>) -> (i32, i32) {
    let mut years = years.into_iter();
    let first = years.next().unwrap_or_default();
    let (lo, hi) = years.fold((first, first), |(lo, hi), y| (lo.min(y), hi.max(y)));
    if lo == hi {
        (lo, hi + 1)
    } else {
        (lo, hi)
    }
}

fn draw_trend<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    rows: &[YearTotal],
    title: &str,
) -> Result<()> {
    root.fill(&WHITE).map_err(render_err)?;
    let (x_lo, x_hi) = year_bounds(rows.iter().map(|r| r.year));
    let (y_lo, y_hi) = value_bounds(rows.iter().map(|r| r.emissions));

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 20))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc(Y_DESC)
        .draw()
        .map_err(render_err)?;

    let color = SERIES_COLORS[0];
    chart
        .draw_series(LineSeries::new(
            rows.iter().map(|r| (r.year, r.emissions)),
            color.stroke_width(2),
        ))
        .map_err(render_err)?;
    chart
        .draw_series(
            rows.iter()
                .map(|r| Circle::new((r.year, r.emissions), 3, color.filled())),
        )
        .map_err(render_err)?;

    Ok(())
}

fn draw_stacked_sectors<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    rows: &[SectorYearTotal],
    title: &str,
) -> Result<()> {
    root.fill(&WHITE).map_err(render_err)?;

    let mut by_sector: BTreeMap<Sector, BTreeMap<i32, f64>> = BTreeMap::new();
    let mut years: Vec<i32> = rows.iter().map(|r| r.year).collect();
    years.sort_unstable();
    years.dedup();
    for row in rows {
        *by_sector
            .entry(row.sector)
            .or_default()
            .entry(row.year)
            .or_insert(0.0) += row.emissions;
    }

    // Cumulative bands in sector display order; negative values stack below zero
    let mut positive = vec![0.0; years.len()];
    let mut negative = vec![0.0; years.len()];
    let mut bands: Vec<(Sector, Vec<(i32, f64)>, Vec<(i32, f64)>)> = Vec::new();
    for (sector, values) in &by_sector {
        let mut lower = Vec::with_capacity(years.len());
        let mut upper = Vec::with_capacity(years.len());
        for (i, year) in years.iter().enumerate() {
            let v = values.get(year).copied().unwrap_or(0.0);
            let base = if v < 0.0 { &mut negative[i] } else { &mut positive[i] };
            lower.push((*year, *base));
            *base += v;
            upper.push((*year, *base));
        }
        bands.push((*sector, lower, upper));
    }

    let (x_lo, x_hi) = year_bounds(years.iter().copied());
    let (y_lo, y_hi) = value_bounds(positive.iter().chain(negative.iter()).copied());

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 20))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc(Y_DESC)
        .draw()
        .map_err(render_err)?;

    for (sector, lower, upper) in bands {
        let color = sector_color(sector);
        let outline: Vec<(i32, f64)> = upper.iter().copied().chain(lower.into_iter().rev()).collect();
        chart
            .draw_series(std::iter::once(Polygon::new(outline, color.mix(0.8).filled())))
            .map_err(render_err)?
            .label(sector.label())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(render_err)?;

    Ok(())
}

fn draw_bars<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    bars: &[(String, f64, RGBColor)],
    title: &str,
) -> Result<()> {
    root.fill(&WHITE).map_err(render_err)?;
    let (y_lo, y_hi) = value_bounds(bars.iter().map(|(_, v, _)| *v));
    let x_hi = bars.len() as f64 - 0.5;

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 20))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(-0.5..x_hi, y_lo..y_hi)
        .map_err(render_err)?;

    let labels: Vec<&str> = bars.iter().map(|(label, _, _)| label.as_str()).collect();
    let x_formatter = |v: &f64| {
        let idx = v.round();
        if idx >= 0.0 && (idx as usize) < labels.len() && (v - idx).abs() < 1e-6 {
            labels[idx as usize].to_string()
        } else {
            String::new()
        }
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(labels.len())
        .x_label_formatter(&x_formatter)
        .y_desc(Y_DESC)
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(bars.iter().enumerate().map(|(i, (_, value, color))| {
            let x = i as f64;
            Rectangle::new([(x - 0.35, 0.0), (x + 0.35, *value)], color.filled())
        }))
        .map_err(render_err)?;

    Ok(())
}

fn delta_color(value: Option<f64>, max_abs: f64) -> RGBColor {
    let Some(value) = value else {
        return RGBColor(220, 220, 220);
    };
    let t = (value / max_abs).clamp(-1.0, 1.0);
    let fade = |full: u8| (255.0 - (255.0 - full as f64) * t.abs()) as u8;
    if t < 0.0 {
        RGBColor(fade(26), fade(152), fade(80))
    } else {
        RGBColor(fade(215), fade(48), fade(39))
    }
}

fn draw_heatmap<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    grid: &DeltaGrid,
    title: &str,
) -> Result<()> {
    root.fill(&WHITE).map_err(render_err)?;
    let max_abs = grid
        .value_range()
        .map(|(lo, hi)| lo.abs().max(hi.abs()))
        .filter(|m| *m > 0.0)
        .unwrap_or(1.0);

    let x_hi = grid.years.len() as f64 - 0.5;
    let y_hi = grid.sectors.len() as f64 - 0.5;

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 20))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(130)
        .build_cartesian_2d(-0.5..x_hi, -0.5..y_hi)
        .map_err(render_err)?;

    for (row, cells) in grid.cells.iter().enumerate() {
        for (col, cell) in cells.iter().enumerate() {
            let (x, y) = (col as f64, row as f64);
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                    delta_color(*cell, max_abs).filled(),
                )))
                .map_err(render_err)?;
        }
    }

    let x_formatter = |v: &f64| index_label(*v, &grid.years, |y| y.to_string());
    let y_formatter = |v: &f64| index_label(*v, &grid.sectors, |s| s.label().to_string());
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(grid.years.len())
        .y_labels(grid.sectors.len())
        .x_label_formatter(&x_formatter)
        .y_label_formatter(&y_formatter)
        .x_desc("Year")
        .draw()
        .map_err(render_err)?;

    Ok(())
}

fn index_label<T>(v: f64, items: &[T], label: impl Fn(&T) -> String) -> String {
    let idx = v.round();
    if idx >= 0.0 && (v - idx).abs() < 1e-6 {
        items.get(idx as usize).map(label).unwrap_or_default()
    } else {
        String::new()
    }
}

fn draw_national<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    points: &[NationalTrendPoint],
    title: &str,
) -> Result<()> {
    root.fill(&WHITE).map_err(render_err)?;

    let mut series: BTreeMap<String, Vec<(i32, f64)>> = BTreeMap::new();
    for point in points {
        let name = format!("{} ({})", point.scenario, point.detail_type);
        series.entry(name).or_default().push((point.year, point.value));
    }

    let (x_lo, x_hi) = year_bounds(points.iter().map(|p| p.year));
    let (y_lo, y_hi) = value_bounds(points.iter().map(|p| p.value));

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 20))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
        .map_err(render_err)?;

    chart
        .configure_mesh()
        .x_desc("Year")
        .y_desc(Y_DESC)
        .draw()
        .map_err(render_err)?;

    for (idx, (name, mut values)) in series.into_iter().enumerate() {
        values.sort_by_key(|(year, _)| *year);
        let color = SERIES_COLORS[idx % SERIES_COLORS.len()];
        chart
            .draw_series(LineSeries::new(values, color.stroke_width(2)))
            .map_err(render_err)?
            .label(name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(render_err)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::NationalSource;
    use crate::models::{CellValue, EmissionRecord, EmissionTable, RegionFilter, Selection};
    use crate::readers::SheetTable;
    use tempfile::TempDir;

    const REF: &str = "Reference Case";
    const ADD: &str = "Additional Measures Case";

    fn populated_dashboard() -> Dashboard {
        let mut records = Vec::new();
        for (year, scale) in [(2030, 1.0), (2035, 0.9), (2040, 0.8)] {
            for (sector, value) in [("Agriculture", 10.0), ("Buildings", 20.0), ("Transportation", 30.0)] {
                records.push(EmissionRecord::new(Some(year), sector, REF, "Ontario", Some(value * scale)));
                records.push(EmissionRecord::new(Some(year), sector, ADD, "Ontario", Some(value * scale - 2.0)));
                records.push(EmissionRecord::new(Some(year), sector, REF, "Quebec", Some(value * scale / 2.0)));
            }
        }
        let national = SheetTable::new(
            "national",
            vec!["Year".to_string(), "Scenario".to_string(), "Emissions".to_string()],
            vec![
                vec![CellValue::Number(2030.0), CellValue::text(REF), CellValue::Number(650.0)],
                vec![CellValue::Number(2035.0), CellValue::text(REF), CellValue::Number(620.0)],
                vec![CellValue::Number(2030.0), CellValue::text(ADD), CellValue::Number(600.0)],
                vec![CellValue::Number(2035.0), CellValue::text(ADD), CellValue::Number(560.0)],
            ],
        );
        let selection = Selection::new(REF, 2030).with_region(RegionFilter::Only("Ontario".into()));
        Dashboard::build(
            &EmissionTable::new(records),
            &selection,
            NationalSource::Loaded(national),
        )
    }

    #[test]
    fn test_chart_format_parsing() {
        assert_eq!("SVG".parse::<ChartFormat>().unwrap(), ChartFormat::Svg);
        assert_eq!("png".parse::<ChartFormat>().unwrap(), ChartFormat::Png);
        assert!("gif".parse::<ChartFormat>().is_err());
    }

    #[test]
    fn test_chart_path_uses_view_slug() {
        let writer = ChartWriter::new(ChartFormat::Png);
        let path = writer.chart_path(Path::new("out"), View::RegionSnapshot);
        assert_eq!(path, Path::new("out").join("emissions-by-province.png"));
    }

    #[test]
    fn test_empty_series_is_rejected_before_writing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("trend.svg");
        let writer = ChartWriter::new(ChartFormat::Svg);

        let err = writer.trend(&[], "Trend", &path).unwrap_err();
        assert!(matches!(err, ProcessingError::Render(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_dashboard_without_data_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let table = EmissionTable::new(Vec::new());
        let dashboard = Dashboard::build(
            &table,
            &Selection::new("Reference Case", 2030),
            NationalSource::NotConfigured,
        );

        let summary = ChartWriter::new(ChartFormat::Svg)
            .render_dashboard(&dashboard, dir.path())
            .unwrap();
        assert!(summary.written.is_empty());
        assert!(summary.failed.is_empty());
    }

    #[test]
    fn test_populated_dashboard_renders_every_view() {
        let dashboard = populated_dashboard();
        assert_eq!(dashboard.ready_views(), 6);

        for format in [ChartFormat::Svg, ChartFormat::Png] {
            let dir = TempDir::new().unwrap();
            let writer = ChartWriter::new(format).with_size(640, 480);
            let summary = writer.render_dashboard(&dashboard, dir.path()).unwrap();

            assert!(summary.failed.is_empty(), "{}: {:?}", format, summary.failed);
            assert_eq!(summary.written.len(), 6, "{}", format);
            for path in &summary.written {
                assert!(path.exists(), "missing {}", path.display());
                assert_eq!(path.extension().unwrap(), format.extension());
                assert!(std::fs::metadata(path).unwrap().len() > 0);
            }
        }
    }

    #[test]
    fn test_value_bounds_include_zero() {
        let (lo, hi) = value_bounds([5.0, 10.0]);
        assert_eq!(lo, 0.0);
        assert!(hi > 10.0);

        let (lo, _) = value_bounds([-2.0, 3.0]);
        assert!(lo < -2.0);
    }

    #[test]
    fn test_delta_color_diverges() {
        assert_eq!(delta_color(None, 1.0), RGBColor(220, 220, 220));
        assert_eq!(delta_color(Some(0.0), 1.0), RGBColor(255, 255, 255));
        assert_eq!(delta_color(Some(-1.0), 1.0), RGBColor(26, 152, 80));
        assert_eq!(delta_color(Some(2.0), 1.0), RGBColor(215, 48, 39));
    }
}
