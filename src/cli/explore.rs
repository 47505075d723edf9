use std::io::{BufRead, Write};
use tracing::debug;

use crate::cli::args::SelectionArgs;
use crate::cli::commands::resolve_selection;
use crate::config::Settings;
use crate::dashboard::{Dashboard, NationalSource};
use crate::error::{ProcessingError, Result};
use crate::models::{EmissionTable, RegionFilter, SectorFilter, Selection};
use crate::processors::Normalizer;
use crate::readers::{EmissionsReader, WorkbookCache};
use crate::writers::ChartWriter;

const HELP: &str = "\
Commands:
  scenario <name>     select a scenario
  region <name|all>   select a province or all provinces
  sector <name|all>   select a sector or all sectors
  year <yyyy>         select the snapshot year
  show                recompute and print every view
  options             list the available scenarios, regions, sectors and years
  render              write chart files into the output directory
  help                show this message
  quit                leave the session";

#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Scenario(String),
    Region(RegionFilter),
    Sector(SectorFilter),
    Year(i32),
    Show,
    Options,
    Render,
    Help,
    Quit,
    Empty,
}

impl SessionCommand {
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let require_arg = |name: &str| -> Result<()> {
            if rest.is_empty() {
                Err(ProcessingError::InvalidSelection(format!(
                    "'{}' needs a value",
                    name
                )))
            } else {
                Ok(())
            }
        };

        match word.to_lowercase().as_str() {
            "" => Ok(SessionCommand::Empty),
            "scenario" => {
                require_arg("scenario")?;
                Ok(SessionCommand::Scenario(rest.to_string()))
            }
            "region" => {
                require_arg("region")?;
                Ok(SessionCommand::Region(RegionFilter::parse(rest)))
            }
            "sector" => {
                require_arg("sector")?;
                Ok(SessionCommand::Sector(SectorFilter::parse(rest)))
            }
            "year" => {
                require_arg("year")?;
                rest.parse::<i32>().map(SessionCommand::Year).map_err(|_| {
                    ProcessingError::InvalidSelection(format!("'{}' is not a year", rest))
                })
            }
            "show" => Ok(SessionCommand::Show),
            "options" => Ok(SessionCommand::Options),
            "render" => Ok(SessionCommand::Render),
            "help" | "?" => Ok(SessionCommand::Help),
            "quit" | "exit" => Ok(SessionCommand::Quit),
            other => Err(ProcessingError::InvalidSelection(format!(
                "unknown command '{}'; type 'help'",
                other
            ))),
        }
    }
}

/// Holds the selection between commands. Every redraw goes back through the
/// workbook cache, so edits to the workbooks are picked up without
/// re-parsing files that did not change.
pub struct ExploreSession {
    settings: Settings,
    cache: WorkbookCache,
    selection: Selection,
}

impl ExploreSession {
    pub fn start(settings: Settings, args: &SelectionArgs) -> Result<Self> {
        let mut cache = WorkbookCache::new();
        let table = load_cached(&settings, &mut cache)?;
        let selection = resolve_selection(args, &table, settings.default_year)?;
        Ok(Self {
            settings,
            cache,
            selection,
        })
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn cache(&self) -> &WorkbookCache {
        &self.cache
    }

    pub fn dashboard(&mut self) -> Result<Dashboard> {
        let table = load_cached(&self.settings, &mut self.cache)?;
        let national = NationalSource::load_cached(
            self.settings.secondary_workbook.as_deref(),
            &mut self.cache,
        );
        Ok(Dashboard::build(&table, &self.selection, national))
    }

    /// Execute one command. Returns `false` when the session should end.
    pub fn handle<W: Write>(&mut self, command: SessionCommand, out: &mut W) -> Result<bool> {
        let candidate = match command {
            SessionCommand::Empty => return Ok(true),
            SessionCommand::Quit => return Ok(false),
            SessionCommand::Help => {
                writeln!(out, "{}", HELP)?;
                return Ok(true);
            }
            SessionCommand::Options => {
                let table = load_cached(&self.settings, &mut self.cache)?;
                write_options(&table, out)?;
                return Ok(true);
            }
            SessionCommand::Render => {
                let dashboard = self.dashboard()?;
                let writer = ChartWriter::new(self.settings.chart_format)
                    .with_size(self.settings.chart_width, self.settings.chart_height);
                let summary = writer.render_dashboard(&dashboard, &self.settings.output_dir)?;
                for path in &summary.written {
                    writeln!(out, "Wrote {}", path.display())?;
                }
                for (view, error) in &summary.failed {
                    writeln!(out, "⚠️  {} not rendered: {}", view, error)?;
                }
                return Ok(true);
            }
            SessionCommand::Show => self.selection.clone(),
            SessionCommand::Scenario(scenario) => self.selection.clone().with_scenario(scenario),
            SessionCommand::Region(region) => self.selection.clone().with_region(region),
            SessionCommand::Sector(sector) => self.selection.clone().with_sector(sector),
            SessionCommand::Year(year) => self.selection.clone().with_year(year),
        };

        let table = load_cached(&self.settings, &mut self.cache)?;
        candidate.validate_against(&table)?;
        self.selection = candidate;

        let national = NationalSource::load_cached(
            self.settings.secondary_workbook.as_deref(),
            &mut self.cache,
        );
        let dashboard = Dashboard::build(&table, &self.selection, national);
        writeln!(out, "{}", dashboard.text_report())?;
        Ok(true)
    }
}

fn load_cached(settings: &Settings, cache: &mut WorkbookCache) -> Result<EmissionTable> {
    let sheets = cache.sheets(&settings.primary_workbook)?;
    let reader = EmissionsReader::with_id_columns(&settings.year_column, &settings.sector_column);
    let (rows, _report) = reader.unpivot_sheets(&sheets);
    Ok(Normalizer::new().normalize(rows))
}

fn write_options<W: Write>(table: &EmissionTable, out: &mut W) -> Result<()> {
    writeln!(out, "Scenarios: {}", table.scenarios().join(", "))?;
    writeln!(out, "Regions:   all, {}", table.regions().join(", "))?;
    writeln!(out, "Sectors:   all, {}", table.sectors().join(", "))?;
    match table.year_range() {
        Some((lo, hi)) => writeln!(out, "Years:     {}-{}", lo, hi)?,
        None => writeln!(out, "Years:     none")?,
    }
    Ok(())
}

/// Read commands from `input` until `quit` or end of input. A failing
/// command prints its error and leaves the selection unchanged.
pub fn run_session<R: BufRead, W: Write>(
    session: &mut ExploreSession,
    input: R,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "Selection: {}", session.selection())?;
    writeln!(out, "Type 'help' for commands.")?;
    write!(out, "ghg> ")?;
    out.flush()?;

    for line in input.lines() {
        let line = line?;
        let outcome = SessionCommand::parse(&line).and_then(|cmd| session.handle(cmd, out));
        match outcome {
            Ok(true) => {}
            Ok(false) => break,
            Err(ProcessingError::Io(e)) => return Err(ProcessingError::Io(e)),
            Err(e) => writeln!(out, "Error: {}", e)?,
        }
        write!(out, "ghg> ")?;
        out.flush()?;
    }

    debug!(
        hits = session.cache().hits(),
        misses = session.cache().misses(),
        "Explore session finished"
    );
    Ok(())
}
