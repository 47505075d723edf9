use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use crate::models::{DeltaGrid, EmissionTable, Sector, Selection};
use crate::processors::column_discovery::longest_match;
use crate::utils::constants::{ADDITIONAL_KEYWORD, REFERENCE_KEYWORD};

/// Why the delta heatmap could not be built.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaUnavailable {
    pub missing_keywords: Vec<&'static str>,
    pub available: Vec<String>,
}

impl fmt::Display for DeltaUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no scenario matching \"{}\"; available scenarios: [{}]",
            self.missing_keywords.join("\", \""),
            self.available.join(", ")
        )
    }
}

/// Pick the reference and additional-measures scenarios out of `scenarios`.
pub fn locate_delta_scenarios(
    scenarios: &[String],
) -> std::result::Result<(String, String), DeltaUnavailable> {
    let reference = longest_match(scenarios, REFERENCE_KEYWORD);
    let additional = longest_match(scenarios, ADDITIONAL_KEYWORD);

    match (reference, additional) {
        (Some(reference), Some(additional)) => Ok((reference.to_string(), additional.to_string())),
        (reference, additional) => {
            let mut missing_keywords = Vec::new();
            if reference.is_none() {
                missing_keywords.push(REFERENCE_KEYWORD);
            }
            if additional.is_none() {
                missing_keywords.push(ADDITIONAL_KEYWORD);
            }
            Err(DeltaUnavailable {
                missing_keywords,
                available: scenarios.to_vec(),
            })
        }
    }
}

/// Sector × year grid of `additional - reference` for the selected region.
///
/// Scenarios are pivoted into columns per (year, sector) cell, summing
/// duplicates. A cell is `None` when either scenario has no value there.
pub fn scenario_delta(
    table: &EmissionTable,
    selection: &Selection,
) -> std::result::Result<DeltaGrid, DeltaUnavailable> {
    let (reference, additional) = locate_delta_scenarios(&table.scenarios())?;

    let mut pivot: BTreeMap<(Sector, i32), HashMap<&str, f64>> = BTreeMap::new();
    for entry in table.sector_records() {
        let record = entry.record;
        if !selection.region.matches(&record.region) {
            continue;
        }
        if record.scenario != reference && record.scenario != additional {
            continue;
        }
        if let Some((year, value)) = record.value_point() {
            *pivot
                .entry((entry.sector, year))
                .or_default()
                .entry(record.scenario.as_str())
                .or_insert(0.0) += value;
        }
    }

    let sectors: Vec<Sector> = pivot
        .keys()
        .map(|(sector, _)| *sector)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let years: Vec<i32> = pivot
        .keys()
        .map(|(_, year)| *year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let cells = sectors
        .iter()
        .map(|sector| {
            years
                .iter()
                .map(|year| {
                    let columns = pivot.get(&(*sector, *year))?;
                    let reference_value = columns.get(reference.as_str())?;
                    let additional_value = columns.get(additional.as_str())?;
                    Some(additional_value - reference_value)
                })
                .collect()
        })
        .collect();

    Ok(DeltaGrid {
        reference_scenario: reference,
        additional_scenario: additional,
        sectors,
        years,
        cells,
    })
}
