use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::error::{ProcessingError, Result};
use crate::models::{CellValue, DetailType, NationalSummaryRecord, NationalTrendPoint};
use crate::processors::column_discovery::{
    discover_columns, DiscoveryReport, SemanticField, NATIONAL_RULES,
};
use crate::processors::normalizer::{coerce_emissions, coerce_year};
use crate::readers::SheetTable;
use crate::utils::constants::{
    ADDITIONAL_MEASURES_CASE, DEFAULT_NATIONAL_SCENARIO, REFERENCE_CASE, TOTAL_TOKENS,
};

/// Map a scenario label onto the canonical names by substring.
pub fn canonical_scenario(label: &str) -> String {
    let lowered = label.to_lowercase();
    if lowered.contains("additional") && !lowered.contains("reference") {
        ADDITIONAL_MEASURES_CASE.to_string()
    } else if lowered.contains("reference") {
        REFERENCE_CASE.to_string()
    } else {
        label.trim().to_string()
    }
}

pub fn is_total_token(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    TOTAL_TOKENS.iter().any(|token| *token == value)
}

/// Builds the national trend series from a combined sheet of unknown layout.
pub struct NationalSummaryProcessor;

impl NationalSummaryProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn discover(&self, frame: &SheetTable) -> DiscoveryReport {
        discover_columns(&frame.headers, NATIONAL_RULES)
    }

    /// Extract typed records, restricted to total rows when the sector column
    /// has any. Fails with `SchemaDiscovery` when the year or value column
    /// cannot be found.
    pub fn extract_records(
        &self,
        frame: &SheetTable,
        report: &DiscoveryReport,
    ) -> Result<Vec<NationalSummaryRecord>> {
        let missing = report.missing_required();
        let (year_idx, value_idx) = match (
            report.column_index(SemanticField::Year),
            report.column_index(SemanticField::Value),
        ) {
            (Some(year_idx), Some(value_idx)) if missing.is_empty() => (year_idx, value_idx),
            _ => {
                return Err(ProcessingError::SchemaDiscovery {
                    missing: missing.iter().map(|f| f.label().to_string()).collect(),
                    available: frame.headers.clone(),
                })
            }
        };
        let scenario_idx = report.column_index(SemanticField::Scenario);
        let sector_idx = report.column_index(SemanticField::Sector);
        let detail_idx = report.column_index(SemanticField::DetailType);

        if scenario_idx.is_none() {
            debug!(
                "No scenario column; using '{}' for every row",
                DEFAULT_NATIONAL_SCENARIO
            );
        }

        let text_at = |row: &[CellValue], idx: Option<usize>| -> Option<String> {
            idx.map(|i| row[i].to_trimmed_string())
        };

        let records: Vec<NationalSummaryRecord> = frame
            .rows
            .iter()
            .map(|row| {
                let scenario_label = text_at(row, scenario_idx)
                    .filter(|s| !s.is_empty())
                    .unwrap_or_else(|| DEFAULT_NATIONAL_SCENARIO.to_string());
                let detail_type = match text_at(row, detail_idx) {
                    Some(text) => DetailType::infer(&text),
                    None => DetailType::infer(&scenario_label),
                };

                NationalSummaryRecord {
                    year: coerce_year(&row[year_idx]),
                    value: coerce_emissions(&row[value_idx]),
                    scenario_label,
                    sector_or_total: text_at(row, sector_idx),
                    detail_type,
                }
            })
            .collect();

        Ok(Self::restrict_to_totals(records))
    }

    /// Keep only total rows when the sector column has any; otherwise keep everything.
    fn restrict_to_totals(records: Vec<NationalSummaryRecord>) -> Vec<NationalSummaryRecord> {
        let has_totals = records
            .iter()
            .any(|r| r.sector_or_total.as_deref().is_some_and(is_total_token));
        if !has_totals {
            return records;
        }
        records
            .into_iter()
            .filter(|r| r.sector_or_total.as_deref().is_some_and(is_total_token))
            .collect()
    }

    /// Σvalue by (year, canonical scenario, detail type), ordered by
    /// scenario, detail type, year. Rows with a null year or value are
    /// dropped here, after the totals restriction.
    pub fn group(&self, records: &[NationalSummaryRecord]) -> Vec<NationalTrendPoint> {
        let mut totals: BTreeMap<(String, DetailType, i32), f64> = BTreeMap::new();
        let mut dropped = 0usize;
        for record in records {
            let (year, value) = match (record.year, record.value) {
                (Some(year), Some(value)) => (year, value),
                _ => {
                    dropped += 1;
                    continue;
                }
            };
            let key = (
                canonical_scenario(&record.scenario_label),
                record.detail_type,
                year,
            );
            *totals.entry(key).or_insert(0.0) += value;
        }

        if dropped > 0 {
            debug!(dropped, "Dropped national rows without a numeric year or value");
        }

        totals
            .into_iter()
            .map(|((scenario, detail_type, year), value)| NationalTrendPoint {
                year,
                scenario,
                detail_type,
                value,
            })
            .collect()
    }

    /// Discovery, extraction and grouping in one step.
    pub fn process(&self, frame: &SheetTable) -> Result<Vec<NationalTrendPoint>> {
        let report = self.discover(frame);
        debug!("{}", report.summary());
        let records = self.extract_records(frame, &report).inspect_err(|e| {
            warn!(error = %e, "National summary columns not discovered");
        })?;
        Ok(self.group(&records))
    }
}

impl Default for NationalSummaryProcessor {
    fn default() -> Self {
        Self::new()
    }
}
