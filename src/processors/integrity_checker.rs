use serde::Serialize;
use std::collections::HashMap;

use crate::models::EmissionTable;

/// A (region, sector, scenario, year) key that occurs more than once.
/// Aggregations sum such rows, so they are double counted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateKey {
    pub region: String,
    pub sector: String,
    pub scenario: String,
    pub year: Option<i32>,
    pub occurrences: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
    pub total_records: usize,
    pub null_years: usize,
    pub null_emissions: usize,
    pub scenarios: Vec<String>,
    pub regions: Vec<String>,
    pub year_range: Option<(i32, i32)>,
    pub unknown_sectors: Vec<String>,
    pub duplicate_keys: Vec<DuplicateKey>,
}

pub struct IntegrityChecker {
    max_listed_duplicates: usize,
}

impl IntegrityChecker {
    pub fn new() -> Self {
        Self {
            max_listed_duplicates: 20,
        }
    }

    pub fn with_max_listed_duplicates(max_listed_duplicates: usize) -> Self {
        Self {
            max_listed_duplicates,
        }
    }

    pub fn check_integrity(&self, table: &EmissionTable) -> IntegrityReport {
        let records = table.records();
        IntegrityReport {
            total_records: records.len(),
            null_years: records.iter().filter(|r| r.year.is_none()).count(),
            null_emissions: records.iter().filter(|r| r.emissions.is_none()).count(),
            scenarios: table.scenarios(),
            regions: table.regions(),
            year_range: table.year_range(),
            unknown_sectors: table.unknown_sectors(),
            duplicate_keys: self.duplicate_keys(table),
        }
    }

    /// Every key seen more than once, ordered by region, sector, scenario, year.
    pub fn duplicate_keys(&self, table: &EmissionTable) -> Vec<DuplicateKey> {
        let mut counts: HashMap<(&str, &str, &str, Option<i32>), usize> = HashMap::new();
        for record in table.records() {
            let key = (
                record.region.as_str(),
                record.sector.as_str(),
                record.scenario.as_str(),
                record.year,
            );
            *counts.entry(key).or_insert(0) += 1;
        }

        let mut duplicates: Vec<DuplicateKey> = counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|((region, sector, scenario, year), occurrences)| DuplicateKey {
                region: region.to_string(),
                sector: sector.to_string(),
                scenario: scenario.to_string(),
                year,
                occurrences,
            })
            .collect();
        duplicates.sort_by(|a, b| {
            a.region
                .cmp(&b.region)
                .then_with(|| a.sector.cmp(&b.sector))
                .then_with(|| a.scenario.cmp(&b.scenario))
                .then_with(|| a.year.cmp(&b.year))
        });
        duplicates
    }

    /// Generate summary report
    pub fn generate_summary(&self, report: &IntegrityReport) -> String {
        let mut summary = String::new();

        summary.push_str("Emissions Table Summary:\n");
        summary.push_str(&format!("- Total records: {}\n", report.total_records));
        summary.push_str(&format!("- Records without a year: {}\n", report.null_years));
        summary.push_str(&format!(
            "- Records without an emissions value: {}\n",
            report.null_emissions
        ));
        match report.year_range {
            Some((lo, hi)) => summary.push_str(&format!("- Years: {}-{}\n", lo, hi)),
            None => summary.push_str("- Years: none\n"),
        }
        summary.push_str(&format!(
            "- Scenarios ({}): {}\n",
            report.scenarios.len(),
            report.scenarios.join(", ")
        ));
        summary.push_str(&format!(
            "- Regions ({}): {}\n",
            report.regions.len(),
            report.regions.join(", ")
        ));

        if !report.unknown_sectors.is_empty() {
            summary.push_str(&format!(
                "- Sectors outside the chart vocabulary: {}\n",
                report.unknown_sectors.join(", ")
            ));
        }

        if report.duplicate_keys.is_empty() {
            summary.push_str("- Duplicate keys: none\n");
        } else {
            summary.push_str(&format!(
                "\n⚠️  {} duplicate (region, sector, scenario, year) keys; their emissions are summed:\n",
                report.duplicate_keys.len()
            ));
            for dup in report.duplicate_keys.iter().take(self.max_listed_duplicates) {
                let year = dup
                    .year
                    .map(|y| y.to_string())
                    .unwrap_or_else(|| "-".to_string());
                summary.push_str(&format!(
                    "  {} / {} / {} / {}: {} rows\n",
                    dup.region, dup.sector, dup.scenario, year, dup.occurrences
                ));
            }
            if report.duplicate_keys.len() > self.max_listed_duplicates {
                summary.push_str(&format!(
                    "  ... and {} more\n",
                    report.duplicate_keys.len() - self.max_listed_duplicates
                ));
            }
        }

        summary
    }
}

impl Default for IntegrityChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmissionRecord;

    #[test]
    fn test_duplicate_keys_detected() {
        let table = EmissionTable::new(vec![
            EmissionRecord::new(Some(2030), "Agriculture", "Reference Case", "Ontario", Some(10.0)),
            EmissionRecord::new(Some(2030), "Agriculture", "Reference Case", "Ontario", Some(10.0)),
            EmissionRecord::new(Some(2030), "Agriculture", "Reference Case", "Quebec", Some(5.0)),
            EmissionRecord::new(Some(2035), "Agriculture", "Reference Case", "Ontario", Some(9.0)),
        ]);

        let checker = IntegrityChecker::new();
        let duplicates = checker.duplicate_keys(&table);

        assert_eq!(
            duplicates,
            vec![DuplicateKey {
                region: "Ontario".to_string(),
                sector: "Agriculture".to_string(),
                scenario: "Reference Case".to_string(),
                year: Some(2030),
                occurrences: 2,
            }]
        );
    }

    #[test]
    fn test_integrity_report() {
        let table = EmissionTable::new(vec![
            EmissionRecord::new(None, "Totals", "Reference Case", "Ontario", Some(1.0)),
            EmissionRecord::new(Some(2030), "Buildings", "Reference Case", "Ontario", None),
        ]);

        let checker = IntegrityChecker::new();
        let report = checker.check_integrity(&table);

        assert_eq!(report.total_records, 2);
        assert_eq!(report.null_years, 1);
        assert_eq!(report.null_emissions, 1);
        assert_eq!(report.unknown_sectors, vec!["Totals"]);
        assert!(report.duplicate_keys.is_empty());

        let summary = checker.generate_summary(&report);
        assert!(summary.contains("Total records: 2"));
        assert!(summary.contains("Duplicate keys: none"));
        assert!(summary.contains("Totals"));
    }

    #[test]
    fn test_summary_truncates_duplicate_listing() {
        let mut records = Vec::new();
        for year in 2020..2025 {
            for _ in 0..2 {
                records.push(EmissionRecord::new(Some(year), "Buildings", "Reference Case", "Yukon", Some(0.1)));
            }
        }
        let table = EmissionTable::new(records);
        let checker = IntegrityChecker::with_max_listed_duplicates(2);
        let report = checker.check_integrity(&table);

        assert_eq!(report.duplicate_keys.len(), 5);
        assert!(checker.generate_summary(&report).contains("... and 3 more"));
    }
}
