use std::collections::{BTreeMap, HashMap};

use crate::models::{
    EmissionRecord, EmissionTable, RegionTotal, Sector, SectorTotal, SectorYearTotal, Selection,
    YearTotal,
};

// Every query drops rows with a null year or null emissions before summing.
// Duplicate (region, sector, scenario, year) keys are summed as-is; see
// `IntegrityChecker::duplicate_keys` for detecting them.

fn in_scenario_and_region<'a>(
    selection: &'a Selection,
) -> impl Fn(&&EmissionRecord) -> bool + 'a {
    move |r| r.scenario == selection.scenario && selection.region.matches(&r.region)
}

/// Total emissions per year for the selected scenario, region and sector.
/// Sector labels outside the vocabulary are included.
pub fn trend(table: &EmissionTable, selection: &Selection) -> Vec<YearTotal> {
    let mut totals: BTreeMap<i32, f64> = BTreeMap::new();
    for record in table
        .records()
        .iter()
        .filter(in_scenario_and_region(selection))
        .filter(|r| selection.sector.matches(&r.sector))
    {
        if let Some((year, value)) = record.value_point() {
            *totals.entry(year).or_insert(0.0) += value;
        }
    }

    totals
        .into_iter()
        .map(|(year, emissions)| YearTotal { year, emissions })
        .collect()
}

/// Emissions per (year, sector) for the selected scenario and region,
/// restricted to the sector vocabulary. Ordered by year, then sector order.
pub fn sector_breakdown(table: &EmissionTable, selection: &Selection) -> Vec<SectorYearTotal> {
    let mut totals: BTreeMap<(i32, Sector), f64> = BTreeMap::new();
    let keep = in_scenario_and_region(selection);
    for entry in table.sector_records() {
        if !keep(&entry.record) {
            continue;
        }
        if let Some((year, value)) = entry.record.value_point() {
            *totals.entry((year, entry.sector)).or_insert(0.0) += value;
        }
    }

    totals
        .into_iter()
        .map(|((year, sector), emissions)| SectorYearTotal {
            year,
            sector,
            emissions,
        })
        .collect()
}

/// Emissions per sector for the selected scenario and region in the selected year.
pub fn sector_snapshot(table: &EmissionTable, selection: &Selection) -> Vec<SectorTotal> {
    let mut totals: BTreeMap<Sector, f64> = BTreeMap::new();
    let keep = in_scenario_and_region(selection);
    for entry in table.sector_records() {
        if !keep(&entry.record) {
            continue;
        }
        match entry.record.value_point() {
            Some((year, value)) if year == selection.year => {
                *totals.entry(entry.sector).or_insert(0.0) += value;
            }
            _ => {}
        }
    }

    totals
        .into_iter()
        .map(|(sector, emissions)| SectorTotal { sector, emissions })
        .collect()
}

/// Emissions per region for the selected scenario in the selected year,
/// all sectors, largest first. Ties are ordered by region name.
pub fn region_snapshot(table: &EmissionTable, selection: &Selection) -> Vec<RegionTotal> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for record in table
        .records()
        .iter()
        .filter(|r| r.scenario == selection.scenario)
    {
        match record.value_point() {
            Some((year, value)) if year == selection.year => {
                *totals.entry(record.region.as_str()).or_insert(0.0) += value;
            }
            _ => {}
        }
    }

    let mut regions: Vec<RegionTotal> = totals
        .into_iter()
        .map(|(region, emissions)| RegionTotal {
            region: region.to_string(),
            emissions,
        })
        .collect();
    regions.sort_by(|a, b| {
        b.emissions
            .total_cmp(&a.emissions)
            .then_with(|| a.region.cmp(&b.region))
    });
    regions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RegionFilter, SectorFilter};

    const REF: &str = "Reference Case";
    const ADD: &str = "Additional Measures Case";

    fn record(year: i32, sector: &str, scenario: &str, region: &str, value: f64) -> EmissionRecord {
        EmissionRecord::new(Some(year), sector, scenario, region, Some(value))
    }

    fn table() -> EmissionTable {
        EmissionTable::new(vec![
            record(2030, "Agriculture", REF, "Ontario", 10.0),
            record(2030, "Agriculture", REF, "Quebec", 5.0),
            record(2030, "Buildings", REF, "Ontario", 3.0),
            record(2035, "Agriculture", REF, "Ontario", 9.0),
            record(2030, "Totals", REF, "Ontario", 13.0),
            record(2030, "Agriculture", ADD, "Ontario", 7.0),
            EmissionRecord::new(None, "Agriculture", REF, "Ontario", Some(100.0)),
            EmissionRecord::new(Some(2030), "Electricity", REF, "Quebec", None),
        ])
    }

    #[test]
    fn test_trend_sums_across_regions() {
        let selection = Selection::new(REF, 2030)
            .with_sector(SectorFilter::Only("Agriculture".to_string()));
        let trend = trend(&table(), &selection);

        assert_eq!(
            trend,
            vec![
                YearTotal { year: 2030, emissions: 15.0 },
                YearTotal { year: 2035, emissions: 9.0 },
            ]
        );
    }

    #[test]
    fn test_trend_includes_unrestricted_sectors() {
        let selection = Selection::new(REF, 2030)
            .with_region(RegionFilter::Only("Ontario".to_string()));
        let trend = trend(&table(), &selection);

        // Agriculture 10 + Buildings 3 + Totals 13
        assert_eq!(trend[0], YearTotal { year: 2030, emissions: 26.0 });
    }

    #[test]
    fn test_sector_breakdown_excludes_unknown_sectors() {
        let selection = Selection::new(REF, 2030)
            .with_region(RegionFilter::Only("Ontario".to_string()));
        let breakdown = sector_breakdown(&table(), &selection);

        assert_eq!(
            breakdown,
            vec![
                SectorYearTotal { year: 2030, sector: Sector::Agriculture, emissions: 10.0 },
                SectorYearTotal { year: 2030, sector: Sector::Buildings, emissions: 3.0 },
                SectorYearTotal { year: 2035, sector: Sector::Agriculture, emissions: 9.0 },
            ]
        );
    }

    #[test]
    fn test_sector_breakdown_empty_for_unknown_scenario() {
        let selection = Selection::new("Net Zero", 2030);
        assert!(sector_breakdown(&table(), &selection).is_empty());
    }

    #[test]
    fn test_sector_snapshot_for_year() {
        let selection = Selection::new(REF, 2030);
        let snapshot = sector_snapshot(&table(), &selection);

        assert_eq!(
            snapshot,
            vec![
                SectorTotal { sector: Sector::Agriculture, emissions: 15.0 },
                SectorTotal { sector: Sector::Buildings, emissions: 3.0 },
            ]
        );
    }

    #[test]
    fn test_region_snapshot_sorted_descending() {
        let selection = Selection::new(REF, 2030)
            .with_region(RegionFilter::Only("Quebec".to_string()));
        let regions = region_snapshot(&table(), &selection);

        // Region filter does not apply to the region snapshot
        assert_eq!(
            regions,
            vec![
                RegionTotal { region: "Ontario".to_string(), emissions: 26.0 },
                RegionTotal { region: "Quebec".to_string(), emissions: 5.0 },
            ]
        );
    }

    #[test]
    fn test_region_snapshot_ties_by_name() {
        let table = EmissionTable::new(vec![
            record(2030, "Agriculture", REF, "Yukon", 1.0),
            record(2030, "Agriculture", REF, "Alberta", 1.0),
        ]);
        let regions = region_snapshot(&table, &Selection::new(REF, 2030));
        assert_eq!(regions[0].region, "Alberta");
        assert_eq!(regions[1].region, "Yukon");
    }

    #[test]
    fn test_duplicate_keys_are_summed() {
        let table = EmissionTable::new(vec![
            record(2030, "Agriculture", REF, "Ontario", 10.0),
            record(2030, "Agriculture", REF, "Ontario", 10.0),
        ]);
        let trend = trend(&table, &Selection::new(REF, 2030));
        assert_eq!(trend, vec![YearTotal { year: 2030, emissions: 20.0 }]);
    }
}
