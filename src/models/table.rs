use std::collections::BTreeSet;

use crate::models::{EmissionRecord, Sector};

/// The normalized long-format table. Built once per load and never mutated;
/// queries derive new, smaller results from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmissionTable {
    records: Vec<EmissionRecord>,
}

/// A record that belongs to the fixed sector vocabulary.
#[derive(Debug, Clone, Copy)]
pub struct SectorRecord<'a> {
    pub sector: Sector,
    pub record: &'a EmissionRecord,
}

impl EmissionTable {
    pub fn new(records: Vec<EmissionRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[EmissionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct scenario names, sorted.
    pub fn scenarios(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.scenario.as_str()))
    }

    /// Distinct region names, sorted.
    pub fn regions(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.region.as_str()))
    }

    /// Distinct sector labels as they appear in the data, sorted.
    pub fn sectors(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.sector.as_str()))
    }

    /// Distinct non-null years, ascending.
    pub fn years(&self) -> Vec<i32> {
        self.records
            .iter()
            .filter_map(|r| r.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn year_range(&self) -> Option<(i32, i32)> {
        let mut years = self.records.iter().filter_map(|r| r.year);
        let first = years.next()?;
        Some(years.fold((first, first), |(lo, hi), y| (lo.min(y), hi.max(y))))
    }

    /// Sector-restricted view in canonical sector order. Records with a label
    /// outside the vocabulary are left out; the table itself keeps them.
    pub fn sector_records(&self) -> Vec<SectorRecord<'_>> {
        let mut restricted: Vec<SectorRecord<'_>> = self
            .records
            .iter()
            .filter_map(|record| {
                record
                    .known_sector()
                    .map(|sector| SectorRecord { sector, record })
            })
            .collect();
        restricted.sort_by_key(|r| r.sector.display_index());
        restricted
    }

    /// Sector labels present in the data but outside the vocabulary.
    pub fn unknown_sectors(&self) -> Vec<String> {
        distinct(
            self.records
                .iter()
                .filter(|r| r.known_sector().is_none())
                .map(|r| r.sector.as_str()),
        )
    }
}

impl From<Vec<EmissionRecord>> for EmissionTable {
    fn from(records: Vec<EmissionRecord>) -> Self {
        Self::new(records)
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
