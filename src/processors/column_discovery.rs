use serde::Serialize;
use std::fmt;

/// Semantic columns looked for in a workbook of unknown layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SemanticField {
    Year,
    Value,
    Scenario,
    Sector,
    DetailType,
}

impl SemanticField {
    pub fn label(&self) -> &'static str {
        match self {
            SemanticField::Year => "year",
            SemanticField::Value => "value",
            SemanticField::Scenario => "scenario",
            SemanticField::Sector => "sector/total",
            SemanticField::DetailType => "detail type",
        }
    }

    /// Fields the national trend cannot be built without.
    pub fn is_required(&self) -> bool {
        matches!(self, SemanticField::Year | SemanticField::Value)
    }
}

impl fmt::Display for SemanticField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Keywords for one field, tried in order.
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryRule {
    pub field: SemanticField,
    pub keywords: &'static [&'static str],
}

/// Rules in resolution order. A column claimed by an earlier rule is not
/// offered to later ones.
pub const NATIONAL_RULES: &[DiscoveryRule] = &[
    DiscoveryRule {
        field: SemanticField::Year,
        keywords: &["year"],
    },
    DiscoveryRule {
        field: SemanticField::Value,
        keywords: &["emission", "megaton", "mt"],
    },
    DiscoveryRule {
        field: SemanticField::Scenario,
        keywords: &["scenario", "case"],
    },
    DiscoveryRule {
        field: SemanticField::Sector,
        keywords: &["sector", "category", "total"],
    },
    DiscoveryRule {
        field: SemanticField::DetailType,
        keywords: &["detail", "type"],
    },
];

/// Result of one rule: the matched header, or what was tried.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnMatch {
    pub field: SemanticField,
    pub column: Option<String>,
    pub keyword: Option<&'static str>,
    pub tried: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscoveryReport {
    pub headers: Vec<String>,
    pub matches: Vec<ColumnMatch>,
}

impl DiscoveryReport {
    pub fn column(&self, field: SemanticField) -> Option<&str> {
        self.matches
            .iter()
            .find(|m| m.field == field)
            .and_then(|m| m.column.as_deref())
    }

    /// Index of the discovered column in `headers`.
    pub fn column_index(&self, field: SemanticField) -> Option<usize> {
        let column = self.column(field)?;
        self.headers.iter().position(|h| h == column)
    }

    pub fn missing_required(&self) -> Vec<SemanticField> {
        self.matches
            .iter()
            .filter(|m| m.field.is_required() && m.column.is_none())
            .map(|m| m.field)
            .collect()
    }

    pub fn summary(&self) -> String {
        let lines: Vec<String> = self
            .matches
            .iter()
            .map(|m| match (&m.column, m.keyword) {
                (Some(column), Some(keyword)) => {
                    format!("- {}: '{}' (matched \"{}\")", m.field, column, keyword)
                }
                _ => format!("- {}: not found (tried {})", m.field, m.tried.join(", ")),
            })
            .collect();
        format!("Column Discovery:\n{}", lines.join("\n"))
    }
}

/// Run `rules` against `headers`, case-insensitively.
pub fn discover_columns(headers: &[String], rules: &[DiscoveryRule]) -> DiscoveryReport {
    let lowered: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
    let mut claimed = vec![false; headers.len()];
    let mut matches = Vec::with_capacity(rules.len());

    for rule in rules {
        let mut found = None;
        for keyword in rule.keywords {
            let hit = lowered
                .iter()
                .enumerate()
                .find(|(idx, header)| !claimed[*idx] && header.contains(keyword));
            if let Some((idx, _)) = hit {
                found = Some((idx, *keyword));
                break;
            }
        }

        let column_match = match found {
            Some((idx, keyword)) => {
                claimed[idx] = true;
                ColumnMatch {
                    field: rule.field,
                    column: Some(headers[idx].clone()),
                    keyword: Some(keyword),
                    tried: rule.keywords.to_vec(),
                }
            }
            None => ColumnMatch {
                field: rule.field,
                column: None,
                keyword: None,
                tried: rule.keywords.to_vec(),
            },
        };
        matches.push(column_match);
    }

    DiscoveryReport {
        headers: headers.to_vec(),
        matches,
    }
}

/// Longest name containing `keyword` (trimmed, case-insensitive). Equal
/// lengths resolve to the earliest candidate.
pub fn longest_match<'a, S: AsRef<str>>(candidates: &'a [S], keyword: &str) -> Option<&'a str> {
    let keyword = keyword.to_lowercase();
    let mut best: Option<&'a str> = None;
    for candidate in candidates {
        let name = candidate.as_ref();
        if !name.trim().to_lowercase().contains(&keyword) {
            continue;
        }
        match best {
            Some(current) if current.trim().len() >= name.trim().len() => {}
            _ => best = Some(name),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_discovers_national_columns() {
        let report = discover_columns(
            &headers(&["Year", "Scenario", "Sector / Total", "Emissions (Mt CO2e)", "Detail type"]),
            NATIONAL_RULES,
        );

        assert_eq!(report.column(SemanticField::Year), Some("Year"));
        assert_eq!(report.column(SemanticField::Value), Some("Emissions (Mt CO2e)"));
        assert_eq!(report.column(SemanticField::Scenario), Some("Scenario"));
        assert_eq!(report.column(SemanticField::Sector), Some("Sector / Total"));
        assert_eq!(report.column(SemanticField::DetailType), Some("Detail type"));
        assert!(report.missing_required().is_empty());
        assert_eq!(report.column_index(SemanticField::Value), Some(3));
    }

    #[test]
    fn test_value_keywords_in_priority_order() {
        // "megaton" outranks "mt" even though the "mt" column comes first
        let report = discover_columns(&headers(&["Yr", "Amt", "Megatonnes"]), NATIONAL_RULES);
        assert_eq!(report.column(SemanticField::Value), Some("Megatonnes"));
        assert_eq!(report.column(SemanticField::Year), None);
    }

    #[test]
    fn test_claimed_column_is_not_reused() {
        // "Total emissions" is the value column, so it cannot also be the sector column
        let report = discover_columns(&headers(&["Year", "Total emissions"]), NATIONAL_RULES);
        assert_eq!(report.column(SemanticField::Value), Some("Total emissions"));
        assert_eq!(report.column(SemanticField::Sector), None);
    }

    #[test]
    fn test_missing_required_fields_are_reported() {
        let report = discover_columns(&headers(&["Scenario", "Value"]), NATIONAL_RULES);
        assert_eq!(
            report.missing_required(),
            vec![SemanticField::Year, SemanticField::Value]
        );
        let summary = report.summary();
        assert!(summary.contains("year: not found (tried year)"));
        assert!(summary.contains("value: not found (tried emission, megaton, mt)"));
    }

    #[test]
    fn test_longest_match_tie_break() {
        let names = headers(&["Reference Case", "Reference Case (Detailed)", "Additional Measures Case"]);
        assert_eq!(longest_match(&names, "reference"), Some("Reference Case (Detailed)"));
        assert_eq!(longest_match(&names, "ADDITIONAL"), Some("Additional Measures Case"));
        assert_eq!(longest_match(&names, "net zero"), None);

        let equal = headers(&["Reference A", "Reference B"]);
        assert_eq!(longest_match(&equal, "reference"), Some("Reference A"));
    }
}
