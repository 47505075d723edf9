use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a national series comes from the detailed tables or a scenario summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DetailType {
    Detailed,
    ScenarioSummary,
    Unknown,
}

impl DetailType {
    pub fn label(&self) -> &'static str {
        match self {
            DetailType::Detailed => "Detailed",
            DetailType::ScenarioSummary => "Scenario summary",
            DetailType::Unknown => "Unknown",
        }
    }

    /// Classify free text by substring: "detailed" wins over "summary".
    pub fn infer(text: &str) -> Self {
        let lowered = text.to_lowercase();
        if lowered.contains("detailed") {
            DetailType::Detailed
        } else if lowered.contains("summary") {
            DetailType::ScenarioSummary
        } else {
            DetailType::Unknown
        }
    }
}

impl fmt::Display for DetailType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the secondary workbook after column discovery. Year and
/// value are null when the cell was not numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NationalSummaryRecord {
    pub year: Option<i32>,
    pub value: Option<f64>,
    pub scenario_label: String,
    pub sector_or_total: Option<String>,
    pub detail_type: DetailType,
}

/// Grouped national series point: Σvalue by (year, scenario, detail type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NationalTrendPoint {
    pub year: i32,
    pub scenario: String,
    pub detail_type: DetailType,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_type_inference() {
        assert_eq!(DetailType::infer("Reference Case (Detailed)"), DetailType::Detailed);
        assert_eq!(DetailType::infer("Scenario Summary"), DetailType::ScenarioSummary);
        assert_eq!(DetailType::infer("Reference Case"), DetailType::Unknown);
        assert_eq!(DetailType::infer(""), DetailType::Unknown);
    }
}
