pub mod aggregator;
pub mod column_discovery;
pub mod integrity_checker;
pub mod national_summary;
pub mod normalizer;
pub mod scenario_delta;

pub use aggregator::{region_snapshot, sector_breakdown, sector_snapshot, trend};
pub use column_discovery::{
    discover_columns, longest_match, ColumnMatch, DiscoveryReport, DiscoveryRule, SemanticField,
    NATIONAL_RULES,
};
pub use integrity_checker::{DuplicateKey, IntegrityChecker, IntegrityReport};
pub use national_summary::{canonical_scenario, NationalSummaryProcessor};
pub use normalizer::{coerce_emissions, coerce_year, Normalizer};
pub use scenario_delta::{locate_delta_scenarios, scenario_delta, DeltaUnavailable};
