pub mod cell;
pub mod emission;
pub mod national;
pub mod selection;
pub mod table;
pub mod views;

pub use cell::CellValue;
pub use emission::{EmissionRecord, RawEmissionRow, Sector};
pub use national::{DetailType, NationalSummaryRecord, NationalTrendPoint};
pub use selection::{RegionFilter, SectorFilter, Selection};
pub use table::{EmissionTable, SectorRecord};
pub use views::{DeltaGrid, RegionTotal, SectorTotal, SectorYearTotal, YearTotal};
