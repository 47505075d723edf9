pub mod cache;
pub mod emissions_reader;
pub mod national_reader;
pub mod workbook_reader;

pub use cache::WorkbookCache;
pub use emissions_reader::{EmissionsReader, LoadReport};
pub use national_reader::NationalReader;
pub use workbook_reader::{cell_from_data, concat_sheets, SheetTable, WorkbookReader};
