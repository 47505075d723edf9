pub mod chart_writer;
pub mod csv_writer;
pub mod parquet_writer;

pub use chart_writer::{ChartFormat, ChartWriter, RenderSummary};
pub use csv_writer::CsvWriter;
pub use parquet_writer::{ParquetFileInfo, ParquetWriter};
