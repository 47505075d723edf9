use crate::error::{ProcessingError, Result};
use crate::models::{EmissionRecord, EmissionTable};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::{Array, Float64Array, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel, ZstdLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::debug;

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(ProcessingError::Config(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size;
        self
    }

    /// Write the long-format table. The file is written next to `path` and
    /// renamed into place, so a failed export never leaves a partial file.
    pub fn write_table(&self, table: &EmissionTable, path: &Path) -> Result<()> {
        let schema = Self::schema();
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let temp = NamedTempFile::new_in(dir)?;
        let mut writer = ArrowWriter::try_new(temp.reopen()?, schema.clone(), Some(props))?;

        for chunk in table.records().chunks(self.row_group_size.max(1)) {
            let batch = Self::records_to_batch(chunk, schema.clone())?;
            writer.write(&batch)?;
        }
        writer.close()?;

        temp.persist(path).map_err(|e| ProcessingError::Io(e.error))?;
        debug!(rows = table.len(), path = %path.display(), "Wrote parquet export");
        Ok(())
    }

    /// Column layout of the export; year and emissions are nullable.
    pub fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("year", DataType::Int32, true),
            Field::new("sector", DataType::Utf8, false),
            Field::new("scenario", DataType::Utf8, false),
            Field::new("region", DataType::Utf8, false),
            Field::new("emissions", DataType::Float64, true),
        ]))
    }

    fn records_to_batch(records: &[EmissionRecord], schema: Arc<Schema>) -> Result<RecordBatch> {
        let years: Int32Array = records.iter().map(|r| r.year).collect();
        let sectors = StringArray::from_iter_values(records.iter().map(|r| r.sector.as_str()));
        let scenarios = StringArray::from_iter_values(records.iter().map(|r| r.scenario.as_str()));
        let regions = StringArray::from_iter_values(records.iter().map(|r| r.region.as_str()));
        let emissions: Float64Array = records.iter().map(|r| r.emissions).collect();

        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(years),
                Arc::new(sectors),
                Arc::new(scenarios),
                Arc::new(regions),
                Arc::new(emissions),
            ],
        )?;

        Ok(batch)
    }

    /// Read an export back into records.
    pub fn read_table(&self, path: &Path) -> Result<EmissionTable> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let file = File::open(path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

        let mut records = Vec::new();
        for batch in reader {
            let batch = batch?;
            let years = downcast::<Int32Array>(&batch, 0, "year")?;
            let sectors = downcast::<StringArray>(&batch, 1, "sector")?;
            let scenarios = downcast::<StringArray>(&batch, 2, "scenario")?;
            let regions = downcast::<StringArray>(&batch, 3, "region")?;
            let emissions = downcast::<Float64Array>(&batch, 4, "emissions")?;

            for i in 0..batch.num_rows() {
                records.push(EmissionRecord::new(
                    (!years.is_null(i)).then(|| years.value(i)),
                    sectors.value(i),
                    scenarios.value(i),
                    regions.value(i),
                    (!emissions.is_null(i)).then(|| emissions.value(i)),
                ));
            }
        }

        Ok(EmissionTable::new(records))
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let row_groups = metadata.num_row_groups();
        let total_rows = metadata.file_metadata().num_rows();
        let file_size = std::fs::metadata(path)?.len();

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            file_size,
            compression: self.compression,
        })
    }
}

fn downcast<'a, T: 'static>(batch: &'a RecordBatch, idx: usize, name: &str) -> Result<&'a T> {
    batch
        .column(idx)
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| ProcessingError::InvalidFormat(format!("Invalid {} column type", name)))
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} KB\n\
            - Compression: {:?}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1024.0,
            self.compression,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn table() -> EmissionTable {
        EmissionTable::new(vec![
            EmissionRecord::new(Some(2030), "Agriculture", "Reference Case", "Ontario", Some(10.0)),
            EmissionRecord::new(None, "Buildings", "Reference Case", "Ontario", Some(1.5)),
            EmissionRecord::new(Some(2031), "Totals", "Reference Case", "Quebec", None),
        ])
    }

    #[test]
    fn test_write_and_read_back_preserves_nulls() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("emissions.parquet");
        let writer = ParquetWriter::new();

        writer.write_table(&table(), &path)?;
        let read = writer.read_table(&path)?;

        assert_eq!(read.records(), table().records());
        Ok(())
    }

    #[test]
    fn test_row_groups_follow_configured_size() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join("emissions.parquet");
        let writer = ParquetWriter::new().with_row_group_size(2);

        writer.write_table(&table(), &path)?;
        let info = writer.get_file_info(&path)?;

        assert_eq!(info.total_rows, 3);
        assert_eq!(info.row_groups, 2);
        assert!(info.summary().contains("Total rows: 3"));
        Ok(())
    }

    #[test]
    fn test_different_compressions() -> Result<()> {
        let dir = TempDir::new()?;
        for compression in ["snappy", "gzip", "lz4", "zstd", "none"] {
            let writer = ParquetWriter::new().with_compression(compression)?;
            let path = dir.path().join(format!("{}.parquet", compression));
            let result = writer.write_table(&table(), &path);
            assert!(result.is_ok(), "Failed with compression: {}", compression);
        }
        Ok(())
    }

    #[test]
    fn test_unknown_compression_rejected() {
        assert!(ParquetWriter::new().with_compression("brotli-max").is_err());
    }
}
