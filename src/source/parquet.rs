//! Parquet-backed fact source.
//!
//! Each table lives in `<dir>/<table>.parquet`. Scans stream record batches
//! from the file and filter each one as it arrives, so only the rows of the
//! requested window are kept in memory.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use rustc_hash::FxHashSet;

use super::{FactSource, SourceFactory, Table, batch};
use crate::config::DEFAULT_SCAN_BATCH_SIZE;
use crate::error::{IndexerError, Result};
use crate::scan::KeyWindow;

/// Fact source reading one Parquet file per table
#[derive(Debug, Clone)]
pub struct ParquetFactSource {
    dir: PathBuf,
    batch_size: usize,
}

impl ParquetFactSource {
    /// Open a directory of Parquet tables
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(IndexerError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Directory does not exist: {}", dir.display()),
            )));
        }
        Ok(Self {
            dir,
            batch_size: DEFAULT_SCAN_BATCH_SIZE,
        })
    }

    /// Set the number of rows per record batch
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Path of the file backing a table
    #[must_use]
    pub fn table_path(&self, table: Table) -> PathBuf {
        table_path(&self.dir, table)
    }

    fn builder(&self, table: Table) -> Result<ParquetRecordBatchReaderBuilder<File>> {
        let path = self.table_path(table);
        if !path.is_file() {
            return Err(IndexerError::MissingTable(table.name().to_string()));
        }
        let file = File::open(&path)?;
        Ok(ParquetRecordBatchReaderBuilder::try_new(file)?.with_batch_size(self.batch_size))
    }

    fn reader(&self, table: Table) -> Result<ParquetRecordBatchReader> {
        Ok(self.builder(table)?.build()?)
    }

    /// Stream the table and keep the non-empty output of `keep` per batch
    fn scan_filtered<F>(&self, table: Table, keep: F) -> Result<Vec<RecordBatch>>
    where
        F: Fn(&RecordBatch) -> Result<RecordBatch>,
    {
        let start = Instant::now();
        let mut kept = Vec::new();
        for batch in self.reader(table)? {
            let filtered = keep(&batch?)?;
            if filtered.num_rows() > 0 {
                kept.push(filtered);
            }
        }
        log::trace!(
            "Scanned {} into {} batches in {:?}",
            table,
            kept.len(),
            start.elapsed()
        );
        Ok(kept)
    }
}

impl FactSource for ParquetFactSource {
    fn has_table(&self, table: Table) -> bool {
        self.table_path(table).is_file()
    }

    fn max_key(&self, table: Table, column: &str) -> Result<Option<i64>> {
        let builder = self.builder(table)?;
        let leaf = builder
            .parquet_schema()
            .columns()
            .iter()
            .position(|c| c.name() == column)
            .ok_or_else(|| {
                IndexerError::schema(table.name(), format!("missing key column {column}"))
            })?;
        let mask = ProjectionMask::leaves(builder.parquet_schema(), [leaf]);
        let reader = builder.with_projection(mask).build()?;
        let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
        batch::max_key(table, &batches, column)
    }

    fn scan_range(&self, table: Table, column: &str, window: KeyWindow) -> Result<Vec<RecordBatch>> {
        self.scan_filtered(table, |b| batch::filter_range(table, b, column, window))
    }

    fn scan_keys(
        &self,
        table: Table,
        column: &str,
        keys: &FxHashSet<i64>,
    ) -> Result<Vec<RecordBatch>> {
        self.scan_filtered(table, |b| batch::filter_keys(table, b, column, keys))
    }

    fn scan_all(&self, table: Table) -> Result<Vec<RecordBatch>> {
        self.scan_filtered(table, |b| Ok(b.clone()))
    }
}

impl SourceFactory for ParquetFactSource {
    fn open(&self) -> Result<Box<dyn FactSource>> {
        Ok(Box::new(self.clone()))
    }
}

fn table_path(dir: &Path, table: Table) -> PathBuf {
    dir.join(format!("{}.parquet", table.name()))
}

/// Write record batches as the Parquet file for `table` under `dir`
///
/// All batches must share a schema. Writing an empty slice is an error since
/// there is no schema to write.
pub fn write_table(dir: &Path, table: Table, batches: &[RecordBatch]) -> Result<PathBuf> {
    let first = batches.first().ok_or_else(|| {
        IndexerError::schema(table.name(), "cannot write a table without batches")
    })?;
    let path = table_path(dir, table);
    let file = File::create(&path)?;
    let mut writer = ArrowWriter::try_new(file, first.schema(), None)?;
    for batch in batches {
        writer.write(batch)?;
    }
    writer.close()?;
    Ok(path)
}
