//! In-memory fact source backed by Arrow record batches.

use arrow::record_batch::RecordBatch;
use arrow_schema::FieldRef;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_arrow::schema::{SchemaLike, TracingOptions};

use super::{FactSource, SourceFactory, Table, batch};
use crate::error::{IndexerError, Result};
use crate::scan::KeyWindow;

/// Fact source holding every table in memory
///
/// Cloning is cheap: record batches share their buffers.
#[derive(Debug, Clone, Default)]
pub struct MemoryFactSource {
    tables: FxHashMap<Table, Vec<RecordBatch>>,
}

impl MemoryFactSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a table with the given record batches
    pub fn insert_batches(&mut self, table: Table, batches: Vec<RecordBatch>) {
        self.tables.insert(table, batches);
    }

    /// Replace a table with rows converted to a single record batch
    pub fn insert_rows<T>(&mut self, table: Table, rows: &[T]) -> Result<()>
    where
        T: Serialize + DeserializeOwned,
    {
        let fields = Vec::<FieldRef>::from_type::<T>(TracingOptions::default().allow_null_fields(true))?;
        let batch = serde_arrow::to_record_batch(&fields, &rows)?;
        self.tables.insert(table, vec![batch]);
        Ok(())
    }

    /// Remove a table, making it unavailable
    pub fn remove(&mut self, table: Table) {
        self.tables.remove(&table);
    }

    /// Batches of a table, if present
    #[must_use]
    pub fn batches(&self, table: Table) -> Option<&[RecordBatch]> {
        self.tables.get(&table).map(Vec::as_slice)
    }

    fn table(&self, table: Table) -> Result<&[RecordBatch]> {
        self.batches(table)
            .ok_or_else(|| IndexerError::MissingTable(table.name().to_string()))
    }
}

impl FactSource for MemoryFactSource {
    fn has_table(&self, table: Table) -> bool {
        self.tables.contains_key(&table)
    }

    fn max_key(&self, table: Table, column: &str) -> Result<Option<i64>> {
        batch::max_key(table, self.table(table)?, column)
    }

    fn scan_range(&self, table: Table, column: &str, window: KeyWindow) -> Result<Vec<RecordBatch>> {
        self.table(table)?
            .iter()
            .map(|b| batch::filter_range(table, b, column, window))
            .filter(|b| b.as_ref().map_or(true, |b| b.num_rows() > 0))
            .collect()
    }

    fn scan_keys(
        &self,
        table: Table,
        column: &str,
        keys: &FxHashSet<i64>,
    ) -> Result<Vec<RecordBatch>> {
        self.table(table)?
            .iter()
            .map(|b| batch::filter_keys(table, b, column, keys))
            .filter(|b| b.as_ref().map_or(true, |b| b.num_rows() > 0))
            .collect()
    }

    fn scan_all(&self, table: Table) -> Result<Vec<RecordBatch>> {
        Ok(self.table(table)?.to_vec())
    }
}

impl SourceFactory for MemoryFactSource {
    fn open(&self) -> Result<Box<dyn FactSource>> {
        Ok(Box::new(self.clone()))
    }
}
