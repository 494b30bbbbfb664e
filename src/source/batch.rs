//! Record batch filtering and row conversion shared by fact sources.

use arrow::array::{Array, ArrayRef, BooleanArray, Int64Array};
use arrow::compute::kernels::cmp::{gt, lt_eq};
use arrow::compute::{and, cast, filter_record_batch};
use arrow::record_batch::RecordBatch;
use arrow_schema::DataType;
use rustc_hash::FxHashSet;
use serde::de::DeserializeOwned;

use super::Table;
use crate::error::{IndexerError, Result};
use crate::scan::KeyWindow;

/// Integer view of a key column, casting narrower integer types to Int64
pub fn key_column(table: Table, batch: &RecordBatch, column: &str) -> Result<Int64Array> {
    let array: &ArrayRef = batch.column_by_name(column).ok_or_else(|| {
        IndexerError::schema(table.name(), format!("missing key column {column}"))
    })?;
    if !array.data_type().is_integer() {
        return Err(IndexerError::schema(
            table.name(),
            format!("{column} is {}, not an integer column", array.data_type()),
        ));
    }
    let values = cast(array, &DataType::Int64)?;
    values
        .as_any()
        .downcast_ref::<Int64Array>()
        .cloned()
        .ok_or_else(|| {
            IndexerError::schema(table.name(), format!("{column} is not an integer column"))
        })
}

/// Keep only rows whose key lies in `(window.start, window.end]`
pub fn filter_range(
    table: Table,
    batch: &RecordBatch,
    column: &str,
    window: KeyWindow,
) -> Result<RecordBatch> {
    let keys = key_column(table, batch, column)?;
    let lower = Int64Array::new_scalar(window.start);
    let upper = Int64Array::new_scalar(window.end);
    let mask = and(&gt(&keys, &lower)?, &lt_eq(&keys, &upper)?)?;
    Ok(filter_record_batch(batch, &mask)?)
}

/// Keep only rows whose key is in `keys`
pub fn filter_keys(
    table: Table,
    batch: &RecordBatch,
    column: &str,
    keys: &FxHashSet<i64>,
) -> Result<RecordBatch> {
    let column_values = key_column(table, batch, column)?;
    let mask: BooleanArray = column_values
        .iter()
        .map(|value| Some(value.is_some_and(|v| keys.contains(&v))))
        .collect();
    Ok(filter_record_batch(batch, &mask)?)
}

/// Largest non-null key across a set of batches
pub fn max_key(table: Table, batches: &[RecordBatch], column: &str) -> Result<Option<i64>> {
    let mut max = None;
    for batch in batches {
        let keys = key_column(table, batch, column)?;
        if let Some(value) = arrow::compute::max(&keys) {
            max = Some(max.map_or(value, |current: i64| current.max(value)));
        }
    }
    Ok(max)
}

/// Deserialize every batch into row structs, preserving row order
pub fn rows_from_batches<T: DeserializeOwned>(table: Table, batches: &[RecordBatch]) -> Result<Vec<T>> {
    let mut rows = Vec::with_capacity(batches.iter().map(RecordBatch::num_rows).sum());
    for batch in batches.iter().filter(|b| b.num_rows() > 0) {
        let mut decoded: Vec<T> = serde_arrow::from_record_batch(batch).map_err(|e| {
            IndexerError::schema(table.name(), format!("failed to deserialize rows: {e}"))
        })?;
        rows.append(&mut decoded);
    }
    Ok(rows)
}
