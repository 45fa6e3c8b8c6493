//! Arrow utility functions for cell extraction and column downcasting
//!
//! The pipeline stages work row-wise over typed Arrow arrays; these helpers
//! centralize the downcasting and null handling so the stages stay readable.

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;

use crate::error::{PanelError, Result};

/// Extract a string value from an Arrow array at the specified index, handling nulls
///
/// # Returns
/// `Some(String)` if the value exists and is not null, otherwise `None`
pub fn string_value(array: &ArrayRef, index: usize) -> Option<String> {
    if array.is_null(index) {
        return None;
    }

    match array.data_type() {
        DataType::Utf8 => {
            let string_array = array.as_any().downcast_ref::<StringArray>()?;
            Some(string_array.value(index).to_string())
        }
        _ => None,
    }
}

/// Extract an f64 value from an Arrow array at the specified index, handling nulls
///
/// Integer columns widen to f64 so numeric derivations can treat counts and
/// currency uniformly.
pub fn f64_value(array: &ArrayRef, index: usize) -> Option<f64> {
    if array.is_null(index) {
        return None;
    }

    match array.data_type() {
        DataType::Float64 => {
            let float_array = array.as_any().downcast_ref::<Float64Array>()?;
            Some(float_array.value(index))
        }
        DataType::Int64 => {
            let int_array = array.as_any().downcast_ref::<Int64Array>()?;
            Some(int_array.value(index) as f64)
        }
        _ => None,
    }
}

/// Extract an i64 value from an Arrow array at the specified index, handling nulls
pub fn i64_value(array: &ArrayRef, index: usize) -> Option<i64> {
    if array.is_null(index) {
        return None;
    }

    match array.data_type() {
        DataType::Int64 => {
            let int_array = array.as_any().downcast_ref::<Int64Array>()?;
            Some(int_array.value(index))
        }
        DataType::Float64 => {
            let float_array = array.as_any().downcast_ref::<Float64Array>()?;
            Some(float_array.value(index) as i64)
        }
        _ => None,
    }
}

/// Look up a column by name and downcast it to `Float64Array`
///
/// Integer-typed columns are not silently widened here; derivations that
/// need to accept both go through [`f64_value`] instead.
pub fn float_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array> {
    let idx = batch.schema().index_of(name)?;
    let col = batch.column(idx);
    col.as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| {
            PanelError::schema(
                "panel",
                format!(
                    "column '{name}' has type {}, expected Float64",
                    col.data_type()
                ),
            )
        })
}

/// Look up a column by name, returning the untyped array reference
pub fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    let idx = batch.schema().index_of(name)?;
    Ok(batch.column(idx))
}

/// Number of non-null cells in a row, used to pick the most complete record
/// among duplicates
pub fn row_completeness(batch: &RecordBatch, row: usize) -> usize {
    batch
        .columns()
        .iter()
        .filter(|col| !col.is_null(row))
        .count()
}
