//! Left-outer joins onto the authoritative financial table
//!
//! The financial table defines the panel's row set; employment and
//! geographic columns are taken into it. Cardinality is invariant: one
//! output row per authoritative row, always. Duplicate keys in the
//! authoritative table are a data-integrity error, never silently
//! deduplicated; duplicate keys in a joined source are resolved by keeping
//! the most complete row and counting the drops.

use std::sync::Arc;

use arrow::array::{ArrayRef, UInt32Array};
use arrow::compute::take;
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashMap;

use crate::error::{PanelError, Result};
use crate::report::QualityReport;
use crate::utils;

// Unit separator; cannot appear in city names, years or FIPS codes
const KEY_SEP: char = '\u{1f}';

/// Composite join key for a row, `None` when any component is null
fn composite_key(columns: &[&ArrayRef], row: usize) -> Option<String> {
    let mut key = String::new();
    for (i, col) in columns.iter().enumerate() {
        if i > 0 {
            key.push(KEY_SEP);
        }
        if let Some(text) = utils::string_value(col, row) {
            key.push_str(&text);
        } else if let Some(int) = utils::i64_value(col, row) {
            key.push_str(&int.to_string());
        } else {
            return None;
        }
    }
    Some(key)
}

fn key_columns<'a>(batch: &'a RecordBatch, names: &[&str]) -> Result<Vec<&'a ArrayRef>> {
    names
        .iter()
        .map(|name| utils::column(batch, name))
        .collect()
}

/// Append `right`'s non-key columns to `left`, row-aligned by `indices`.
///
/// A `None` index leaves that row's appended cells null. Name collisions
/// with existing left columns are suffixed with the right source's name so
/// every output column still traces to exactly one source.
pub fn attach_rows(
    left: &RecordBatch,
    right: &RecordBatch,
    indices: &[Option<u32>],
    skip_columns: &[&str],
    right_name: &str,
) -> Result<RecordBatch> {
    if indices.len() != left.num_rows() {
        return Err(PanelError::JoinKey(format!(
            "index vector covers {} rows but the authoritative table has {}",
            indices.len(),
            left.num_rows()
        )));
    }

    let index_array = UInt32Array::from(indices.to_vec());
    let left_schema = left.schema();

    let mut fields: Vec<Field> = left_schema
        .fields()
        .iter()
        .map(|f| f.as_ref().clone())
        .collect();
    let mut columns: Vec<ArrayRef> = left.columns().to_vec();

    for (idx, field) in right.schema().fields().iter().enumerate() {
        if skip_columns.contains(&field.name().as_str()) {
            continue;
        }

        let name = if left_schema.index_of(field.name()).is_ok() {
            let renamed = format!("{}_{right_name}", field.name());
            log::warn!(
                "column '{}' from {right_name} collides with the panel; renamed to '{renamed}'",
                field.name()
            );
            renamed
        } else {
            field.name().clone()
        };

        let taken = take(right.column(idx).as_ref(), &index_array, None)?;
        // Unmatched rows are null regardless of the source's nullability
        fields.push(Field::new(name, field.data_type().clone(), true));
        columns.push(taken);
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Left-outer equi-join of `right` onto the authoritative `left`.
///
/// `left_keys` and `right_keys` pair up positionally. Right-side key
/// columns are not duplicated into the output. Authoritative rows with no
/// match keep nulls in the joined columns and are counted per source.
///
/// # Errors
/// `JoinKey` when the authoritative table holds duplicate keys, or when a
/// key column is missing from either side.
pub fn left_join(
    left: &RecordBatch,
    right: &RecordBatch,
    left_keys: &[&str],
    right_keys: &[&str],
    right_name: &str,
    report: &mut QualityReport,
) -> Result<RecordBatch> {
    if left_keys.len() != right_keys.len() || left_keys.is_empty() {
        return Err(PanelError::JoinKey(format!(
            "key lists must pair up: {left_keys:?} vs {right_keys:?}"
        )));
    }

    let left_cols = key_columns(left, left_keys)?;
    let right_cols = key_columns(right, right_keys)?;

    // The authoritative side must be unique per key
    let mut seen: FxHashMap<String, usize> = FxHashMap::default();
    for row in 0..left.num_rows() {
        if let Some(key) = composite_key(&left_cols, row)
            && let Some(previous) = seen.insert(key, row)
        {
            return Err(PanelError::JoinKey(format!(
                "authoritative table has duplicate key {:?} (rows {previous} and {row})",
                left_keys
                    .iter()
                    .zip(&left_cols)
                    .map(|(name, col)| format!(
                        "{name}={}",
                        utils::string_value(col, row)
                            .or_else(|| utils::i64_value(col, row).map(|v| v.to_string()))
                            .unwrap_or_default()
                    ))
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }
    }

    // Right side: most complete row wins among duplicates
    let mut right_index: FxHashMap<String, usize> = FxHashMap::default();
    let mut dropped = 0usize;
    for row in 0..right.num_rows() {
        let Some(key) = composite_key(&right_cols, row) else {
            continue;
        };
        match right_index.entry(key) {
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(row);
            }
            std::collections::hash_map::Entry::Occupied(mut slot) => {
                dropped += 1;
                if utils::row_completeness(right, row) > utils::row_completeness(right, *slot.get())
                {
                    slot.insert(row);
                }
            }
        }
    }
    if dropped > 0 {
        log::warn!("{right_name}: dropped {dropped} duplicate-keyed rows (kept most complete)");
        report.duplicate_source_rows_dropped += dropped;
    }

    let mut unmatched = 0usize;
    let indices: Vec<Option<u32>> = (0..left.num_rows())
        .map(|row| {
            let matched = composite_key(&left_cols, row)
                .and_then(|key| right_index.get(&key))
                .map(|&idx| idx as u32);
            if matched.is_none() {
                unmatched += 1;
            }
            matched
        })
        .collect();
    if unmatched > 0 {
        log::info!("{right_name}: {unmatched} authoritative rows unmatched; joined columns null");
        report.note_unmatched(right_name, unmatched);
    }

    attach_rows(left, right, &indices, right_keys, right_name)
}
