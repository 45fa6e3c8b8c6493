//! Delimited-file reading with schema validation
//!
//! The loaders declare what they expect; this module checks the file
//! against it. Files with a header row are projected by column name, so
//! column order in the file does not matter and a missing expected column
//! fails fast. Headerless files (GeoNames) are projected positionally.

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;

use crate::error::util::safe_open_file;
use crate::error::{PanelError, Result};

/// Read the header row of a delimited file as a list of column names
fn read_header(path: &Path, source_name: &str, delimiter: u8) -> Result<Vec<String>> {
    let file = safe_open_file(path, source_name)?;
    let mut line = String::new();
    BufReader::new(file)
        .read_line(&mut line)
        .with_context(|| format!("failed to read header of {}", path.display()))?;

    let line = line.trim_start_matches('\u{feff}').trim_end_matches(['\r', '\n']);
    if line.is_empty() {
        return Err(PanelError::load(
            source_name,
            format!("{} is empty, expected a header row", path.display()),
        ));
    }

    Ok(line
        .split(delimiter as char)
        .map(|name| name.trim().trim_matches('"').to_string())
        .collect())
}

/// Read a delimited file with a header row, projecting the expected
/// columns by name.
///
/// The output batch's columns appear in the expected schema's order,
/// regardless of their order in the file. Extra file columns are ignored;
/// a missing expected column is a `Schema` error.
pub fn read_delimited(
    path: &Path,
    source_name: &str,
    expected: &SchemaRef,
    delimiter: u8,
) -> Result<RecordBatch> {
    let header = read_header(path, source_name, delimiter)?;

    let mut projection = Vec::with_capacity(expected.fields().len());
    for field in expected.fields() {
        match header.iter().position(|name| name == field.name()) {
            Some(idx) => projection.push(idx),
            None => {
                return Err(PanelError::schema(
                    source_name,
                    format!(
                        "expected column '{}' absent from {} (found: {})",
                        field.name(),
                        path.display(),
                        header.join(", ")
                    ),
                ));
            }
        }
    }

    // Full positional schema for the reader: declared types where we
    // project, Utf8 for columns we skip
    let file_fields: Vec<Field> = header
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            match projection.iter().position(|&p| p == idx) {
                Some(expected_idx) => {
                    let declared = expected.field(expected_idx);
                    Field::new(
                        name.clone(),
                        declared.data_type().clone(),
                        declared.is_nullable(),
                    )
                }
                None => Field::new(name.clone(), DataType::Utf8, true),
            }
        })
        .collect();

    read_with(
        path,
        source_name,
        Arc::new(Schema::new(file_fields)),
        projection,
        delimiter,
        true,
    )
}

/// Read a headerless delimited file with a full positional schema,
/// keeping only the projected columns.
pub fn read_delimited_positional(
    path: &Path,
    source_name: &str,
    file_schema: SchemaRef,
    projection: Vec<usize>,
    delimiter: u8,
) -> Result<RecordBatch> {
    read_with(path, source_name, file_schema, projection, delimiter, false)
}

fn read_with(
    path: &Path,
    source_name: &str,
    file_schema: SchemaRef,
    projection: Vec<usize>,
    delimiter: u8,
    has_header: bool,
) -> Result<RecordBatch> {
    let file = safe_open_file(path, source_name)?;

    let out_fields: Vec<Field> = projection
        .iter()
        .map(|&idx| file_schema.field(idx).clone())
        .collect();
    let out_schema = Arc::new(Schema::new(out_fields));

    let reader = ReaderBuilder::new(file_schema)
        .with_header(has_header)
        .with_delimiter(delimiter)
        .with_projection(projection)
        .build(file)
        .with_context(|| format!("failed to open reader for {}", path.display()))?;

    let mut batches = Vec::new();
    for batch in reader {
        let batch =
            batch.with_context(|| format!("malformed row in {}", path.display()))?;
        batches.push(batch);
    }

    let combined = arrow::compute::concat_batches(&out_schema, &batches)
        .with_context(|| format!("failed to combine batches from {}", path.display()))?;

    log::debug!(
        "{source_name}: read {} rows x {} columns from {}",
        combined.num_rows(),
        combined.num_columns(),
        path.display()
    );
    Ok(combined)
}
