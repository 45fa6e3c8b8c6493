//! Flat-file export of the finished panel
//!
//! The panel is an in-memory table consumed by external statistical
//! tooling; exporting it is optional and writes a single CSV with a
//! header row. Re-loading an export reproduces all non-derived cell
//! values modulo floating-point formatting tolerance.

use std::path::Path;

use anyhow::Context;
use arrow::csv::WriterBuilder;
use arrow::record_batch::RecordBatch;

use crate::error::Result;

/// Write the batch to `path` as headered CSV
pub fn write_csv(batch: &RecordBatch, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("failed to create export file {}", path.display()))?;

    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer
        .write(batch)
        .with_context(|| format!("failed to write export to {}", path.display()))?;

    log::info!(
        "exported {} rows x {} columns to {}",
        batch.num_rows(),
        batch.num_columns(),
        path.display()
    );
    Ok(())
}
