//! CPI source loader
//!
//! Reads a BLS SeriesReport-style table of {year, period, value} rows
//! into the read-only [`CpiTable`] the inflation adjuster consumes.
//! Period codes are `M01`..`M12` for calendar months and `M13` for the
//! annual average.

use std::path::Path;

use arrow::array::{Array, Float64Array, Int64Array};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

use super::read::read_delimited;
use super::schemas::cpi_schema;
use super::SourceLoader;
use crate::error::{PanelError, Result};
use crate::inflation::{CpiTable, Period};
use crate::utils;

/// Loader for the consumer-price-index reference table
#[derive(Debug, Clone)]
pub struct CpiSource {
    schema: SchemaRef,
}

impl CpiSource {
    /// Create a new CPI source loader
    #[must_use]
    pub fn new() -> Self {
        Self {
            schema: cpi_schema(),
        }
    }

    /// Load the file and assemble the lookup table the adjuster uses
    pub fn read_table(&self, path: &Path) -> Result<CpiTable> {
        let batch = self.load(path)?;

        let years = utils::column(&batch, "year")?
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or_else(|| PanelError::schema(self.source_name(), "year must be Int64".to_string()))?
            .clone();
        let periods = utils::column(&batch, "period")?;
        let values = utils::column(&batch, "value")?
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| {
                PanelError::schema(self.source_name(), "value must be Float64".to_string())
            })?
            .clone();

        let mut table = CpiTable::new();
        for row in 0..batch.num_rows() {
            if years.is_null(row) || values.is_null(row) {
                return Err(PanelError::load(
                    self.source_name(),
                    format!("row {row} has a null year or value; reference data must be complete"),
                ));
            }
            let year = years.value(row) as i32;
            let code = utils::string_value(periods, row).ok_or_else(|| {
                PanelError::load(self.source_name(), format!("row {row} has a null period"))
            })?;

            let period = Period::parse(&format!("{year} {code}")).map_err(|_| {
                PanelError::load(
                    self.source_name(),
                    format!("row {row} has unrecognized period code '{code}'"),
                )
            })?;
            table.insert(period, values.value(row));
        }

        if table.is_empty() {
            return Err(PanelError::ReferenceDataGap(format!(
                "CPI table {} holds no usable entries",
                path.display()
            )));
        }
        log::info!("cpi: {} index entries from {}", table.len(), path.display());
        Ok(table)
    }
}

impl Default for CpiSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceLoader for CpiSource {
    fn source_name(&self) -> &'static str {
        "cpi"
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn load(&self, path: &Path) -> Result<RecordBatch> {
        read_delimited(path, self.source_name(), &self.schema, b',')
    }
}
