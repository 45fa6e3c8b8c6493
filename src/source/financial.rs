//! Financial source loader
//!
//! The municipal financial workbook is the authoritative source: its
//! (city, year) rows define the panel's cardinality. The workbook is
//! consumed as a delimited export of the configured sheet, one file per
//! sheet under the workbook directory.

use std::path::{Path, PathBuf};

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

use super::read::read_delimited;
use super::schemas::financial_schema;
use super::SourceLoader;
use crate::error::{PanelError, Result};

/// Loader for the authoritative municipal financial sheet
#[derive(Debug, Clone)]
pub struct FinancialSource {
    schema: SchemaRef,
}

impl FinancialSource {
    /// Create a new financial source loader
    #[must_use]
    pub fn new() -> Self {
        Self {
            schema: financial_schema(),
        }
    }

    /// Path of a sheet's delimited export inside the workbook directory
    #[must_use]
    pub fn sheet_path(workbook_dir: &Path, sheet_name: &str) -> PathBuf {
        workbook_dir.join(format!("{sheet_name}.csv"))
    }

    /// Load the named sheet from the workbook directory.
    ///
    /// # Errors
    /// `Load` when the sheet export does not exist, naming the sheet.
    pub fn load_sheet(&self, workbook_dir: &Path, sheet_name: &str) -> Result<RecordBatch> {
        let path = Self::sheet_path(workbook_dir, sheet_name);
        if !path.exists() {
            return Err(PanelError::load(
                self.source_name(),
                format!(
                    "sheet '{sheet_name}' has no export in {} (expected {})",
                    workbook_dir.display(),
                    path.display()
                ),
            ));
        }
        self.load(&path)
    }
}

impl Default for FinancialSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceLoader for FinancialSource {
    fn source_name(&self) -> &'static str {
        "financial"
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn load(&self, path: &Path) -> Result<RecordBatch> {
        let batch = read_delimited(path, self.source_name(), &self.schema, b',')?;
        log::info!(
            "financial: {} (city, year) rows from {}",
            batch.num_rows(),
            path.display()
        );
        Ok(batch)
    }
}
