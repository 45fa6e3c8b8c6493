//! Employment source loader
//!
//! The Bureau of Labor Statistics publishes one county labor-force file
//! per year. The loader reads a single file or a whole directory of
//! them, keeps the Idaho rows (state FIPS 16), and concatenates
//! everything into one batch keyed by (county fips, year).

use std::path::{Path, PathBuf};

use arrow::array::{Array, BooleanArray, Int64Array};
use arrow::compute::filter_record_batch;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use itertools::Itertools;

use super::read::read_delimited;
use super::schemas::employment_schema;
use super::SourceLoader;
use crate::error::util::validate_directory;
use crate::error::{PanelError, Result};

/// State FIPS code the panel covers
pub const IDAHO_STATE_FIPS: i64 = 16;

/// Loader for the per-year county employment files
#[derive(Debug, Clone)]
pub struct EmploymentSource {
    schema: SchemaRef,
}

impl EmploymentSource {
    /// Create a new employment source loader
    #[must_use]
    pub fn new() -> Self {
        Self {
            schema: employment_schema(),
        }
    }

    /// Compile the per-year files under `dir` into one batch, optionally
    /// exporting the compiled table for later runs
    pub fn compile(&self, dir: &Path, out: Option<&Path>) -> Result<RecordBatch> {
        let combined = self.load(dir)?;
        if let Some(path) = out {
            crate::export::write_csv(&combined, path)?;
        }
        Ok(combined)
    }

    fn load_file(&self, path: &Path) -> Result<RecordBatch> {
        let batch = read_delimited(path, self.source_name(), &self.schema, b',')?;
        let state_idx = batch.schema().index_of("state_fips")?;
        let states = batch
            .column(state_idx)
            .as_any()
            .downcast_ref::<Int64Array>()
            .ok_or_else(|| {
                PanelError::schema(self.source_name(), "state_fips must be Int64".to_string())
            })?;

        let keep: BooleanArray = (0..batch.num_rows())
            .map(|row| Some(!states.is_null(row) && states.value(row) == IDAHO_STATE_FIPS))
            .collect();
        Ok(filter_record_batch(&batch, &keep)?)
    }
}

impl Default for EmploymentSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceLoader for EmploymentSource {
    fn source_name(&self) -> &'static str {
        "employment"
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    /// Load employment records from a single file or a directory of
    /// per-year files.
    fn load(&self, path: &Path) -> Result<RecordBatch> {
        if path.is_file() {
            return self.load_file(path);
        }

        validate_directory(path, self.source_name())?;
        let files: Vec<PathBuf> = std::fs::read_dir(path)?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|p| {
                p.is_file() && p.extension().is_some_and(|ext| ext == "csv" || ext == "txt")
            })
            .sorted()
            .collect();

        if files.is_empty() {
            return Err(PanelError::load(
                self.source_name(),
                format!("no employment files in {}", path.display()),
            ));
        }
        log::info!(
            "employment: compiling {} yearly files from {}",
            files.len(),
            path.display()
        );

        let batches: Vec<RecordBatch> = files
            .iter()
            .map(|file| self.load_file(file))
            .collect::<Result<_>>()?;
        let combined = arrow::compute::concat_batches(&self.schema, &batches)?;
        log::info!(
            "employment: {} Idaho county-year rows compiled",
            combined.num_rows()
        );
        Ok(combined)
    }
}
