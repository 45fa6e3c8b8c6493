//! Column-description source loader
//!
//! A two-column {name, description} table feeding the metadata resolver.

use std::path::Path;

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;

use super::read::read_delimited;
use super::schemas::columns_schema;
use super::SourceLoader;
use crate::error::Result;

/// Loader for the column-name description table
#[derive(Debug, Clone)]
pub struct ColumnSource {
    schema: SchemaRef,
}

impl ColumnSource {
    /// Create a new column-description loader
    #[must_use]
    pub fn new() -> Self {
        Self {
            schema: columns_schema(),
        }
    }
}

impl Default for ColumnSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceLoader for ColumnSource {
    fn source_name(&self) -> &'static str {
        "columns"
    }

    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn load(&self, path: &Path) -> Result<RecordBatch> {
        read_delimited(path, self.source_name(), &self.schema, b',')
    }
}
