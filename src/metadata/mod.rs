//! Searchable column metadata
//!
//! Descriptors map a column name to a human-readable description and the
//! source file it came from; they are loaded once and never mutated.
//! Search is for exploratory use: case-insensitive, regex when the
//! pattern compiles, plain substring otherwise, and never an error.

use regex::RegexBuilder;

use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::utils;

/// Metadata for one panel column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Column name as it appears in the panel
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// Which source file documented the column
    pub source: String,
}

/// The loaded set of column descriptors
#[derive(Debug, Clone, Default)]
pub struct MetadataCatalog {
    descriptors: Vec<ColumnDescriptor>,
}

impl MetadataCatalog {
    /// Build a catalog from a {name, description} batch, stamping each
    /// descriptor with its provenance
    pub fn from_batch(batch: &RecordBatch, source: &str) -> Result<Self> {
        let names = utils::column(batch, "name")?;
        let descriptions = utils::column(batch, "description")?;

        let descriptors = (0..batch.num_rows())
            .filter_map(|row| {
                let name = utils::string_value(names, row)?;
                Some(ColumnDescriptor {
                    name,
                    description: utils::string_value(descriptions, row).unwrap_or_default(),
                    source: source.to_string(),
                })
            })
            .collect();
        Ok(Self { descriptors })
    }

    /// Case-insensitive search over names and descriptions.
    ///
    /// The pattern is treated as a regex; one that fails to compile
    /// degrades to a literal substring match. No match is an empty list,
    /// never an error.
    #[must_use]
    pub fn search(&self, pattern: &str) -> Vec<&ColumnDescriptor> {
        match RegexBuilder::new(pattern).case_insensitive(true).build() {
            Ok(re) => self
                .descriptors
                .iter()
                .filter(|d| re.is_match(&d.name) || re.is_match(&d.description))
                .collect(),
            Err(_) => {
                let needle = pattern.to_lowercase();
                self.descriptors
                    .iter()
                    .filter(|d| {
                        d.name.to_lowercase().contains(&needle)
                            || d.description.to_lowercase().contains(&needle)
                    })
                    .collect()
            }
        }
    }

    /// Iterate all descriptors in load order
    pub fn iter(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.descriptors.iter()
    }

    /// Number of descriptors in the catalog
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// True when the catalog is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
