//! Error handling for the panel pipeline.
//!
//! Only structural failures surface here: a source that cannot be read,
//! a column missing from a declared schema, a duplicated key set in the
//! authoritative table. Per-row data-quality issues degrade to null cells
//! and are tallied in [`crate::report::QualityReport`] instead.

use arrow::error::ArrowError;

pub mod util;

/// Specialized error type for panel construction
#[derive(Debug, thiserror::Error)]
pub enum PanelError {
    /// A source file is missing or malformed; aborts the run
    #[error("failed to load {source_name}: {message}")]
    Load {
        /// Which source loader failed
        source_name: String,
        /// What went wrong
        message: String,
    },

    /// The declared schema does not match what the file contains
    #[error("schema mismatch in {source_name}: {message}")]
    Schema {
        /// Which source the schema belongs to
        source_name: String,
        /// The mismatch description
        message: String,
    },

    /// Unresolvable or duplicated join keys in the authoritative table
    #[error("join key error: {0}")]
    JoinKey(String),

    /// Reference data (CPI, geographic lookup) cannot support the run at all
    #[error("reference data gap: {0}")]
    ReferenceDataGap(String),

    /// A period string that none of the accepted formats recognize
    #[error("invalid period '{0}' (expected e.g. \"2005\", \"2019-10\", \"Oct 2019\" or \"2019 M10\")")]
    InvalidPeriod(String),

    /// A pipeline stage failed; wraps the underlying error with the stage name
    #[error("{stage} stage failed")]
    Stage {
        /// Name of the failing stage
        stage: &'static str,
        /// Underlying cause
        #[source]
        source: Box<PanelError>,
    },

    /// Error from the Arrow engine
    #[error(transparent)]
    Arrow(#[from] ArrowError),

    /// Error reading from the filesystem
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Contextualized error from loader internals
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PanelError {
    /// Build a `Load` error for the named source
    pub fn load(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Load {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Build a `Schema` error for the named source
    pub fn schema(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schema {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Attach the pipeline stage in which this error surfaced
    #[must_use]
    pub fn in_stage(self, stage: &'static str) -> Self {
        Self::Stage {
            stage,
            source: Box::new(self),
        }
    }
}

/// Result type for panel operations
pub type Result<T> = std::result::Result<T, PanelError>;
