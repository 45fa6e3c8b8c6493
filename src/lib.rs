//! A Rust library for building the Idaho municipal finance/crime panel:
//! schema-validated source loading, key harmonization, left-outer merging,
//! inflation adjustment and feature derivation, producing one in-memory
//! table ready for statistical modeling.

pub mod config;
pub mod error;
pub mod export;
pub mod harmonize;
pub mod inflation;
pub mod merge;
pub mod metadata;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod source;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::PipelineConfig;
pub use error::{PanelError, Result};
pub use pipeline::{PanelBuilder, PanelOptions, PanelRun, abbreviated_panel};
pub use report::QualityReport;

// Arrow types
pub use arrow::datatypes::Schema as ArrowSchema;
pub use arrow::record_batch::RecordBatch;

// Stage entry points
pub use harmonize::{AliasTable, GeoIndex, canonical_city_key};
pub use inflation::{CpiTable, Period, to_real_dollars};
pub use merge::left_join;
pub use metadata::{ColumnDescriptor, MetadataCatalog};
pub use normalize::{SizeThresholds, categorize_size, normalize};
