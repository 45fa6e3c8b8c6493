//! Aggregated data-quality counters for a pipeline run
//!
//! Per-row degradations never abort the run; they become null cells plus a
//! count here, so the downstream analysis can judge how much signal was lost.

use std::collections::BTreeMap;

use serde::Serialize;

/// Counts of per-row quality issues accumulated across the pipeline stages
#[derive(Debug, Default, Clone, Serialize)]
pub struct QualityReport {
    /// Rows in the authoritative financial table (defines panel cardinality)
    pub authoritative_rows: usize,
    /// Financial rows whose city could not be resolved against the
    /// geographic lookup, even through the alias table
    pub unresolved_city_keys: usize,
    /// Duplicate-keyed rows dropped from non-authoritative sources
    /// (the most complete row of each duplicate set is kept)
    pub duplicate_source_rows_dropped: usize,
    /// Authoritative rows left unmatched by each joined source
    pub unmatched_rows: BTreeMap<String, usize>,
    /// Rows whose period had no CPI entry; their currency cells are null
    pub cpi_gap_rows: usize,
    /// Derived cells nulled because the denominator was zero or missing
    pub guarded_divisions: usize,
}

impl QualityReport {
    /// Record rows of the authoritative table that `source` did not cover
    pub fn note_unmatched(&mut self, source: &str, rows: usize) {
        *self.unmatched_rows.entry(source.to_string()).or_default() += rows;
    }

    /// True when the run degraded nothing
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.unresolved_city_keys == 0
            && self.duplicate_source_rows_dropped == 0
            && self.cpi_gap_rows == 0
            && self.guarded_divisions == 0
            && self.unmatched_rows.values().all(|&n| n == 0)
    }
}
