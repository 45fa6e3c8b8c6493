//! Inflation adjustment of nominal currency columns
//!
//! Every currency cell is rescaled by `CPI[reference] / CPI[row period]` so
//! the whole panel is expressed in the dollars of one fixed reference period.
//! The transform is pure: same inputs, same outputs, input batch untouched.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{PanelError, Result};
use crate::report::QualityReport;

/// A price-index observation period: a calendar month or a whole year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    /// Annual average (BLS period code M13)
    Annual(i32),
    /// A single month, 1-12
    Month(i32, u32),
}

impl Period {
    /// Parse a period from a configuration string.
    ///
    /// Accepted forms: `"2005"`, `"2019-10"`, `"2019/10"`, `"2019 M10"`,
    /// `"Oct 2019"`, `"October 2019"`.
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();

        if trimmed.len() == 4 && trimmed.chars().all(|c| c.is_ascii_digit()) {
            let year: i32 = trimmed
                .parse()
                .map_err(|_| PanelError::InvalidPeriod(trimmed.to_string()))?;
            return Ok(Self::Annual(year));
        }

        // Year and numeric month: "2019-10", "2019/10"
        for sep in ['-', '/'] {
            if let Some((y, m)) = trimmed.split_once(sep)
                && let (Ok(year), Ok(month)) = (y.trim().parse::<i32>(), m.trim().parse::<u32>())
            {
                return Self::month_checked(year, month, trimmed);
            }
        }

        // BLS style: "2019 M10"
        if let Some((y, m)) = trimmed.split_once(' ')
            && let Some(code) = m.trim().strip_prefix(['M', 'm'])
            && let (Ok(year), Ok(month)) = (y.trim().parse::<i32>(), code.parse::<u32>())
        {
            if month == 13 {
                return Ok(Self::Annual(year));
            }
            return Self::month_checked(year, month, trimmed);
        }

        // Month-name formats: "Oct 2019", "October 2019"
        let padded = format!("01 {trimmed}");
        for format in ["%d %b %Y", "%d %B %Y"] {
            if let Ok(date) = NaiveDate::parse_from_str(&padded, format) {
                use chrono::Datelike;
                return Ok(Self::Month(date.year(), date.month()));
            }
        }

        Err(PanelError::InvalidPeriod(trimmed.to_string()))
    }

    fn month_checked(year: i32, month: u32, original: &str) -> Result<Self> {
        if (1..=12).contains(&month) {
            Ok(Self::Month(year, month))
        } else {
            Err(PanelError::InvalidPeriod(original.to_string()))
        }
    }

    /// The calendar year of the period
    #[must_use]
    pub const fn year(&self) -> i32 {
        match self {
            Self::Annual(y) | Self::Month(y, _) => *y,
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Annual(y) => write!(f, "{y}"),
            Self::Month(y, m) => write!(f, "{y}-{m:02}"),
        }
    }
}

/// Read-only CPI lookup table keyed by period
#[derive(Debug, Clone, Default)]
pub struct CpiTable {
    values: FxHashMap<Period, f64>,
}

impl CpiTable {
    /// Build an empty table (tests and incremental construction)
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an index value for a period, replacing any previous entry
    pub fn insert(&mut self, period: Period, value: f64) {
        self.values.insert(period, value);
    }

    /// Look up the index value for a period.
    ///
    /// An annual lookup with no stored annual average falls back to the mean
    /// of the twelve months of that year, when all twelve are present.
    #[must_use]
    pub fn get(&self, period: &Period) -> Option<f64> {
        if let Some(v) = self.values.get(period) {
            return Some(*v);
        }

        if let Period::Annual(year) = period {
            let months: Vec<f64> = (1..=12)
                .filter_map(|m| self.values.get(&Period::Month(*year, m)).copied())
                .collect();
            if months.len() == 12 {
                return Some(months.iter().sum::<f64>() / 12.0);
            }
        }

        None
    }

    /// Number of stored index entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the table holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Rescale the named currency columns to the dollars of `reference`.
///
/// Each cell becomes `value * CPI[reference] / CPI[row period]`, where a
/// row's period is the annual average of its `year` column. Rows whose
/// period is missing from the CPI table keep their non-currency cells and
/// get nulls in every currency column; the count of such rows is reported.
///
/// # Errors
/// Fails with `ReferenceDataGap` when the reference period itself has no
/// CPI entry, since then nothing can be rescaled.
pub fn to_real_dollars(
    batch: &RecordBatch,
    currency_columns: &[String],
    reference: Period,
    cpi: &CpiTable,
    year_column: &str,
    report: &mut QualityReport,
) -> Result<RecordBatch> {
    let reference_cpi = cpi.get(&reference).ok_or_else(|| {
        PanelError::ReferenceDataGap(format!("CPI table has no entry for reference period {reference}"))
    })?;

    let year_idx = batch.schema().index_of(year_column)?;
    let years = batch
        .column(year_idx)
        .as_any()
        .downcast_ref::<Int64Array>()
        .ok_or_else(|| {
            PanelError::schema(
                "financial",
                format!("column '{year_column}' must be Int64 to derive row periods"),
            )
        })?;

    // One multiplier per distinct year; None marks a CPI gap
    let mut factors: FxHashMap<i64, Option<f64>> = FxHashMap::default();
    let mut gap_rows = 0usize;
    let row_factors: Vec<Option<f64>> = (0..batch.num_rows())
        .map(|row| {
            if years.is_null(row) {
                gap_rows += 1;
                return None;
            }
            let year = years.value(row);
            let factor = *factors.entry(year).or_insert_with(|| {
                cpi.get(&Period::Annual(year as i32))
                    .map(|row_cpi| reference_cpi / row_cpi)
            });
            if factor.is_none() {
                gap_rows += 1;
            }
            factor
        })
        .collect();

    if gap_rows > 0 {
        log::warn!("{gap_rows} rows have no CPI entry for their period; currency cells nulled");
        report.cpi_gap_rows += gap_rows;
    }

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(batch.num_columns());
    for (idx, field) in batch.schema().fields().iter().enumerate() {
        let col = batch.column(idx);
        if !currency_columns.iter().any(|c| c == field.name()) {
            columns.push(Arc::clone(col));
            continue;
        }

        let values = col
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| {
                PanelError::schema(
                    "financial",
                    format!("currency column '{}' must be Float64", field.name()),
                )
            })?;

        let adjusted: Float64Array = (0..values.len())
            .map(|row| match (row_factors[row], values.is_null(row)) {
                (Some(factor), false) => Some(values.value(row) * factor),
                _ => None,
            })
            .collect();
        columns.push(Arc::new(adjusted));
    }

    Ok(RecordBatch::try_new(batch.schema(), columns)?)
}
