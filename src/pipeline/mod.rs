//! Pipeline orchestration
//!
//! A strictly forward, synchronous batch run: load, harmonize, merge,
//! adjust for inflation, derive features, export. Each stage runs to
//! completion before the next begins; a failing stage aborts the run
//! with the stage name attached to the error.

use std::path::PathBuf;
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray};
use arrow::compute::filter_record_batch;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use itertools::Itertools;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::export;
use crate::harmonize::{self, AliasTable, GeoIndex};
use crate::inflation;
use crate::merge;
use crate::metadata::MetadataCatalog;
use crate::normalize;
use crate::report::QualityReport;
use crate::source::{
    ColumnSource, CpiSource, EmploymentSource, FinancialSource, GeographicSource, SourceLoader,
};
use crate::utils;

/// Options for one panel build, mirroring the entry-point booleans of the
/// analysis workflow
#[derive(Debug, Clone)]
pub struct PanelOptions {
    /// Derive per-capita and percent-of-total features
    pub normalize: bool,
    /// Write the finished panel to this CSV path
    pub export: Option<PathBuf>,
}

impl Default for PanelOptions {
    fn default() -> Self {
        Self {
            normalize: true,
            export: None,
        }
    }
}

/// The outcome of a pipeline run: the panel plus its quality counters
#[derive(Debug)]
pub struct PanelRun {
    /// The finished (city, year) panel
    pub panel: RecordBatch,
    /// Aggregated per-row degradation counts
    pub report: QualityReport,
}

/// Builds the merged, adjusted, feature-complete panel from configured
/// sources
#[derive(Debug, Clone)]
pub struct PanelBuilder {
    config: PipelineConfig,
}

impl PanelBuilder {
    /// Create a builder over the given configuration
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// The configuration this builder runs with
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load the column-description catalog for exploratory search.
    ///
    /// Not part of the build itself; the catalog never feeds the merge.
    pub fn metadata(&self) -> Result<MetadataCatalog> {
        let source = ColumnSource::new();
        let batch = source
            .load(&self.config.columns_path)
            .map_err(|e| e.in_stage("metadata"))?;
        let name = self
            .config
            .columns_path
            .file_name()
            .map_or_else(|| "columns".to_string(), |n| n.to_string_lossy().to_string());
        MetadataCatalog::from_batch(&batch, &name)
    }

    /// Run the full pipeline.
    ///
    /// Stages run strictly forward; per-row data-quality issues degrade
    /// to nulls and are tallied in the returned report, while structural
    /// failures abort with the offending stage named.
    pub fn build(&self, options: &PanelOptions) -> Result<PanelRun> {
        let cfg = &self.config;
        let mut report = QualityReport::default();

        log::info!("loading financial data");
        let financial = FinancialSource::new()
            .load_sheet(&cfg.workbook_dir, &cfg.sheet_name)
            .map_err(|e| e.in_stage("load-financial"))?;
        report.authoritative_rows = financial.num_rows();

        log::info!("loading reference data");
        let geographic = GeographicSource::new()
            .load(&cfg.geographic_path)
            .map_err(|e| e.in_stage("load-geographic"))?;
        let employment = EmploymentSource::new()
            .load(&cfg.employment_dir)
            .map_err(|e| e.in_stage("load-employment"))?;
        let cpi = CpiSource::new()
            .read_table(&cfg.cpi_path)
            .map_err(|e| e.in_stage("load-cpi"))?;

        log::info!("harmonizing join keys");
        let aliases = self.load_aliases()?;
        let lookup =
            harmonize::build_city_lookup(&geographic).map_err(|e| e.in_stage("harmonize"))?;
        let index = GeoIndex::from_lookup(&lookup).map_err(|e| e.in_stage("harmonize"))?;
        let resolution = harmonize::resolve_cities(
            &financial,
            "city",
            "county_fips",
            &index,
            &aliases,
            &mut report,
        )
        .map_err(|e| e.in_stage("harmonize"))?;

        log::info!("merging sources");
        let keyed = append_column(
            &financial,
            Field::new("city_key", DataType::Utf8, true),
            Arc::new(resolution.city_key.clone()) as ArrayRef,
        )
        .map_err(|e| e.in_stage("merge"))?;
        let keyed = append_column(
            &keyed,
            Field::new("geo_resolved", DataType::Boolean, true),
            Arc::new(resolution.resolved.clone()) as ArrayRef,
        )
        .map_err(|e| e.in_stage("merge"))?;

        let merged = merge::left_join(
            &keyed,
            &employment,
            &["county_fips", "year"],
            &["county_fips", "year"],
            "employment",
            &mut report,
        )
        .map_err(|e| e.in_stage("merge"))?;

        let unmatched_geo = resolution
            .lookup_rows
            .iter()
            .filter(|idx| idx.is_none())
            .count();
        if unmatched_geo > 0 {
            report.note_unmatched("geographic", unmatched_geo);
        }
        let merged = merge::attach_rows(
            &merged,
            &lookup,
            &resolution.lookup_rows,
            &["city_key", "county", "county_fips"],
            "geographic",
        )
        .map_err(|e| e.in_stage("merge"))?;

        log::info!("adjusting currency columns to {} dollars", cfg.reference_period);
        let adjusted = inflation::to_real_dollars(
            &merged,
            &cfg.currency_columns,
            cfg.reference_period,
            &cpi,
            "year",
            &mut report,
        )
        .map_err(|e| e.in_stage("inflation"))?;

        let panel = if options.normalize {
            log::info!("deriving per-capita and percent-of-total features");
            normalize::normalize(&adjusted, &cfg.normalize, &mut report)
                .map_err(|e| e.in_stage("normalize"))?
        } else {
            adjusted
        };

        log::info!("categorizing city sizes");
        let panel = normalize::categorize_size(
            &panel,
            &cfg.normalize.population_column,
            &cfg.thresholds,
        )
        .map_err(|e| e.in_stage("normalize"))?;

        if let Some(path) = &options.export {
            export::write_csv(&panel, path).map_err(|e| e.in_stage("export"))?;
        }

        log::info!(
            "panel complete: {} rows x {} columns",
            panel.num_rows(),
            panel.num_columns()
        );
        Ok(PanelRun { panel, report })
    }

    fn load_aliases(&self) -> Result<AliasTable> {
        match &self.config.alias_path {
            Some(path) if path.exists() => {
                let aliases = AliasTable::load(path).map_err(|e| e.in_stage("harmonize"))?;
                log::info!("alias table: {} entries from {}", aliases.len(), path.display());
                Ok(aliases)
            }
            Some(path) => {
                log::info!(
                    "alias table {} not present; exact-match harmonization only",
                    path.display()
                );
                Ok(AliasTable::empty())
            }
            None => Ok(AliasTable::empty()),
        }
    }
}

/// Append one column to a batch, returning the widened copy
fn append_column(batch: &RecordBatch, field: Field, column: ArrayRef) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|f| f.as_ref().clone())
        .collect();
    fields.push(field);

    let mut columns = batch.columns().to_vec();
    columns.push(column);
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Best-quality subset of a finished panel: the census years with
/// complete data, restricted to a caller-supplied city list.
///
/// City names are compared through their canonical keys, so spelling
/// variants in the list still match.
pub fn abbreviated_panel(
    panel: &RecordBatch,
    years: &[i64],
    cities: &[&str],
) -> Result<RecordBatch> {
    let year_col = utils::column(panel, "year")?;
    let city_col = utils::column(panel, "city")?;
    let wanted: Vec<String> = cities
        .iter()
        .map(|c| harmonize::canonical_city_key(c))
        .sorted()
        .dedup()
        .collect();

    let keep: BooleanArray = (0..panel.num_rows())
        .map(|row| {
            let year_ok = utils::i64_value(year_col, row)
                .is_some_and(|y| years.contains(&y));
            let city_ok = utils::string_value(city_col, row).is_some_and(|c| {
                wanted.binary_search(&harmonize::canonical_city_key(&c)).is_ok()
            });
            Some(year_ok && city_ok)
        })
        .collect();

    Ok(filter_record_batch(panel, &keep)?)
}
