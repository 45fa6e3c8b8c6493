use log::{info, warn};
use muni_panel::{PanelBuilder, PanelOptions, PipelineConfig, Result};
use std::time::Instant;

fn main() -> Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = PipelineConfig::default();
    if !config.workbook_dir.exists() {
        warn!("Data directory not found: {}", config.workbook_dir.display());
        return Ok(());
    }

    info!("Building panel with configuration:\n{config}");

    let start = Instant::now();
    let builder = PanelBuilder::new(config);
    let run = builder.build(&PanelOptions {
        normalize: true,
        export: Some("panel.csv".into()),
    })?;

    info!(
        "Built {} rows x {} columns in {:?}",
        run.panel.num_rows(),
        run.panel.num_columns(),
        start.elapsed()
    );

    match serde_json::to_string_pretty(&run.report) {
        Ok(report) => info!("Quality report:\n{report}"),
        Err(e) => warn!("Could not render quality report: {e}"),
    }

    // Example: exploratory column search over the metadata catalog
    if let Ok(catalog) = builder.metadata() {
        let crime_columns = catalog.search("crime");
        info!("{} documented crime-related columns", crime_columns.len());
    }

    Ok(())
}
