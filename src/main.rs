use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use orphan_wells::config::{PipelineConfig, RegionTables};
use orphan_wells::pipeline::{Exporter, ReconciliationInputs, Reconciler, write_outputs};
use orphan_wells::processor::{BoundingBoxes, ContainmentCheck};
use orphan_wells::storage::OutputPaths;

const DEFAULT_CONFIG: &str = "src/configs/pipeline.toml";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    dotenv::dotenv().ok();

    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));

    info!("🚀 Starting orphaned well reconciliation ({})", config_path.display());

    let config = PipelineConfig::load(&config_path)?;
    let tables = RegionTables::from_file(&config.region_tables)?;
    info!(
        "Loaded region tables: {} extract mappings, {} fully included regions",
        tables.regions.len(),
        tables.fully_included.len()
    );

    let bounds = match &config.region_bounds {
        Some(path) => {
            let bounds = BoundingBoxes::from_file(path)?;
            info!("Loaded bounding boxes for {} regions", bounds.len());
            Some(bounds)
        }
        None => {
            warn!("No region bounds configured; containment verdicts will be empty");
            None
        }
    };

    let inputs = ReconciliationInputs::load(&config).context("Failed to load inputs")?;
    let mut output = Reconciler::new(&tables)
        .run(&inputs)
        .context("Reconciliation failed")?;

    let paths = OutputPaths::new(&config.output_dir, config.dated_output);
    output.report.run_id = Some(paths.run_id().to_string());

    let containment = bounds.as_ref().map(|b| b as &dyn ContainmentCheck);
    let exporter = Exporter::new(&tables, containment);
    write_outputs(&output, &exporter, &paths, config.write_parquet)?;

    for skipped in &output.report.skipped_regions {
        warn!("⚠️ Skipped {}: {}", skipped.region, skipped.reason);
    }

    let totals = &output.report.totals;
    info!("\n=== Reconciliation Summary ===");
    info!("📊 Orphaned wells: {}", totals.orphaned);
    info!("🆕 Newly orphaned: {}", totals.newly_orphaned);
    info!("🔒 Newly plugged: {}", totals.newly_plugged);
    info!("🧹 Already plugged, removed: {}", totals.actually_plugged);
    info!("🎉 Run {} written to {}", paths.run_id(), paths.root().display());

    Ok(())
}
