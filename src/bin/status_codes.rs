//! Per-region value counts of raw tracker statuses, with the class each one
//! normalizes to. Used to curate the status dictionaries.

use anyhow::{Result, anyhow};
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use orphan_wells::config::{PipelineConfig, RegionTables};
use orphan_wells::models::{RawTable, Region};
use orphan_wells::processor::StatusNormalizer;
use orphan_wells::storage::TableReader;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    dotenv::dotenv().ok();

    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("src/configs/pipeline.toml"));
    let only_region: Option<Region> = env::args().nth(2).map(|r| r.parse()).transpose()?;

    let config = PipelineConfig::load(&config_path)?;
    let tables = RegionTables::from_file(&config.region_tables)?;

    let reader = TableReader::text_only();
    let mut tracker = RawTable::default();
    for path in &config.tracker {
        tracker.append(reader.read_csv(path)?);
    }

    let fields = &tables.tracker.fields;
    let region_column = fields
        .region
        .as_deref()
        .ok_or_else(|| anyhow!("Tracker mapping has no region column"))?;
    let status_column = fields
        .status
        .as_deref()
        .ok_or_else(|| anyhow!("Tracker mapping has no status column"))?;

    let rows = tracker.records.iter().filter_map(|raw| {
        let region = raw.text(region_column)?.parse::<Region>().ok()?;
        if only_region.is_some_and(|only| only != region) {
            return None;
        }
        Some((region, raw.get(status_column)?))
    });

    let normalizer = StatusNormalizer::from_tables(&tables);
    let breakdown = normalizer.status_breakdown(rows);
    info!("Status codes for {} regions", breakdown.len());

    for (region, statuses) in &breakdown {
        println!("\n=== {} ({}) ===", region, region.abbreviation());
        let mut sorted: Vec<_> = statuses.iter().collect();
        sorted.sort_by(|a, b| b.1.0.cmp(&a.1.0).then_with(|| a.0.cmp(b.0)));
        for (raw, (count, status)) in sorted {
            println!("{:>8}  {:<40} -> {}", count, raw, status);
        }
    }

    Ok(())
}
