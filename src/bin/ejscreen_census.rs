//! Merges ACS block-group tables with EJScreen indicators and writes the
//! derived demographic metrics.

use anyhow::Result;
use std::env;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use orphan_wells::census::run_census;
use orphan_wells::config::CensusConfig;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    dotenv::dotenv().ok();

    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("src/configs/census.toml"));

    info!("🚀 Starting census x EJScreen merge ({})", config_path.display());
    let config = CensusConfig::from_file(&config_path)?;
    info!(
        "Loaded {} ACS tables, {} percentage metrics",
        config.inputs.acs_tables.len(),
        config.percent.len()
    );

    let rows = run_census(&config)?;
    info!("✅ Wrote {} block groups to {}", rows, config.inputs.output.display());
    Ok(())
}
