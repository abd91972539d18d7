//! Block-group demographics: ACS tables merged with EJScreen indicators.

pub mod merge;
pub mod metrics;
pub mod moe;

pub use merge::*;
pub use metrics::*;

use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use tracing::info;

use crate::config::CensusConfig;
use crate::models::Region;
use crate::storage::{ColumnData, TableReader, TableWriter};
use moe::to_options;

/// Reads every configured input and merges them.
pub fn load_census(config: &CensusConfig) -> Result<MergedCensus> {
    let reader = TableReader::text_only();
    let wanted = config.acs_columns();

    let mut acs = AcsBlockGroups::new();
    for path in &config.inputs.acs_tables {
        let df = reader
            .read_frame(path)
            .with_context(|| format!("Failed to read ACS table {}", path.display()))?;
        acs.add_table(&df, &config.acs, &wanted)
            .with_context(|| format!("Failed to merge ACS table {}", path.display()))?;
    }
    info!("ACS: {} block groups from {} tables", acs.len(), config.inputs.acs_tables.len());

    let ejscreen = reader
        .read_frame(&config.inputs.ejscreen)
        .context("Failed to read EJScreen table")?;
    merge_ejscreen(acs, &config.acs, &ejscreen, &config.ejscreen)
}

/// Identifier columns, EJScreen columns, then each metric and its MOE.
pub fn census_frame(census: &MergedCensus, metrics: &[MetricColumns]) -> Result<DataFrame> {
    let rows = &census.rows;
    let text = |f: fn(&BlockGroup) -> Option<String>| ColumnData::Text(rows.iter().map(f).collect());

    let mut columns = vec![
        ("FIPS".to_string(), ColumnData::Int(rows.iter().map(|r| Some(r.fips)).collect())),
        ("GEOID_21".to_string(), text(|r| Some(r.geo_id.clone()))),
        ("GEOID_12".to_string(), text(|r| Some(r.geoid_12.clone()))),
        (
            "ST_ABBREV".to_string(),
            text(|r| {
                r.name
                    .state
                    .as_deref()
                    .and_then(|s| s.parse::<Region>().ok())
                    .map(|region| region.abbreviation().to_string())
            }),
        ),
        ("STATE".to_string(), text(|r| r.name.state.clone())),
        ("COUNTY".to_string(), text(|r| r.name.county.clone())),
        ("TRACT".to_string(), text(|r| r.name.tract.clone())),
        ("CBG".to_string(), text(|r| r.name.block_group.clone())),
    ];

    for (index, name) in census.ej_columns.iter().enumerate() {
        let values = rows
            .iter()
            .map(|r| Some(r.ej_values[index]).filter(|v| v.is_finite()))
            .collect();
        columns.push((name.clone(), ColumnData::Float(values)));
    }

    for metric in metrics {
        columns.push((metric.value_name.clone(), ColumnData::Float(to_options(&metric.value))));
        columns.push((metric.moe_name.clone(), ColumnData::Float(to_options(&metric.moe))));
    }

    TableWriter::build_frame(columns)
}

/// Full census run: load, derive metrics, write the CSV.
pub fn run_census(config: &CensusConfig) -> Result<usize> {
    let census = load_census(config)?;
    let metrics = compute_metrics(&census, &config.percent, config.education.as_ref());
    let mut df = census_frame(&census, &metrics)?;

    if let Some(parent) = config.inputs.output.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    TableWriter::write_csv(&mut df, &config.inputs.output)?;
    Ok(df.height())
}
