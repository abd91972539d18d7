use anyhow::{Context, Result};
use polars::prelude::DataFrame;
use tracing::info;

use super::reconcile::ReconciliationOutput;
use crate::config::RegionTables;
use crate::models::{CanonicalWellRecord, PriorReportRecord};
use crate::processor::ContainmentCheck;
use crate::storage::{OutputPaths, TableWriter};

/// A canonical record shaped for the output files.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRecord {
    pub identifier: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub region: String,
    pub st_abbrev: String,
    pub county: Option<String>,
    pub well_name: Option<String>,
    pub operator: Option<String>,
    pub well_status: Option<String>,
    pub spud_date: Option<String>,
    pub lifecycle_status: Option<String>,
    pub is_within_claimed_region: Option<bool>,
}

pub struct Exporter<'a> {
    tables: &'a RegionTables,
    containment: Option<&'a dyn ContainmentCheck>,
}

impl<'a> Exporter<'a> {
    pub fn new(tables: &'a RegionTables, containment: Option<&'a dyn ContainmentCheck>) -> Self {
        Self { tables, containment }
    }

    /// Drops regions flagged `exclude_from_export` and blanks repurposed
    /// spud-date fields.
    pub fn shape(&self, records: &[CanonicalWellRecord]) -> Vec<ExportRecord> {
        records
            .iter()
            .filter(|record| {
                !self
                    .tables
                    .profile(record.region)
                    .is_some_and(|p| p.exclude_from_export)
            })
            .map(|record| {
                let clear_spud = self
                    .tables
                    .profile(record.region)
                    .is_some_and(|p| p.clear_spud_date_on_export);

                ExportRecord {
                    identifier: record.identifier.clone(),
                    latitude: record.latitude,
                    longitude: record.longitude,
                    region: record.region.to_string(),
                    st_abbrev: record.region.abbreviation().to_string(),
                    county: record.county.clone(),
                    well_name: record.name.clone(),
                    operator: record.operator_name.clone(),
                    well_status: record.status.as_ref().map(|s| s.as_str().to_string()),
                    spud_date: if clear_spud { None } else { record.spud_date.clone() },
                    lifecycle_status: record.lifecycle_status.map(|l| l.as_str().to_string()),
                    is_within_claimed_region: self.verdict(record),
                }
            })
            .collect()
    }

    /// Containment verdicts for prior-report rows, in input order.
    pub fn prior_report_verdicts(&self, records: &[PriorReportRecord]) -> Vec<Option<bool>> {
        records
            .iter()
            .map(|record| {
                let region = record.region?;
                let mut located = CanonicalWellRecord::new(region);
                located.latitude = record.latitude;
                located.longitude = record.longitude;
                self.verdict(&located)
            })
            .collect()
    }

    fn verdict(&self, record: &CanonicalWellRecord) -> Option<bool> {
        self.containment
            .and_then(|check| check.is_within_claimed_region(record))
    }
}

pub const SNAPSHOT_TABLE: &str = "orphaned_wells";
pub const NEWLY_ORPHANED_TABLE: &str = "newly_orphaned";
pub const NEWLY_PLUGGED_TABLE: &str = "newly_plugged";

fn write_table(df: &mut DataFrame, paths: &OutputPaths, name: &str, parquet: bool) -> Result<()> {
    TableWriter::write_csv(df, paths.table(name, "csv"))?;
    if parquet {
        TableWriter::write_parquet(df, paths.table(name, "parquet"))?;
    }
    Ok(())
}

/// Writes the three result tables and `summary.json` under `paths`.
pub fn write_outputs(
    output: &ReconciliationOutput,
    exporter: &Exporter,
    paths: &OutputPaths,
    parquet: bool,
) -> Result<()> {
    paths.ensure_dirs()?;

    let mut snapshot = TableWriter::wells_frame(&exporter.shape(&output.snapshot))?;
    write_table(&mut snapshot, paths, SNAPSHOT_TABLE, parquet)?;

    let mut newly_orphaned = TableWriter::wells_frame(&exporter.shape(&output.newly_orphaned))?;
    write_table(&mut newly_orphaned, paths, NEWLY_ORPHANED_TABLE, parquet)?;

    let verdicts = exporter.prior_report_verdicts(&output.newly_plugged);
    let mut newly_plugged = TableWriter::prior_report_frame(&output.newly_plugged, &verdicts)?;
    write_table(&mut newly_plugged, paths, NEWLY_PLUGGED_TABLE, parquet)?;

    let summary = output.report.to_json().context("Failed to serialize run summary")?;
    std::fs::write(paths.summary(), summary)
        .with_context(|| format!("Failed to write {}", paths.summary().display()))?;

    info!("Outputs written to {}", paths.root().display());
    Ok(())
}
