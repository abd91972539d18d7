use anyhow::{Context, Result, anyhow};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use tracing::info;

use crate::models::PriorReportRecord;
use crate::pipeline::ExportRecord;

/// Values for one output column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Text(Vec<Option<String>>),
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Bool(Vec<Option<bool>>),
}

pub struct TableWriter;

impl TableWriter {
    pub fn build_frame(columns: Vec<(String, ColumnData)>) -> Result<DataFrame> {
        let mut series_vec: Vec<Column> = Vec::with_capacity(columns.len());
        for (name, data) in columns {
            let series = match data {
                ColumnData::Text(values) => Series::new(name.as_str().into(), values),
                ColumnData::Int(values) => Series::new(name.as_str().into(), values),
                ColumnData::Float(values) => Series::new(name.as_str().into(), values),
                ColumnData::Bool(values) => Series::new(name.as_str().into(), values),
            };
            series_vec.push(series.into());
        }

        DataFrame::new(series_vec).map_err(|e| anyhow!("Failed to create DataFrame: {}", e))
    }

    pub fn wells_frame(records: &[ExportRecord]) -> Result<DataFrame> {
        let text = |f: fn(&ExportRecord) -> Option<String>| {
            ColumnData::Text(records.iter().map(f).collect())
        };

        Self::build_frame(vec![
            ("api_10".to_string(), text(|r| r.identifier.clone())),
            (
                "lat".to_string(),
                ColumnData::Float(records.iter().map(|r| r.latitude).collect()),
            ),
            (
                "lon".to_string(),
                ColumnData::Float(records.iter().map(|r| r.longitude).collect()),
            ),
            ("state".to_string(), text(|r| Some(r.region.clone()))),
            ("st_abbrev".to_string(), text(|r| Some(r.st_abbrev.clone()))),
            ("county".to_string(), text(|r| r.county.clone())),
            ("well_name".to_string(), text(|r| r.well_name.clone())),
            ("operator".to_string(), text(|r| r.operator.clone())),
            ("well_status".to_string(), text(|r| r.well_status.clone())),
            ("spud_date".to_string(), text(|r| r.spud_date.clone())),
            ("lifecycle_status".to_string(), text(|r| r.lifecycle_status.clone())),
            (
                "is_within_claimed_state".to_string(),
                ColumnData::Bool(records.iter().map(|r| r.is_within_claimed_region).collect()),
            ),
        ])
    }

    pub fn prior_report_frame(
        records: &[PriorReportRecord],
        within: &[Option<bool>],
    ) -> Result<DataFrame> {
        let text = |f: fn(&PriorReportRecord) -> Option<String>| {
            ColumnData::Text(records.iter().map(f).collect())
        };

        Self::build_frame(vec![
            ("Well identifier".to_string(), text(|r| r.identifier.clone())),
            ("State".to_string(), text(|r| r.region.map(|region| region.to_string()))),
            (
                "st_abbrev".to_string(),
                text(|r| r.region.map(|region| region.abbreviation().to_string())),
            ),
            ("County".to_string(), text(|r| r.county.clone())),
            ("Well name".to_string(), text(|r| r.well_name.clone())),
            ("Well number".to_string(), text(|r| r.well_number.clone())),
            ("Township".to_string(), text(|r| r.township.clone())),
            ("Range".to_string(), text(|r| r.range.clone())),
            ("Section".to_string(), text(|r| r.section.clone())),
            (
                "Latitude".to_string(),
                ColumnData::Float(records.iter().map(|r| r.latitude).collect()),
            ),
            (
                "Longitude".to_string(),
                ColumnData::Float(records.iter().map(|r| r.longitude).collect()),
            ),
            (
                "is_within_claimed_state".to_string(),
                ColumnData::Bool(within.to_vec()),
            ),
        ])
    }

    pub fn write_csv(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(df)
            .with_context(|| format!("Failed to write CSV: {}", path.display()))?;
        info!("Wrote {} rows to {}", df.height(), path.display());
        Ok(())
    }

    pub fn write_parquet(df: &mut DataFrame, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        ParquetWriter::new(file)
            .finish(df)
            .with_context(|| format!("Failed to write Parquet: {}", path.display()))?;
        info!("Wrote {} rows to {}", df.height(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::TableReader;

    #[test]
    fn test_build_frame_and_csv_round_trip() {
        let mut df = TableWriter::build_frame(vec![
            (
                "id".to_string(),
                ColumnData::Text(vec![Some("A".to_string()), None]),
            ),
            ("pct".to_string(), ColumnData::Float(vec![Some(12.5), None])),
            ("inside".to_string(), ColumnData::Bool(vec![Some(true), None])),
        ])
        .unwrap();
        assert_eq!(df.shape(), (2, 3));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        TableWriter::write_csv(&mut df, &path).unwrap();

        let table = TableReader::new().read_csv(&path).unwrap();
        assert_eq!(table.columns, vec!["id", "pct", "inside"]);
        assert_eq!(table.records[0].text("id").as_deref(), Some("A"));
        assert_eq!(table.records[0].number("pct"), Some(12.5));
        assert_eq!(table.records[1].text("id"), None);
    }

    #[test]
    fn test_mismatched_column_lengths_fail() {
        let result = TableWriter::build_frame(vec![
            ("a".to_string(), ColumnData::Float(vec![Some(1.0)])),
            ("b".to_string(), ColumnData::Float(vec![Some(1.0), Some(2.0)])),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parquet_written() {
        let mut df = TableWriter::build_frame(vec![(
            "id".to_string(),
            ColumnData::Text(vec![Some("A".to_string())]),
        )])
        .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.parquet");
        TableWriter::write_parquet(&mut df, &path).unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }
}
