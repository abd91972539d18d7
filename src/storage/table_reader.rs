use anyhow::{Context, Result};
use polars::prelude::*;
use std::path::Path;
use tracing::info;

use crate::models::{RawRecord, RawTable, RawValue};

/// Reads delimited source tables into [`RawTable`]s, keeping the column
/// types polars infers so numeric codes stay numeric.
pub struct TableReader {
    infer_schema_length: Option<usize>,
}

impl TableReader {
    pub fn new() -> Self {
        Self {
            infer_schema_length: Some(10_000),
        }
    }

    /// Treat every column as text.
    pub fn text_only() -> Self {
        Self {
            infer_schema_length: Some(0),
        }
    }

    pub fn read_frame(&self, path: impl AsRef<Path>) -> Result<DataFrame> {
        let path = path.as_ref();
        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(self.infer_schema_length)
            .map_parse_options(|options| options.with_encoding(CsvEncoding::LossyUtf8))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .with_context(|| format!("Failed to open table: {}", path.display()))?
            .finish()
            .with_context(|| format!("Failed to parse table: {}", path.display()))
    }

    pub fn read_csv(&self, path: impl AsRef<Path>) -> Result<RawTable> {
        let path = path.as_ref();
        let df = self.read_frame(path)?;

        let table = Self::dataframe_to_table(&df)
            .with_context(|| format!("Failed to convert table: {}", path.display()))?;
        info!(
            "Read {} rows x {} columns from {}",
            table.len(),
            table.columns.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn dataframe_to_table(df: &DataFrame) -> Result<RawTable> {
        let height = df.height();
        let mut records = vec![RawRecord::new(); height];
        let mut columns = Vec::with_capacity(df.width());

        for column in df.get_columns() {
            let name = column.name().to_string();
            let values = column_values(column)?;
            for (record, value) in records.iter_mut().zip(values) {
                record.insert(&name, value);
            }
            columns.push(name);
        }

        Ok(RawTable::new(columns, records))
    }
}

impl Default for TableReader {
    fn default() -> Self {
        Self::new()
    }
}

fn column_values(column: &Column) -> Result<Vec<RawValue>> {
    let dtype = column.dtype();

    if dtype.is_integer() {
        let cast = column.cast(&DataType::Int64)?;
        return Ok(cast
            .i64()?
            .into_iter()
            .map(|v| v.map_or(RawValue::Null, RawValue::Int))
            .collect());
    }

    if dtype.is_float() {
        let cast = column.cast(&DataType::Float64)?;
        return Ok(cast
            .f64()?
            .into_iter()
            .map(|v| match v {
                Some(f) if !f.is_nan() => RawValue::Float(f),
                _ => RawValue::Null,
            })
            .collect());
    }

    let cast = column.cast(&DataType::String)?;
    Ok(cast
        .str()?
        .into_iter()
        .map(|v| v.map_or(RawValue::Null, |s| RawValue::Text(s.to_string())))
        .collect())
}
