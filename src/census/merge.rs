use anyhow::{Context, Result};
use ndarray::Array1;
use polars::prelude::*;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::config::{AcsSection, EjscreenSection};

/// Parses one ACS cell. Census jam values mean "no estimate", except
/// `*****`, which marks an MOE that does not apply and counts as zero.
pub fn clean_acs_value(raw: Option<&str>) -> f64 {
    match raw.map(str::trim) {
        None | Some("") | Some("-") | Some("N") | Some("(X)") | Some("**") => f64::NAN,
        Some("*****") => 0.0,
        Some(text) => text.parse::<f64>().unwrap_or(f64::NAN),
    }
}

/// The pieces of an ACS `NAME` such as
/// `Block Group 1, Census Tract 201, Autauga County, Alabama`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameParts {
    pub block_group: Option<String>,
    pub tract: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
}

const BLOCK_GROUP_LABEL_LEN: usize = "Block Group ".len();
const TRACT_LABEL_LEN: usize = "Census Tract ".len();

pub fn split_name(name: &str) -> NameParts {
    let mut parts = name.split(", ").map(str::to_string);
    let skip = |part: Option<String>, n: usize| part.map(|p| p.chars().skip(n).collect::<String>());

    NameParts {
        block_group: skip(parts.next(), BLOCK_GROUP_LABEL_LEN),
        tract: skip(parts.next(), TRACT_LABEL_LEN),
        county: parts.next(),
        state: parts.next(),
    }
}

fn text_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .with_context(|| format!("Missing column {}", name))?;
    let cast = column.cast(&DataType::String)?;
    Ok(cast
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// ACS tables outer-merged on their geography key, held column-wise.
#[derive(Debug, Default)]
pub struct AcsBlockGroups {
    geo_ids: Vec<String>,
    names: Vec<Option<String>>,
    index: HashMap<String, usize>,
    columns: HashMap<String, Vec<f64>>,
}

impl AcsBlockGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one ACS table. Its first row holds column descriptions and is
    /// skipped. Only the `wanted` value columns are kept.
    pub fn add_table(
        &mut self,
        df: &DataFrame,
        section: &AcsSection,
        wanted: &BTreeSet<String>,
    ) -> Result<()> {
        let geo_ids = text_column(df, &section.key_column)?;
        let names = text_column(df, &section.name_column)?;

        let rows: Vec<Option<usize>> = geo_ids
            .iter()
            .zip(names)
            .skip(1)
            .map(|(geo_id, name)| {
                let geo_id = geo_id.as_ref()?;
                Some(self.row_for(geo_id, name))
            })
            .collect();

        let mut kept = 0;
        for column in df.get_column_names() {
            let column = column.as_str();
            if !wanted.contains(column) {
                continue;
            }
            let values = text_column(df, column)?;
            let target = self.columns.entry(column.to_string()).or_default();
            for (row, value) in rows.iter().zip(values.iter().skip(1)) {
                let Some(row) = row else { continue };
                if target.len() <= *row {
                    target.resize(*row + 1, f64::NAN);
                }
                target[*row] = clean_acs_value(value.as_deref());
            }
            kept += 1;
        }

        let len = self.geo_ids.len();
        for values in self.columns.values_mut() {
            values.resize(len, f64::NAN);
        }

        debug!("ACS table: {} rows, {} value columns kept", rows.len(), kept);
        Ok(())
    }

    fn row_for(&mut self, geo_id: &str, name: Option<String>) -> usize {
        if let Some(row) = self.index.get(geo_id) {
            if self.names[*row].is_none() {
                self.names[*row] = name;
            }
            return *row;
        }
        let row = self.geo_ids.len();
        self.geo_ids.push(geo_id.to_string());
        self.names.push(name);
        self.index.insert(geo_id.to_string(), row);
        row
    }

    pub fn len(&self) -> usize {
        self.geo_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.geo_ids.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    fn value(&self, column: &str, row: usize) -> f64 {
        self.columns
            .get(column)
            .and_then(|values| values.get(row))
            .copied()
            .unwrap_or(f64::NAN)
    }
}

/// One EJScreen block group with its ACS counterpart.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockGroup {
    pub fips: i64,
    pub geo_id: String,
    pub geoid_12: String,
    pub name: NameParts,
    pub ej_values: Vec<f64>,
    acs_row: usize,
}

/// EJScreen rows left-joined with ACS, restricted to rows that found an ACS
/// block group.
#[derive(Debug)]
pub struct MergedCensus {
    pub rows: Vec<BlockGroup>,
    /// Output names of `BlockGroup::ej_values`, in order.
    pub ej_columns: Vec<String>,
    acs: AcsBlockGroups,
}

impl MergedCensus {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// An ACS column aligned with `rows`; `NaN` where absent.
    pub fn acs_column(&self, column: &str) -> Array1<f64> {
        self.rows
            .iter()
            .map(|row| self.acs.value(column, row.acs_row))
            .collect()
    }

    pub fn has_acs_column(&self, column: &str) -> bool {
        self.acs.has_column(column)
    }
}

/// Joins EJScreen block groups to ACS on the numeric block-group id.
pub fn merge_ejscreen(
    acs: AcsBlockGroups,
    acs_section: &AcsSection,
    ejscreen: &DataFrame,
    ej_section: &EjscreenSection,
) -> Result<MergedCensus> {
    let acs_excluded: HashSet<&str> = acs_section.excluded_states.iter().map(String::as_str).collect();
    let mut acs_by_id: HashMap<i64, (usize, NameParts)> = HashMap::with_capacity(acs.len());
    let mut acs_dropped = 0;

    for (row, geo_id) in acs.geo_ids.iter().enumerate() {
        let name = acs.names[row].as_deref().map(split_name).unwrap_or_default();
        if name.state.as_deref().is_some_and(|s| acs_excluded.contains(s)) {
            continue;
        }
        let id = geo_id
            .chars()
            .skip(acs_section.geo_id_prefix_len)
            .collect::<String>()
            .parse::<i64>();
        match id {
            Ok(id) => {
                acs_by_id.insert(id, (row, name));
            }
            Err(_) => acs_dropped += 1,
        }
    }
    if acs_dropped > 0 {
        warn!("{} ACS rows have no numeric block-group id", acs_dropped);
    }

    let ej_excluded: HashSet<&str> = ej_section.excluded_states.iter().map(String::as_str).collect();
    let ids = text_column(ejscreen, &ej_section.key_column)?;
    let states = text_column(ejscreen, &ej_section.state_column)?;
    let mut ej_values = Vec::with_capacity(ej_section.columns.len());
    for column in &ej_section.columns {
        ej_values.push(text_column(ejscreen, &column.source)?);
    }

    let mut rows = Vec::new();
    let mut seen_geo_ids = HashSet::new();
    let mut unmatched = 0;

    for (index, (id, state)) in ids.iter().zip(&states).enumerate() {
        if state.as_deref().is_some_and(|s| ej_excluded.contains(s)) {
            continue;
        }
        let Some(fips) = id.as_deref().and_then(|id| id.trim().parse::<i64>().ok()) else {
            unmatched += 1;
            continue;
        };
        let Some((acs_row, name)) = acs_by_id.get(&fips) else {
            unmatched += 1;
            continue;
        };
        let geo_id = &acs.geo_ids[*acs_row];
        if !seen_geo_ids.insert(geo_id.clone()) {
            continue;
        }

        rows.push(BlockGroup {
            fips,
            geo_id: geo_id.clone(),
            geoid_12: geo_id.chars().skip(acs_section.geo_id_prefix_len).collect(),
            name: name.clone(),
            ej_values: ej_values
                .iter()
                .map(|values| clean_acs_value(values[index].as_deref()))
                .collect(),
            acs_row: *acs_row,
        });
    }

    info!(
        "Merged {} block groups ({} EJScreen rows without ACS data)",
        rows.len(),
        unmatched
    );

    Ok(MergedCensus {
        rows,
        ej_columns: ej_section.columns.iter().map(|c| c.output.clone()).collect(),
        acs,
    })
}
