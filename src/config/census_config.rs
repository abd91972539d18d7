use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use crate::error::ReconcileError;

#[derive(Debug, Clone, Deserialize)]
pub struct CensusConfig {
    pub inputs: CensusInputs,
    pub acs: AcsSection,
    pub ejscreen: EjscreenSection,
    #[serde(default)]
    pub percent: Vec<PercentMetric>,
    pub education: Option<EducationScore>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CensusInputs {
    pub acs_tables: Vec<PathBuf>,
    pub ejscreen: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AcsSection {
    #[serde(default = "default_geo_id")]
    pub key_column: String,
    #[serde(default = "default_name")]
    pub name_column: String,
    /// Characters of `GEO_ID` before the block-group code.
    #[serde(default = "default_geo_prefix")]
    pub geo_id_prefix_len: usize,
    #[serde(default)]
    pub excluded_states: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EjscreenSection {
    #[serde(default = "default_ej_key")]
    pub key_column: String,
    #[serde(default = "default_state_name")]
    pub state_column: String,
    #[serde(default)]
    pub excluded_states: Vec<String>,
    /// Kept columns in output order.
    pub columns: Vec<ColumnRename>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnRename {
    pub source: String,
    pub output: String,
}

/// A block-group percentage. Column codes omit the `E`/`M` suffix.
#[derive(Debug, Clone, Deserialize)]
pub struct PercentMetric {
    pub name: String,
    pub total: String,
    pub numerators: Vec<String>,
    /// Sum several numerators; zeros count as missing.
    #[serde(default)]
    pub aggregate: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EducationScore {
    pub name: String,
    pub total: String,
    pub grades: Vec<GradeWeight>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GradeWeight {
    pub column: String,
    pub weight: f64,
}

fn default_geo_id() -> String {
    "GEO_ID".to_string()
}

fn default_name() -> String {
    "NAME".to_string()
}

fn default_geo_prefix() -> usize {
    9
}

fn default_ej_key() -> String {
    "ID".to_string()
}

fn default_state_name() -> String {
    "STATE_NAME".to_string()
}

pub fn estimate_column(code: &str) -> String {
    format!("{code}E")
}

pub fn moe_column(code: &str) -> String {
    format!("{code}M")
}

impl CensusConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read census config: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load census config: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: CensusConfig =
            toml::from_str(content).context("Failed to parse census config")?;
        config.validate()?;
        Ok(config)
    }

    /// Every ACS estimate and MOE column the metrics read.
    pub fn acs_columns(&self) -> BTreeSet<String> {
        let mut codes: Vec<&str> = Vec::new();
        for metric in &self.percent {
            codes.push(&metric.total);
            codes.extend(metric.numerators.iter().map(String::as_str));
        }
        if let Some(education) = &self.education {
            codes.push(&education.total);
            codes.extend(education.grades.iter().map(|g| g.column.as_str()));
        }

        codes
            .into_iter()
            .flat_map(|code| [estimate_column(code), moe_column(code)])
            .collect()
    }

    pub fn validate(&self) -> Result<(), ReconcileError> {
        if self.inputs.acs_tables.is_empty() {
            return Err(ReconcileError::MissingTable("acs_tables".to_string()));
        }

        let mut names = HashSet::new();
        for metric in &self.percent {
            if metric.numerators.is_empty() {
                return Err(ReconcileError::InvalidConfig(format!(
                    "metric {} has no numerator columns",
                    metric.name
                )));
            }
            if !metric.aggregate && metric.numerators.len() > 1 {
                return Err(ReconcileError::InvalidConfig(format!(
                    "metric {} lists several numerators but is not aggregated",
                    metric.name
                )));
            }
            if !names.insert(metric.name.as_str()) {
                return Err(ReconcileError::InvalidConfig(format!(
                    "metric {} is defined twice",
                    metric.name
                )));
            }
        }

        if let Some(education) = &self.education {
            if education.grades.is_empty() {
                return Err(ReconcileError::InvalidConfig(
                    "education score has no grade weights".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipped_census_config_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/src/configs/census.toml");
        let config = CensusConfig::from_file(path).unwrap();

        assert_eq!(config.acs.key_column, "GEO_ID");
        assert_eq!(config.acs.geo_id_prefix_len, 9);
        assert_eq!(config.percent.iter().filter(|m| !m.aggregate).count(), 8);
        assert_eq!(config.percent.iter().filter(|m| m.aggregate).count(), 9);
        assert_eq!(config.education.as_ref().unwrap().grades.len(), 21);

        let columns = config.acs_columns();
        assert!(columns.contains("B25009_010E"));
        assert!(columns.contains("B15003_025M"));
    }

    #[test]
    fn test_unaggregated_metric_with_two_numerators_rejected() {
        let content = r#"
            [inputs]
            acs_tables = ["a.csv"]
            ejscreen = "ej.csv"
            output = "out.csv"

            [acs]
            [ejscreen]
            columns = []

            [[percent]]
            name = "RENT"
            total = "B25009_001"
            numerators = ["B25009_010", "B25009_011"]
        "#;
        let err = CensusConfig::from_toml_str(content).unwrap_err();
        assert!(format!("{:#}", err).contains("RENT"));
    }

    #[test]
    fn test_column_suffixes() {
        assert_eq!(estimate_column("B25009_010"), "B25009_010E");
        assert_eq!(moe_column("B25009_010"), "B25009_010M");
    }
}
