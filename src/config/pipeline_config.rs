use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ReconcileError;
use crate::models::Region;

pub const ENV_PREFIX: &str = "WELLS";

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfigFile {
    pub inputs: InputSection,
    pub output: OutputSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputSection {
    pub region_tables: PathBuf,
    pub region_bounds: Option<PathBuf>,
    /// One or more tracker tables, concatenated in order.
    pub tracker: Vec<PathBuf>,
    pub prior_report: PathBuf,
    /// Region name → state extract.
    #[serde(default)]
    pub extracts: BTreeMap<String, PathBuf>,
    /// Extra tables extract joins can refer to by name.
    #[serde(default)]
    pub supplementary: BTreeMap<String, PathBuf>,
    /// Region name → auxiliary all-wells table.
    #[serde(default)]
    pub aux_plugged: BTreeMap<String, PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputSection {
    pub directory: PathBuf,
    #[serde(default = "default_true")]
    pub parquet: bool,
    /// Nest outputs under `YYYY/MM/DD/<run id>`.
    #[serde(default)]
    pub dated: bool,
}

fn default_true() -> bool {
    true
}

/// Where the reconciliation run reads from and writes to.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub region_tables: PathBuf,
    pub region_bounds: Option<PathBuf>,
    pub tracker: Vec<PathBuf>,
    pub prior_report: PathBuf,
    pub extracts: BTreeMap<Region, PathBuf>,
    pub supplementary: BTreeMap<String, PathBuf>,
    pub aux_plugged: BTreeMap<Region, PathBuf>,
    pub output_dir: PathBuf,
    pub write_parquet: bool,
    pub dated_output: bool,
}

impl PipelineConfig {
    /// Loads the TOML file, then lets `WELLS_*` environment variables
    /// override individual keys (`WELLS_OUTPUT__DIRECTORY=/tmp/out`).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("Failed to read pipeline config: {}", path.display()))?;

        let file: PipelineConfigFile = settings
            .try_deserialize()
            .with_context(|| format!("Failed to parse pipeline config: {}", path.display()))?;

        Ok(Self::from_config_file(file)?)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: PipelineConfigFile =
            toml::from_str(content).context("Failed to parse pipeline config")?;
        Ok(Self::from_config_file(file)?)
    }

    pub fn from_config_file(file: PipelineConfigFile) -> Result<Self, ReconcileError> {
        let config = Self {
            region_tables: file.inputs.region_tables,
            region_bounds: file.inputs.region_bounds,
            tracker: file.inputs.tracker,
            prior_report: file.inputs.prior_report,
            extracts: keyed_paths(file.inputs.extracts)?,
            supplementary: file.inputs.supplementary,
            aux_plugged: keyed_paths(file.inputs.aux_plugged)?,
            output_dir: file.output.directory,
            write_parquet: file.output.parquet,
            dated_output: file.output.dated,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconcileError> {
        if self.tracker.is_empty() {
            return Err(ReconcileError::InvalidConfig(
                "at least one tracker table is required".to_string(),
            ));
        }
        if self.output_dir.as_os_str().is_empty() {
            return Err(ReconcileError::InvalidConfig(
                "output directory must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn keyed_paths(paths: BTreeMap<String, PathBuf>) -> Result<BTreeMap<Region, PathBuf>, ReconcileError> {
    paths
        .into_iter()
        .map(|(name, path)| Ok((name.parse::<Region>()?, path)))
        .collect()
}
