use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use crate::error::ReconcileError;
use crate::models::{Region, format_number};
use crate::processor::identifier::IdentifierTransform;

/// Region tables exactly as written in `region_tables.toml`. Region names are
/// still plain strings here; [`RegionTables`] is the validated form.
#[derive(Debug, Clone, Deserialize)]
pub struct RegionTablesFile {
    #[serde(default)]
    pub orphaned_status: BTreeMap<String, Vec<StatusCode>>,
    #[serde(default)]
    pub plugged_status: BTreeMap<String, Vec<StatusCode>>,
    pub tracker: Option<TrackerProfile>,
    #[serde(default)]
    pub regions: BTreeMap<String, RegionProfile>,
    #[serde(default)]
    pub fully_included_regions: Vec<String>,
    #[serde(default)]
    pub excluded_regions: Vec<String>,
    #[serde(default)]
    pub placeholder_prefixes: Vec<String>,
    pub prior_report: Option<PriorReportProfile>,
    #[serde(default)]
    pub aux_plugged: BTreeMap<String, AuxPluggedProfile>,
}

/// A raw status literal. Some regions publish numeric codes.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StatusCode {
    Int(i64),
    Text(String),
}

impl StatusCode {
    fn key(&self) -> String {
        match self {
            StatusCode::Int(i) => i.to_string(),
            StatusCode::Text(s) => status_text_key(s).unwrap_or_default(),
        }
    }
}

/// Lookup key for a textual status: trimmed, and numeric text such as `7.0`
/// collapsed to the same form as the number. Blank text has no key.
pub fn status_text_key(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let numeric = trimmed.parse::<f64>().ok().and_then(format_number);
    Some(numeric.unwrap_or_else(|| trimmed.to_string()))
}

/// Accepted raw status literals for one region, stored by their text key so
/// `7`, `"7"` and `7.0` all look the same.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusSet {
    keys: HashSet<String>,
}

impl StatusSet {
    pub fn from_codes(codes: &[StatusCode]) -> Self {
        Self {
            keys: codes.iter().map(StatusCode::key).collect(),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Fields of the canonical well record a source column can feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    Identifier,
    Latitude,
    Longitude,
    Region,
    County,
    Name,
    Operator,
    Status,
    SpudDate,
    Township,
    Range,
    Section,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 12] = [
        CanonicalField::Identifier,
        CanonicalField::Latitude,
        CanonicalField::Longitude,
        CanonicalField::Region,
        CanonicalField::County,
        CanonicalField::Name,
        CanonicalField::Operator,
        CanonicalField::Status,
        CanonicalField::SpudDate,
        CanonicalField::Township,
        CanonicalField::Range,
        CanonicalField::Section,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CanonicalField::Identifier => "identifier",
            CanonicalField::Latitude => "latitude",
            CanonicalField::Longitude => "longitude",
            CanonicalField::Region => "region",
            CanonicalField::County => "county",
            CanonicalField::Name => "name",
            CanonicalField::Operator => "operator",
            CanonicalField::Status => "status",
            CanonicalField::SpudDate => "spud_date",
            CanonicalField::Township => "township",
            CanonicalField::Range => "range",
            CanonicalField::Section => "section",
        }
    }
}

/// Canonical field → source column name. Absent entries are deliberate.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldMapping {
    pub identifier: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    /// Overrides the region tag with a source column.
    pub region: Option<String>,
    pub county: Option<String>,
    pub name: Option<String>,
    pub operator: Option<String>,
    pub status: Option<String>,
    pub spud_date: Option<String>,
    pub township: Option<String>,
    pub range: Option<String>,
    pub section: Option<String>,
}

impl FieldMapping {
    pub fn column(&self, field: CanonicalField) -> Option<&str> {
        let column = match field {
            CanonicalField::Identifier => &self.identifier,
            CanonicalField::Latitude => &self.latitude,
            CanonicalField::Longitude => &self.longitude,
            CanonicalField::Region => &self.region,
            CanonicalField::County => &self.county,
            CanonicalField::Name => &self.name,
            CanonicalField::Operator => &self.operator,
            CanonicalField::Status => &self.status,
            CanonicalField::SpudDate => &self.spud_date,
            CanonicalField::Township => &self.township,
            CanonicalField::Range => &self.range,
            CanonicalField::Section => &self.section,
        };
        column.as_deref()
    }
}

/// How a region's records are located on the ground.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatedBy {
    #[default]
    Coordinates,
    /// Township/range/section only; coordinates are not required.
    LegalLand,
}

/// How a region's snapshot records are matched against the prior report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    #[default]
    Identifier,
    /// Well name + well number (held in the spud-date field).
    NameAndNumber,
    /// County + well name + well number (held in the operator field).
    CountyNameNumber,
}

/// How a region's snapshot records are matched against plugged records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PluggedMatch {
    #[default]
    Identifier,
    OperatorAndName,
    /// Against the region's auxiliary all-wells table.
    LegalLocation,
}

/// Left-join a region extract with another table before mapping.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExtractJoin {
    /// `"tracker"` or the name of a supplementary input table.
    pub with: String,
    pub left_on: String,
    pub right_on: String,
}

pub const TRACKER_JOIN_SOURCE: &str = "tracker";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RegionProfile {
    #[serde(default)]
    pub fields: FieldMapping,
    pub identifier_transform: Option<IdentifierTransform>,
    /// Assign 1-based row numbers as identifiers.
    #[serde(default)]
    pub synthetic_identifier: bool,
    #[serde(default)]
    pub located_by: LocatedBy,
    #[serde(default)]
    pub match_strategy: MatchStrategy,
    #[serde(default)]
    pub plugged_match: PluggedMatch,
    #[serde(default)]
    pub exclude_from_export: bool,
    /// The spud-date field holds something else in this region.
    #[serde(default)]
    pub clear_spud_date_on_export: bool,
    pub join: Option<ExtractJoin>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TrackerProfile {
    pub fields: FieldMapping,
    #[serde(default = "default_min_identifier_len")]
    pub min_identifier_len: usize,
}

fn default_min_identifier_len() -> usize {
    10
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct IdentifierTrim {
    #[serde(default)]
    pub prefix: usize,
    #[serde(default)]
    pub suffix: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PriorReportColumns {
    pub identifier: Option<String>,
    pub region: Option<String>,
    pub county: Option<String>,
    pub well_name: Option<String>,
    pub well_number: Option<String>,
    pub township: Option<String>,
    pub range: Option<String>,
    pub section: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PriorReportProfile {
    pub fields: PriorReportColumns,
    #[serde(default)]
    pub identifier_trim: IdentifierTrim,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuxPluggedColumns {
    pub identifier: Option<String>,
    pub lease: Option<String>,
    pub well: Option<String>,
    pub township: Option<String>,
    pub range: Option<String>,
    pub section: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuxPluggedProfile {
    pub plugged_status: String,
    pub fields: AuxPluggedColumns,
}

/// Validated, region-keyed lookup and mapping tables. Loaded once and
/// shared read-only by every stage.
#[derive(Debug, Clone)]
pub struct RegionTables {
    pub orphaned_status: HashMap<Region, StatusSet>,
    pub plugged_status: HashMap<Region, StatusSet>,
    pub tracker: TrackerProfile,
    pub regions: BTreeMap<Region, RegionProfile>,
    pub fully_included: Vec<Region>,
    pub excluded: HashSet<Region>,
    pub placeholder_prefixes: Vec<String>,
    pub prior_report: PriorReportProfile,
    pub aux_plugged: BTreeMap<Region, AuxPluggedProfile>,
}

impl RegionTables {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read region tables: {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load region tables: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: RegionTablesFile =
            toml::from_str(content).context("Failed to parse region tables")?;
        Ok(Self::from_tables_file(file)?)
    }

    pub fn from_tables_file(file: RegionTablesFile) -> Result<Self, ReconcileError> {
        if file.orphaned_status.is_empty() {
            return Err(ReconcileError::MissingTable("orphaned_status".to_string()));
        }
        if file.plugged_status.is_empty() {
            return Err(ReconcileError::MissingTable("plugged_status".to_string()));
        }
        let tracker = file
            .tracker
            .ok_or_else(|| ReconcileError::MissingTable("tracker".to_string()))?;
        let prior_report = file
            .prior_report
            .ok_or_else(|| ReconcileError::MissingTable("prior_report".to_string()))?;
        if file.regions.is_empty() && file.fully_included_regions.is_empty() {
            return Err(ReconcileError::MissingTable("regions".to_string()));
        }

        let tables = Self {
            orphaned_status: status_table(&file.orphaned_status)?,
            plugged_status: status_table(&file.plugged_status)?,
            tracker,
            regions: keyed_by_region(file.regions)?,
            fully_included: parse_regions(&file.fully_included_regions)?,
            excluded: parse_regions(&file.excluded_regions)?.into_iter().collect(),
            placeholder_prefixes: file.placeholder_prefixes,
            prior_report,
            aux_plugged: keyed_by_region(file.aux_plugged)?,
        };

        tables.validate()?;
        Ok(tables)
    }

    pub fn validate(&self) -> Result<(), ReconcileError> {
        if self.tracker.fields.region.is_none() {
            return Err(ReconcileError::InvalidConfig(
                "tracker mapping must name its region column".to_string(),
            ));
        }
        if self.tracker.fields.identifier.is_none() {
            return Err(ReconcileError::InvalidConfig(
                "tracker mapping must name its identifier column".to_string(),
            ));
        }
        if self.prior_report.fields.identifier.is_none() {
            return Err(ReconcileError::InvalidConfig(
                "prior report mapping must name its identifier column".to_string(),
            ));
        }

        for (region, profile) in &self.regions {
            if profile.synthetic_identifier && profile.fields.identifier.is_some() {
                return Err(ReconcileError::InvalidConfig(format!(
                    "{region} maps an identifier column and also asks for synthetic identifiers"
                )));
            }
            if profile.plugged_match == PluggedMatch::LegalLocation
                && !self.aux_plugged.contains_key(region)
            {
                return Err(ReconcileError::InvalidConfig(format!(
                    "{region} matches plugged wells by legal location but has no aux_plugged table"
                )));
            }
        }

        Ok(())
    }

    pub fn profile(&self, region: Region) -> Option<&RegionProfile> {
        self.regions.get(&region)
    }

    pub fn match_strategy(&self, region: Region) -> MatchStrategy {
        self.profile(region)
            .map(|p| p.match_strategy)
            .unwrap_or_default()
    }

    pub fn plugged_match(&self, region: Region) -> PluggedMatch {
        self.profile(region)
            .map(|p| p.plugged_match)
            .unwrap_or_default()
    }

    pub fn located_by(&self, region: Region) -> LocatedBy {
        self.profile(region).map(|p| p.located_by).unwrap_or_default()
    }

    pub fn is_fully_included(&self, region: Region) -> bool {
        self.fully_included.contains(&region)
    }

    pub fn is_excluded(&self, region: Region) -> bool {
        self.excluded.contains(&region)
    }

    pub fn is_placeholder(&self, identifier: &str) -> bool {
        self.placeholder_prefixes
            .iter()
            .any(|prefix| identifier.starts_with(prefix.as_str()))
    }
}

fn parse_regions(names: &[String]) -> Result<Vec<Region>, ReconcileError> {
    names.iter().map(|name| name.parse()).collect()
}

fn keyed_by_region<T>(table: BTreeMap<String, T>) -> Result<BTreeMap<Region, T>, ReconcileError> {
    table
        .into_iter()
        .map(|(name, value)| Ok((name.parse::<Region>()?, value)))
        .collect()
}

fn status_table(
    table: &BTreeMap<String, Vec<StatusCode>>,
) -> Result<HashMap<Region, StatusSet>, ReconcileError> {
    table
        .iter()
        .map(|(name, codes)| Ok((name.parse::<Region>()?, StatusSet::from_codes(codes))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        fully_included_regions = ["Ohio"]
        placeholder_prefixes = ["ID", "D"]

        [orphaned_status]
        Ohio = ["OR", "OP"]

        [plugged_status]
        Texas = [7, "8"]

        [tracker.fields]
        identifier = "api_num"
        region = "stusps"
        status = "well_status"

        [prior_report.fields]
        identifier = "Well identifier"

        [regions.California]
        identifier_transform = { kind = "zero_pad", width = 10 }

        [regions.California.fields]
        identifier = "API 10"
        latitude = "lat"
        longitude = "lon"
    "#;

    #[test]
    fn test_loads_minimal_tables() {
        let tables = RegionTables::from_toml_str(MINIMAL).unwrap();

        assert!(tables.orphaned_status[&Region::Ohio].contains_key("OR"));
        assert!(tables.plugged_status[&Region::Texas].contains_key("7"));
        assert!(tables.plugged_status[&Region::Texas].contains_key("8"));
        assert_eq!(tables.tracker.min_identifier_len, 10);
        assert!(tables.is_fully_included(Region::Ohio));
        assert_eq!(
            tables.profile(Region::California).unwrap().identifier_transform,
            Some(IdentifierTransform::ZeroPad { width: 10 })
        );
        assert_eq!(tables.match_strategy(Region::Texas), MatchStrategy::Identifier);
    }

    #[test]
    fn test_missing_status_table_is_fatal() {
        let content = MINIMAL.replace("[orphaned_status]\n        Ohio = [\"OR\", \"OP\"]", "");
        let err = RegionTables::from_toml_str(&content).unwrap_err();
        assert!(format!("{:#}", err).contains("orphaned_status"));
    }

    #[test]
    fn test_unknown_region_is_rejected() {
        let content = MINIMAL.replace("Ohio = [\"OR\", \"OP\"]", "Atlantis = [\"OR\"]");
        let err = RegionTables::from_toml_str(&content).unwrap_err();
        assert!(format!("{:#}", err).contains("Atlantis"));
    }

    #[test]
    fn test_placeholder_prefixes() {
        let tables = RegionTables::from_toml_str(MINIMAL).unwrap();
        assert!(tables.is_placeholder("ID0001"));
        assert!(tables.is_placeholder("D12"));
        assert!(!tables.is_placeholder("4200112345"));
    }

    #[test]
    fn test_shipped_region_tables_load() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/src/configs/region_tables.toml");
        let tables = RegionTables::from_file(path).unwrap();

        assert_eq!(tables.fully_included.len(), 10);
        // Oklahoma wells come from both the tracker and the state extract.
        assert!(tables.is_fully_included(Region::Oklahoma));
        assert!(tables.profile(Region::Oklahoma).is_some());
        assert_eq!(tables.match_strategy(Region::Indiana), MatchStrategy::NameAndNumber);
        assert_eq!(tables.match_strategy(Region::Kansas), MatchStrategy::CountyNameNumber);
        assert_eq!(tables.located_by(Region::Kansas), LocatedBy::LegalLand);
        assert!(tables.aux_plugged.contains_key(&Region::Kansas));
        assert!(tables.is_excluded(Region::Maryland));
    }
}
