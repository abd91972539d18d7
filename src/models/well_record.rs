use serde::Serialize;
use std::fmt;

use super::Region;

/// Canonical well status after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum WellStatus {
    Orphaned,
    Plugged,
    /// Raw status that matched neither lookup table, passed through as-is.
    Other(String),
}

impl WellStatus {
    pub fn as_str(&self) -> &str {
        match self {
            WellStatus::Orphaned => "ORPHANED",
            WellStatus::Plugged => "PLUGGED",
            WellStatus::Other(raw) => raw,
        }
    }
}

impl fmt::Display for WellStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an orphaned well stands relative to the prior federal report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LifecycleStatus {
    NewlyOrphaned,
    OrphanedSincePriorReport,
}

impl LifecycleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleStatus::NewlyOrphaned => "Newly orphaned",
            LifecycleStatus::OrphanedSincePriorReport => "Orphaned since prior report",
        }
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Township / range / section legal land description, used by regions
/// that locate wells by survey grid rather than coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LegalLocation {
    pub township: String,
    pub range: String,
    pub section: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalWellRecord {
    pub identifier: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub region: Region,
    pub county: Option<String>,
    pub name: Option<String>,
    pub operator_name: Option<String>,
    pub status: Option<WellStatus>,
    /// Indiana stores its well number here.
    pub spud_date: Option<String>,
    pub legal_location: Option<LegalLocation>,
    pub lifecycle_status: Option<LifecycleStatus>,
    /// Row of the source table this record was mapped from.
    #[serde(skip)]
    pub source_row: Option<usize>,
}

impl CanonicalWellRecord {
    pub fn new(region: Region) -> Self {
        Self {
            identifier: None,
            latitude: None,
            longitude: None,
            region,
            county: None,
            name: None,
            operator_name: None,
            status: None,
            spud_date: None,
            legal_location: None,
            lifecycle_status: None,
            source_row: None,
        }
    }

    pub fn is_orphaned(&self) -> bool {
        self.status == Some(WellStatus::Orphaned)
    }

    pub fn is_plugged(&self) -> bool {
        self.status == Some(WellStatus::Plugged)
    }

    /// Identifier with empty strings treated as absent.
    pub fn usable_identifier(&self) -> Option<&str> {
        self.identifier
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}
