//! Error types for the reconciliation run.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::models::Region;

/// Run-level failures. Anything here stops the run or is surfaced to the
/// caller as a configuration problem.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// A lookup or mapping table the run depends on is missing entirely
    #[error("Required table missing: {0}")]
    MissingTable(String),

    /// A region name that is not one of the known jurisdictions
    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    /// Structurally invalid table contents
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Mapping tables and supplied inputs disagree about regions
    #[error("Schema mismatch for {region}: {reason}")]
    SchemaMismatch { region: String, reason: String },
}

/// Per-record conditions. These are recovered locally and counted, never
/// raised. Each count is a number of records; a location conflict adds one
/// for every row dropped, not one per identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordIssue {
    MissingIdentifier,
    UnresolvableLocationConflict,
    InvalidCoordinate,
    UnmappableRegionField,
    UnknownRegion,
    ExcludedRegion,
}

/// Counts of per-record issues, plus which canonical fields each region
/// could not supply.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IssueTally {
    pub counts: BTreeMap<RecordIssue, usize>,
    pub unmapped_fields: BTreeMap<String, Vec<String>>,
}

impl IssueTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, issue: RecordIssue) {
        self.add(issue, 1);
    }

    pub fn add(&mut self, issue: RecordIssue, count: usize) {
        if count > 0 {
            *self.counts.entry(issue).or_insert(0) += count;
        }
    }

    pub fn count(&self, issue: RecordIssue) -> usize {
        self.counts.get(&issue).copied().unwrap_or(0)
    }

    pub fn unmapped_field(&mut self, region: Region, field: &str) {
        let fields = self.unmapped_fields.entry(region.to_string()).or_default();
        if !fields.iter().any(|f| f == field) {
            fields.push(field.to_string());
            *self
                .counts
                .entry(RecordIssue::UnmappableRegionField)
                .or_insert(0) += 1;
        }
    }

    pub fn merge(&mut self, other: &IssueTally) {
        for (issue, count) in &other.counts {
            if *issue != RecordIssue::UnmappableRegionField {
                self.add(*issue, *count);
            }
        }
        for (region, fields) in &other.unmapped_fields {
            if let Ok(region) = region.parse::<Region>() {
                for field in fields {
                    self.unmapped_field(region, field);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmapped_fields_counted_once_per_region() {
        let mut tally = IssueTally::new();
        tally.unmapped_field(Region::Texas, "name");
        tally.unmapped_field(Region::Texas, "name");
        tally.unmapped_field(Region::Utah, "spud_date");

        assert_eq!(tally.count(RecordIssue::UnmappableRegionField), 2);
        assert_eq!(tally.unmapped_fields["Texas"], vec!["name".to_string()]);
    }

    #[test]
    fn test_merge_adds_counts() {
        let mut left = IssueTally::new();
        left.add(RecordIssue::InvalidCoordinate, 2);
        let mut right = IssueTally::new();
        right.add(RecordIssue::InvalidCoordinate, 3);
        right.unmapped_field(Region::Alaska, "county");

        left.merge(&right);
        assert_eq!(left.count(RecordIssue::InvalidCoordinate), 5);
        assert_eq!(left.count(RecordIssue::UnmappableRegionField), 1);
    }
}
