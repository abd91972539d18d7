use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::error::{IssueTally, RecordIssue};
use crate::models::{CanonicalWellRecord, WellStatus};

/// Coordinates compared bitwise so `NaN`-free floats hash.
type CoordinateKey = (Option<u64>, Option<u64>);

/// Row counts removed at each stage of a deduplication pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DedupReport {
    pub input: usize,
    pub missing_identifier: usize,
    pub exact_duplicates: usize,
    pub location_conflict_rows: usize,
    pub location_conflict_identifiers: usize,
    pub status_conflicts: usize,
    pub output: usize,
}

impl DedupReport {
    /// Both issues are counted per dropped row.
    pub fn record_issues(&self, tally: &mut IssueTally) {
        tally.add(RecordIssue::MissingIdentifier, self.missing_identifier);
        tally.add(
            RecordIssue::UnresolvableLocationConflict,
            self.location_conflict_rows,
        );
    }
}

/// Collapses records sharing an identifier down to at most one per
/// identifier. Surviving rows keep their relative input order.
pub struct Deduplicator;

impl Deduplicator {
    pub fn deduplicate(
        &self,
        records: Vec<CanonicalWellRecord>,
    ) -> (Vec<CanonicalWellRecord>, DedupReport) {
        let mut report = DedupReport {
            input: records.len(),
            ..DedupReport::default()
        };

        let records: Vec<CanonicalWellRecord> = records
            .into_iter()
            .filter(|record| record.usable_identifier().is_some())
            .collect();
        report.missing_identifier = report.input - records.len();

        let records = self.collapse_exact(records, &mut report);
        let records = self.drop_location_conflicts(records, &mut report);
        let records = self.resolve_status_conflicts(records, &mut report);

        report.output = records.len();
        debug!(
            "Dedup: {} in, {} missing id, {} exact, {} conflict rows, {} status, {} out",
            report.input,
            report.missing_identifier,
            report.exact_duplicates,
            report.location_conflict_rows,
            report.status_conflicts,
            report.output
        );
        (records, report)
    }

    /// Stage 1: identical {identifier, status, coordinates}, last wins.
    fn collapse_exact(
        &self,
        records: Vec<CanonicalWellRecord>,
        report: &mut DedupReport,
    ) -> Vec<CanonicalWellRecord> {
        let mut last_index: HashMap<(String, Option<WellStatus>, CoordinateKey), usize> =
            HashMap::new();
        for (index, record) in records.iter().enumerate() {
            let key = (
                identifier_of(record),
                record.status.clone(),
                coordinate_key(record),
            );
            last_index.insert(key, index);
        }

        let keep: HashSet<usize> = last_index.into_values().collect();
        report.exact_duplicates = records.len() - keep.len();
        retain_indices(records, &keep)
    }

    /// Stage 2: an identifier seen at more than one location cannot be
    /// trusted; every row carrying it goes.
    fn drop_location_conflicts(
        &self,
        records: Vec<CanonicalWellRecord>,
        report: &mut DedupReport,
    ) -> Vec<CanonicalWellRecord> {
        let mut locations: HashMap<String, HashSet<CoordinateKey>> = HashMap::new();
        for record in &records {
            locations
                .entry(identifier_of(record))
                .or_default()
                .insert(coordinate_key(record));
        }

        let conflicting: HashSet<String> = locations
            .into_iter()
            .filter(|(_, coordinates)| coordinates.len() > 1)
            .map(|(identifier, _)| identifier)
            .collect();
        report.location_conflict_identifiers = conflicting.len();

        let before = records.len();
        let records: Vec<CanonicalWellRecord> = records
            .into_iter()
            .filter(|record| !conflicting.contains(&identifier_of(record)))
            .collect();
        report.location_conflict_rows = before - records.len();
        records
    }

    /// Stage 3: last PLUGGED, else last ORPHANED, else the last row.
    fn resolve_status_conflicts(
        &self,
        records: Vec<CanonicalWellRecord>,
        report: &mut DedupReport,
    ) -> Vec<CanonicalWellRecord> {
        let mut chosen: HashMap<String, (u8, usize)> = HashMap::new();
        for (index, record) in records.iter().enumerate() {
            let rank = match record.status {
                Some(WellStatus::Plugged) => 2,
                Some(WellStatus::Orphaned) => 1,
                _ => 0,
            };
            chosen
                .entry(identifier_of(record))
                .and_modify(|best| {
                    if rank >= best.0 {
                        *best = (rank, index);
                    }
                })
                .or_insert((rank, index));
        }

        let keep: HashSet<usize> = chosen.into_values().map(|(_, index)| index).collect();
        report.status_conflicts = records.len() - keep.len();
        retain_indices(records, &keep)
    }
}

fn identifier_of(record: &CanonicalWellRecord) -> String {
    record.usable_identifier().unwrap_or_default().to_string()
}

fn coordinate_key(record: &CanonicalWellRecord) -> CoordinateKey {
    (
        record.latitude.map(f64::to_bits),
        record.longitude.map(f64::to_bits),
    )
}

fn retain_indices(
    records: Vec<CanonicalWellRecord>,
    keep: &HashSet<usize>,
) -> Vec<CanonicalWellRecord> {
    records
        .into_iter()
        .enumerate()
        .filter(|(index, _)| keep.contains(index))
        .map(|(_, record)| record)
        .collect()
}
