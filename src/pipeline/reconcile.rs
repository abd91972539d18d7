use anyhow::{Context, Result};
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::summary::{RunReport, SkippedRegion};
use crate::config::{ExtractJoin, PipelineConfig, RegionTables, TRACKER_JOIN_SOURCE};
use crate::error::{IssueTally, ReconcileError};
use crate::models::{AuxPluggedRecord, CanonicalWellRecord, PriorReportRecord, RawTable, Region, RegionExtract};
use crate::processor::{
    Deduplicator, FieldMapper, IdentityMatcher, PluggedIndex, left_join, remove_actually_plugged,
    validate_coordinates,
};
use crate::storage::TableReader;

/// Every table one run consumes, already read into memory.
#[derive(Debug, Clone, Default)]
pub struct ReconciliationInputs {
    pub tracker: RawTable,
    pub prior_report: RawTable,
    pub extracts: Vec<RegionExtract>,
    /// Secondary tables extracts can be joined with, by name.
    pub supplementary: BTreeMap<String, RawTable>,
    pub aux_plugged: BTreeMap<Region, RawTable>,
}

impl ReconciliationInputs {
    /// Reads every input named in the pipeline config. Identifiers are kept
    /// as text so leading zeros survive.
    pub fn load(config: &PipelineConfig) -> Result<Self> {
        let reader = TableReader::text_only();

        let mut tracker = RawTable::default();
        for path in &config.tracker {
            let part = reader
                .read_csv(path)
                .with_context(|| format!("Failed to read tracker part {}", path.display()))?;
            tracker.append(part);
        }

        let prior_report = reader
            .read_csv(&config.prior_report)
            .context("Failed to read prior report")?;

        let mut extracts = Vec::with_capacity(config.extracts.len());
        for (region, path) in &config.extracts {
            let table = reader
                .read_csv(path)
                .with_context(|| format!("Failed to read {} extract", region))?;
            extracts.push(RegionExtract::new(*region, table));
        }

        let mut supplementary = BTreeMap::new();
        for (name, path) in &config.supplementary {
            let table = reader
                .read_csv(path)
                .with_context(|| format!("Failed to read supplementary table {}", name))?;
            supplementary.insert(name.clone(), table);
        }

        let mut aux_plugged = BTreeMap::new();
        for (region, path) in &config.aux_plugged {
            let table = reader
                .read_csv(path)
                .with_context(|| format!("Failed to read {} plugged table", region))?;
            aux_plugged.insert(*region, table);
        }

        info!(
            "Loaded {} tracker rows, {} prior report rows, {} extracts",
            tracker.len(),
            prior_report.len(),
            extracts.len()
        );

        Ok(Self {
            tracker,
            prior_report,
            extracts,
            supplementary,
            aux_plugged,
        })
    }

    fn supplementary_table(&self, name: &str) -> Option<&RawTable> {
        self.supplementary
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, table)| table)
    }
}

/// The three result sets and the run report.
#[derive(Debug, Clone)]
pub struct ReconciliationOutput {
    /// Current orphaned wells, each tagged with its lifecycle status.
    pub snapshot: Vec<CanonicalWellRecord>,
    pub newly_orphaned: Vec<CanonicalWellRecord>,
    pub newly_plugged: Vec<PriorReportRecord>,
    /// Snapshot wells that turned out to be plugged already.
    pub actually_plugged: Vec<CanonicalWellRecord>,
    pub report: RunReport,
}

pub struct Reconciler<'a> {
    tables: &'a RegionTables,
    mapper: FieldMapper<'a>,
}

impl<'a> Reconciler<'a> {
    pub fn new(tables: &'a RegionTables) -> Self {
        Reconciler {
            tables,
            mapper: FieldMapper::new(tables),
        }
    }

    pub fn run(&self, inputs: &ReconciliationInputs) -> Result<ReconciliationOutput, ReconcileError> {
        self.check_inputs(inputs)?;

        let mut tally = IssueTally::new();
        let mut report = RunReport::default();

        // Tracker
        let tracker = self.mapper.map_tracker(&inputs.tracker, &mut tally);
        let (tracker, tracker_dedup) = Deduplicator.deduplicate(tracker);
        tracker_dedup.record_issues(&mut tally);
        info!("Tracker: {} wells after dedup", tracker.len());

        let mut combined: Vec<CanonicalWellRecord> = tracker
            .iter()
            .filter(|r| self.tables.is_fully_included(r.region) && r.is_orphaned())
            .cloned()
            .collect();
        info!("{} orphaned wells from fully included regions", combined.len());

        // Extracts
        for region in self.tables.regions.keys() {
            if !inputs.extracts.iter().any(|e| e.region == *region) {
                warn!("No extract supplied for {}, skipping", region);
                report.skipped_regions.push(SkippedRegion {
                    region: region.to_string(),
                    reason: "no extract supplied".to_string(),
                });
            }
        }

        for extract in &inputs.extracts {
            match self.map_extract(extract, inputs, &tracker, &mut tally) {
                Ok(records) => {
                    info!("{}: {} rows mapped", extract.region, records.len());
                    combined.extend(records);
                }
                Err(e) => {
                    warn!("Skipping {}: {}", extract.region, e);
                    report.skipped_regions.push(SkippedRegion {
                        region: extract.region.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        // Relaxed snapshot
        let combined = validate_coordinates(combined, self.tables, &mut tally);
        let (relaxed, snapshot_dedup) = Deduplicator.deduplicate(combined);
        snapshot_dedup.record_issues(&mut tally);
        info!("Relaxed snapshot: {} wells", relaxed.len());

        // Actually plugged
        let aux = self.map_aux_plugged(inputs);
        let plugged_index = PluggedIndex::build(self.tables, &tracker, &aux);
        let (mut snapshot, actually_plugged) =
            remove_actually_plugged(relaxed.clone(), &plugged_index, self.tables);

        // Lifecycle
        let prior = self.mapper.map_prior_report(&inputs.prior_report);
        let matcher = IdentityMatcher::new(self.tables, &prior);
        matcher.assign_lifecycle(&mut snapshot);
        let newly_orphaned = matcher.newly_appeared(&snapshot);
        let newly_plugged = matcher.newly_resolved(&relaxed, &actually_plugged, &plugged_index);

        report.tracker_dedup = tracker_dedup;
        report.snapshot_dedup = snapshot_dedup;
        report.issues = tally;
        report.count_regions(&snapshot, &actually_plugged, &newly_orphaned, &newly_plugged);

        info!(
            "Reconciled: {} orphaned, {} newly orphaned, {} newly plugged, {} actually plugged",
            snapshot.len(),
            newly_orphaned.len(),
            newly_plugged.len(),
            actually_plugged.len()
        );

        Ok(ReconciliationOutput {
            snapshot,
            newly_orphaned,
            newly_plugged,
            actually_plugged,
            report,
        })
    }

    /// The tracker and prior report must at least carry their identifier
    /// columns; without them nothing downstream can match.
    fn check_inputs(&self, inputs: &ReconciliationInputs) -> Result<(), ReconcileError> {
        let tracker_fields = &self.tables.tracker.fields;
        for column in [tracker_fields.identifier.as_deref(), tracker_fields.region.as_deref()]
            .into_iter()
            .flatten()
        {
            if !inputs.tracker.has_column(column) {
                return Err(ReconcileError::MissingTable(format!(
                    "tracker column {}",
                    column
                )));
            }
        }

        if let Some(column) = self.tables.prior_report.fields.identifier.as_deref() {
            if !inputs.prior_report.has_column(column) {
                return Err(ReconcileError::MissingTable(format!(
                    "prior report column {}",
                    column
                )));
            }
        }

        Ok(())
    }

    fn map_extract(
        &self,
        extract: &RegionExtract,
        inputs: &ReconciliationInputs,
        tracker: &[CanonicalWellRecord],
        tally: &mut IssueTally,
    ) -> Result<Vec<CanonicalWellRecord>, ReconcileError> {
        let join = self.tables.profile(extract.region).and_then(|p| p.join.as_ref());
        let Some(join) = join else {
            return self.mapper.map_extract(extract, tally);
        };

        let joined = RegionExtract::new(extract.region, self.join_table(extract, join, inputs, tracker)?);
        self.mapper.map_extract(&joined, tally)
    }

    fn join_table(
        &self,
        extract: &RegionExtract,
        join: &ExtractJoin,
        inputs: &ReconciliationInputs,
        tracker: &[CanonicalWellRecord],
    ) -> Result<RawTable, ReconcileError> {
        // Only the tracker rows that survived dedup, so a duplicated well
        // joins the row dedup kept.
        if join.with.eq_ignore_ascii_case(TRACKER_JOIN_SOURCE) {
            let rows = tracker
                .iter()
                .filter(|record| record.region == extract.region)
                .filter_map(|record| record.source_row);
            let tracker_rows = inputs.tracker.select_rows(rows);
            return Ok(left_join(&extract.table, &tracker_rows, join));
        }

        let right = inputs
            .supplementary_table(&join.with)
            .ok_or_else(|| ReconcileError::SchemaMismatch {
                region: extract.region.to_string(),
                reason: format!("join table {} was not supplied", join.with),
            })?;
        Ok(left_join(&extract.table, right, join))
    }

    fn map_aux_plugged(&self, inputs: &ReconciliationInputs) -> Vec<AuxPluggedRecord> {
        let mut aux = Vec::new();
        for (region, table) in &inputs.aux_plugged {
            match self.tables.aux_plugged.get(region) {
                Some(profile) => aux.extend(self.mapper.map_aux_plugged(*region, profile, table)),
                None => warn!("No column mapping for the {} plugged table, ignoring it", region),
            }
        }
        aux
    }
}
