use std::collections::{HashMap, HashSet};
use tracing::info;

use crate::config::{PluggedMatch, RegionTables};
use crate::models::{
    AuxPluggedRecord, CanonicalWellRecord, LegalLocationKey, OperatorNameKey, Region,
};

/// Everything known to be plugged, keyed every way a region can be matched.
#[derive(Debug, Default)]
pub struct PluggedIndex {
    identifiers: HashSet<String>,
    operator_names: HashMap<Region, HashSet<OperatorNameKey>>,
    legal_locations: HashMap<Region, HashSet<LegalLocationKey>>,
}

impl PluggedIndex {
    /// `tracker` is the mapped tracker; only its PLUGGED rows are indexed.
    /// Auxiliary rows count when their status equals the region's configured
    /// plugged literal.
    pub fn build(
        tables: &RegionTables,
        tracker: &[CanonicalWellRecord],
        aux: &[AuxPluggedRecord],
    ) -> Self {
        let mut index = PluggedIndex::default();

        for record in tracker.iter().filter(|r| r.is_plugged()) {
            if let Some(id) = record.usable_identifier() {
                index.identifiers.insert(id.to_string());
            }
            if let Some(key) = OperatorNameKey::from_record(record) {
                index
                    .operator_names
                    .entry(record.region)
                    .or_default()
                    .insert(key);
            }
        }

        for record in aux {
            let Some(profile) = tables.aux_plugged.get(&record.region) else {
                continue;
            };
            if record.status.as_deref() != Some(profile.plugged_status.as_str()) {
                continue;
            }
            if let Some(key) = LegalLocationKey::from_aux(record) {
                index
                    .legal_locations
                    .entry(record.region)
                    .or_default()
                    .insert(key);
            }
        }

        info!(
            "Plugged index: {} identifiers, {} operator/name keys, {} legal locations",
            index.identifiers.len(),
            index.operator_names.values().map(HashSet::len).sum::<usize>(),
            index.legal_locations.values().map(HashSet::len).sum::<usize>()
        );
        index
    }

    pub fn contains_identifier(&self, identifier: &str) -> bool {
        self.identifiers.contains(identifier)
    }

    pub fn contains_legal_location(&self, region: Region, key: &LegalLocationKey) -> bool {
        self.legal_locations
            .get(&region)
            .is_some_and(|keys| keys.contains(key))
    }

    pub fn identifiers(&self) -> &HashSet<String> {
        &self.identifiers
    }

    /// Whether a snapshot record is already plugged, using its region's
    /// plugged-match strategy.
    pub fn is_plugged(&self, record: &CanonicalWellRecord, strategy: PluggedMatch) -> bool {
        match strategy {
            PluggedMatch::Identifier => record
                .usable_identifier()
                .is_some_and(|id| self.contains_identifier(id)),
            PluggedMatch::OperatorAndName => OperatorNameKey::from_record(record).is_some_and(|key| {
                self.operator_names
                    .get(&record.region)
                    .is_some_and(|keys| keys.contains(&key))
            }),
            PluggedMatch::LegalLocation => LegalLocationKey::from_record(record)
                .is_some_and(|key| self.contains_legal_location(record.region, &key)),
        }
    }
}

/// Splits the snapshot into wells still orphaned and wells that turn out to
/// be plugged already.
pub fn remove_actually_plugged(
    snapshot: Vec<CanonicalWellRecord>,
    index: &PluggedIndex,
    tables: &RegionTables,
) -> (Vec<CanonicalWellRecord>, Vec<CanonicalWellRecord>) {
    let (plugged, orphaned): (Vec<_>, Vec<_>) = snapshot
        .into_iter()
        .partition(|record| index.is_plugged(record, tables.plugged_match(record.region)));

    info!(
        "Removed {} actually plugged wells, {} remain orphaned",
        plugged.len(),
        orphaned.len()
    );
    (orphaned, plugged)
}
