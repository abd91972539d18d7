use std::collections::{HashMap, HashSet};
use tracing::info;

use super::plugged_filter::PluggedIndex;
use crate::config::{MatchStrategy, PluggedMatch, RegionTables};
use crate::models::{
    CanonicalWellRecord, CountyNameNumberKey, LegalLocationKey, LifecycleStatus, NameNumberKey,
    PriorReportRecord, Region,
};

/// Prior-report keys for every match strategy. Composite keys are indexed
/// per region; identifiers are global.
#[derive(Debug, Default)]
pub struct PriorReportIndex {
    identifiers: HashSet<String>,
    name_number: HashMap<Region, HashSet<NameNumberKey>>,
    county_name_number: HashMap<Region, HashSet<CountyNameNumberKey>>,
}

impl PriorReportIndex {
    pub fn build(prior: &[PriorReportRecord]) -> Self {
        let mut index = PriorReportIndex::default();
        for record in prior {
            if let Some(id) = &record.identifier {
                index.identifiers.insert(id.clone());
            }
            let Some(region) = record.region else {
                continue;
            };
            if let Some(key) = NameNumberKey::from_prior(record) {
                index.name_number.entry(region).or_default().insert(key);
            }
            if let Some(key) = CountyNameNumberKey::from_prior(record) {
                index.county_name_number.entry(region).or_default().insert(key);
            }
        }
        index
    }

    /// Exact key equality; a record missing any key component never matches.
    pub fn has_counterpart(&self, record: &CanonicalWellRecord, strategy: MatchStrategy) -> bool {
        match strategy {
            MatchStrategy::Identifier => record
                .usable_identifier()
                .is_some_and(|id| self.identifiers.contains(id)),
            MatchStrategy::NameAndNumber => NameNumberKey::from_record(record).is_some_and(|key| {
                self.name_number
                    .get(&record.region)
                    .is_some_and(|keys| keys.contains(&key))
            }),
            MatchStrategy::CountyNameNumber => {
                CountyNameNumberKey::from_record(record).is_some_and(|key| {
                    self.county_name_number
                        .get(&record.region)
                        .is_some_and(|keys| keys.contains(&key))
                })
            }
        }
    }
}

/// Set membership between the current snapshot and the prior report.
pub struct IdentityMatcher<'a> {
    tables: &'a RegionTables,
    prior: &'a [PriorReportRecord],
    index: PriorReportIndex,
}

impl<'a> IdentityMatcher<'a> {
    pub fn new(tables: &'a RegionTables, prior: &'a [PriorReportRecord]) -> Self {
        IdentityMatcher {
            tables,
            prior,
            index: PriorReportIndex::build(prior),
        }
    }

    pub fn has_counterpart(&self, record: &CanonicalWellRecord) -> bool {
        self.index
            .has_counterpart(record, self.tables.match_strategy(record.region))
    }

    /// Tags every record; returns how many were newly orphaned.
    pub fn assign_lifecycle(&self, records: &mut [CanonicalWellRecord]) -> usize {
        let mut newly = 0;
        for record in records.iter_mut() {
            let status = if self.has_counterpart(record) {
                LifecycleStatus::OrphanedSincePriorReport
            } else {
                newly += 1;
                LifecycleStatus::NewlyOrphaned
            };
            record.lifecycle_status = Some(status);
        }
        info!(
            "Lifecycle: {} newly orphaned, {} orphaned since prior report",
            newly,
            records.len() - newly
        );
        newly
    }

    /// Snapshot records with no counterpart in the prior report.
    pub fn newly_appeared(&self, records: &[CanonicalWellRecord]) -> Vec<CanonicalWellRecord> {
        records
            .iter()
            .filter(|record| !self.has_counterpart(record))
            .map(|record| {
                let mut record = record.clone();
                record.lifecycle_status = Some(LifecycleStatus::NewlyOrphaned);
                record
            })
            .collect()
    }

    /// Prior-report wells that have since been plugged.
    ///
    /// `relaxed` is the snapshot before actually-plugged wells were removed;
    /// wells still listed there are not considered resolved.
    pub fn newly_resolved(
        &self,
        relaxed: &[CanonicalWellRecord],
        actually_plugged: &[CanonicalWellRecord],
        plugged: &PluggedIndex,
    ) -> Vec<PriorReportRecord> {
        let relaxed_ids: HashSet<&str> = relaxed
            .iter()
            .filter_map(CanonicalWellRecord::usable_identifier)
            .collect();
        let actually_plugged_ids: HashSet<&str> = actually_plugged
            .iter()
            .filter_map(CanonicalWellRecord::usable_identifier)
            .collect();
        let relaxed_index = self.relaxed_composite_keys(relaxed);

        let mut resolved = Vec::new();
        for record in self.prior {
            let strategy = record
                .region
                .map(|region| self.tables.match_strategy(region))
                .unwrap_or_default();

            let is_resolved = match strategy {
                MatchStrategy::Identifier => record.identifier.as_deref().is_some_and(|id| {
                    !relaxed_ids.contains(id)
                        && plugged.contains_identifier(id)
                        && !actually_plugged_ids.contains(id)
                        && !self.tables.is_placeholder(id)
                }),
                MatchStrategy::CountyNameNumber => {
                    self.resolved_by_legal_location(record, &relaxed_index, plugged)
                }
                // Name and number alone cannot be checked against a plugged
                // list.
                MatchStrategy::NameAndNumber => false,
            };

            if is_resolved {
                resolved.push(record.clone());
            }
        }

        info!("Found {} wells plugged since the prior report", resolved.len());
        resolved
    }

    fn relaxed_composite_keys(
        &self,
        relaxed: &[CanonicalWellRecord],
    ) -> HashMap<Region, HashSet<CountyNameNumberKey>> {
        let mut keys: HashMap<Region, HashSet<CountyNameNumberKey>> = HashMap::new();
        for record in relaxed {
            if let Some(key) = CountyNameNumberKey::from_record(record) {
                keys.entry(record.region).or_default().insert(key);
            }
        }
        keys
    }

    fn resolved_by_legal_location(
        &self,
        record: &PriorReportRecord,
        relaxed_keys: &HashMap<Region, HashSet<CountyNameNumberKey>>,
        plugged: &PluggedIndex,
    ) -> bool {
        let Some(region) = record.region else {
            return false;
        };
        if self.tables.plugged_match(region) != PluggedMatch::LegalLocation {
            return false;
        }
        let Some(key) = CountyNameNumberKey::from_prior(record) else {
            return false;
        };
        let still_listed = relaxed_keys
            .get(&region)
            .is_some_and(|keys| keys.contains(&key));
        if still_listed {
            return false;
        }
        LegalLocationKey::from_prior(record)
            .is_some_and(|location| plugged.contains_legal_location(region, &location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AuxPluggedRecord, WellStatus};

    const TABLES: &str = r#"
        placeholder_prefixes = ["ID", "D"]
        [orphaned_status]
        Ohio = ["OR"]
        [plugged_status]
        Ohio = ["PA"]
        [tracker.fields]
        identifier = "api_num"
        region = "stusps"
        [prior_report.fields]
        identifier = "Well identifier"
        [regions.Indiana]
        match_strategy = "name_and_number"
        [regions.Kansas]
        synthetic_identifier = true
        located_by = "legal_land"
        match_strategy = "county_name_number"
        plugged_match = "legal_location"
        [regions.Texas.fields]
        identifier = "API"
        [aux_plugged.Kansas]
        plugged_status = "Plugged and Abandoned"
        [aux_plugged.Kansas.fields]
        lease = "LEASE"
    "#;

    fn tables() -> RegionTables {
        RegionTables::from_toml_str(TABLES).unwrap()
    }

    fn prior_id(region: Region, id: &str) -> PriorReportRecord {
        let mut record = PriorReportRecord::new();
        record.region = Some(region);
        record.identifier = Some(id.to_string());
        record
    }

    fn snapshot_id(region: Region, id: &str) -> CanonicalWellRecord {
        let mut record = CanonicalWellRecord::new(region);
        record.identifier = Some(id.to_string());
        record.status = Some(WellStatus::Orphaned);
        record
    }

    #[test]
    fn test_lifecycle_by_identifier() {
        let tables = tables();
        let prior = vec![prior_id(Region::Texas, "4200100001")];
        let matcher = IdentityMatcher::new(&tables, &prior);

        let mut snapshot = vec![
            snapshot_id(Region::Texas, "4200100001"),
            snapshot_id(Region::Texas, "4200100002"),
        ];
        let newly = matcher.assign_lifecycle(&mut snapshot);

        assert_eq!(newly, 1);
        assert_eq!(
            snapshot[0].lifecycle_status,
            Some(LifecycleStatus::OrphanedSincePriorReport)
        );
        assert_eq!(snapshot[1].lifecycle_status, Some(LifecycleStatus::NewlyOrphaned));
        let appeared = matcher.newly_appeared(&snapshot);
        assert_eq!(appeared.len(), 1);
        assert_eq!(appeared[0].identifier.as_deref(), Some("4200100002"));
    }

    #[test]
    fn test_indiana_composite_match_and_null_components() {
        let tables = tables();
        let mut prior = PriorReportRecord::new();
        prior.region = Some(Region::Indiana);
        prior.well_name = Some("FARM".to_string());
        prior.well_number = Some("2".to_string());
        let prior = vec![prior];
        let matcher = IdentityMatcher::new(&tables, &prior);

        let mut matched = CanonicalWellRecord::new(Region::Indiana);
        matched.name = Some("FARM".to_string());
        matched.spud_date = Some("2".to_string());
        assert!(matcher.has_counterpart(&matched));

        let mut missing_number = matched.clone();
        missing_number.spud_date = None;
        assert!(!matcher.has_counterpart(&missing_number));

        // Same key in another region does not count.
        let mut elsewhere = matched.clone();
        elsewhere.region = Region::Kansas;
        assert!(!matcher.has_counterpart(&elsewhere));
    }

    #[test]
    fn test_kansas_lifecycle_by_county_name_number() {
        let tables = tables();
        let mut prior = PriorReportRecord::new();
        prior.region = Some(Region::Kansas);
        prior.county = Some("Butler".to_string());
        prior.well_name = Some("JONES".to_string());
        prior.well_number = Some("1".to_string());
        let prior = vec![prior];
        let matcher = IdentityMatcher::new(&tables, &prior);

        // Kansas carries the well number in the operator slot.
        let mut listed = CanonicalWellRecord::new(Region::Kansas);
        listed.identifier = Some("1".to_string());
        listed.county = Some("Butler".to_string());
        listed.name = Some("JONES".to_string());
        listed.operator_name = Some("1".to_string());
        assert!(matcher.has_counterpart(&listed));

        let mut no_number = listed.clone();
        no_number.identifier = Some("2".to_string());
        no_number.operator_name = None;
        assert!(!matcher.has_counterpart(&no_number));

        let mut other_county = listed.clone();
        other_county.identifier = Some("3".to_string());
        other_county.county = Some("Sedgwick".to_string());

        let mut snapshot = vec![listed, no_number, other_county];
        let newly = matcher.assign_lifecycle(&mut snapshot);

        assert_eq!(newly, 2);
        assert_eq!(
            snapshot[0].lifecycle_status,
            Some(LifecycleStatus::OrphanedSincePriorReport)
        );
        assert_eq!(snapshot[1].lifecycle_status, Some(LifecycleStatus::NewlyOrphaned));
        assert_eq!(snapshot[2].lifecycle_status, Some(LifecycleStatus::NewlyOrphaned));
    }

    #[test]
    fn test_newly_resolved_by_identifier() {
        let tables = tables();
        let prior = vec![
            prior_id(Region::Texas, "4200100001"),
            prior_id(Region::Texas, "4200100002"),
            prior_id(Region::Texas, "4200100003"),
            prior_id(Region::Texas, "ID00000004"),
            prior_id(Region::Texas, "4200100005"),
        ];
        let matcher = IdentityMatcher::new(&tables, &prior);

        let tracker: Vec<CanonicalWellRecord> = ["4200100001", "4200100002", "ID00000004", "4200100005"]
            .iter()
            .map(|id| {
                let mut record = snapshot_id(Region::Texas, id);
                record.status = Some(WellStatus::Plugged);
                record
            })
            .collect();
        let plugged = PluggedIndex::build(&tables, &tracker, &[]);

        // 0002 is still listed, 0003 is not plugged anywhere, 0004 is a
        // placeholder; 0005 was listed but removed as actually plugged.
        let relaxed = vec![
            snapshot_id(Region::Texas, "4200100002"),
            snapshot_id(Region::Texas, "4200100005"),
        ];
        let actually_plugged = vec![snapshot_id(Region::Texas, "4200100005")];

        let resolved = matcher.newly_resolved(&relaxed, &actually_plugged, &plugged);
        let ids: Vec<_> = resolved.iter().filter_map(|r| r.identifier.as_deref()).collect();
        assert_eq!(ids, vec!["4200100001"]);
    }

    #[test]
    fn test_newly_resolved_by_legal_location() {
        let tables = tables();
        let kansas_prior = |name: &str| {
            let mut record = PriorReportRecord::new();
            record.region = Some(Region::Kansas);
            record.county = Some("Butler".to_string());
            record.well_name = Some(name.to_string());
            record.well_number = Some("1".to_string());
            record.township = Some("12".to_string());
            record.range = Some("3".to_string());
            record.section = Some("7".to_string());
            record
        };
        let prior = vec![kansas_prior("JONES"), kansas_prior("SMITH")];
        let matcher = IdentityMatcher::new(&tables, &prior);

        let aux: Vec<AuxPluggedRecord> = ["JONES", "SMITH"]
            .iter()
            .map(|lease| AuxPluggedRecord {
                region: Region::Kansas,
                identifier: None,
                lease: Some(lease.to_string()),
                well: Some("1".to_string()),
                township: Some("12".to_string()),
                range: Some("3".to_string()),
                section: Some("7".to_string()),
                status: Some("Plugged and Abandoned".to_string()),
            })
            .collect();
        let plugged = PluggedIndex::build(&tables, &[], &aux);

        let mut still_listed = CanonicalWellRecord::new(Region::Kansas);
        still_listed.county = Some("Butler".to_string());
        still_listed.name = Some("SMITH".to_string());
        still_listed.operator_name = Some("1".to_string());

        let resolved = matcher.newly_resolved(&[still_listed], &[], &plugged);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].well_name.as_deref(), Some("JONES"));
    }
}
