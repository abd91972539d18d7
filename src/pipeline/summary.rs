use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::IssueTally;
use crate::models::{CanonicalWellRecord, PriorReportRecord};
use crate::processor::DedupReport;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegionCounts {
    pub orphaned: usize,
    pub actually_plugged: usize,
    pub newly_orphaned: usize,
    pub newly_plugged: usize,
}

impl RegionCounts {
    fn add(&mut self, other: &RegionCounts) {
        self.orphaned += other.orphaned;
        self.actually_plugged += other.actually_plugged;
        self.newly_orphaned += other.newly_orphaned;
        self.newly_plugged += other.newly_plugged;
    }
}

/// A region that was configured or supplied but could not be reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRegion {
    pub region: String,
    pub reason: String,
}

/// Everything `summary.json` reports about one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunReport {
    pub run_id: Option<String>,
    pub tracker_dedup: DedupReport,
    pub snapshot_dedup: DedupReport,
    pub issues: IssueTally,
    pub skipped_regions: Vec<SkippedRegion>,
    pub regions: BTreeMap<String, RegionCounts>,
    pub totals: RegionCounts,
}

impl RunReport {
    pub fn count_regions(
        &mut self,
        snapshot: &[CanonicalWellRecord],
        actually_plugged: &[CanonicalWellRecord],
        newly_orphaned: &[CanonicalWellRecord],
        newly_plugged: &[PriorReportRecord],
    ) {
        let mut regions: BTreeMap<String, RegionCounts> = BTreeMap::new();

        for record in snapshot {
            regions.entry(record.region.to_string()).or_default().orphaned += 1;
        }
        for record in actually_plugged {
            regions
                .entry(record.region.to_string())
                .or_default()
                .actually_plugged += 1;
        }
        for record in newly_orphaned {
            regions
                .entry(record.region.to_string())
                .or_default()
                .newly_orphaned += 1;
        }
        for record in newly_plugged {
            let region = record
                .region
                .map(|r| r.to_string())
                .unwrap_or_else(|| "Unknown".to_string());
            regions.entry(region).or_default().newly_plugged += 1;
        }

        let mut totals = RegionCounts::default();
        for counts in regions.values() {
            totals.add(counts);
        }

        self.regions = regions;
        self.totals = totals;
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
