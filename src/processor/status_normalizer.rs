use std::collections::{BTreeMap, HashMap};

use crate::config::{RegionTables, StatusSet, status_text_key};
use crate::models::{RawValue, Region, WellStatus, format_number};

/// Maps raw per-region status literals onto the canonical statuses.
pub struct StatusNormalizer<'a> {
    orphaned: &'a HashMap<Region, StatusSet>,
    plugged: &'a HashMap<Region, StatusSet>,
}

impl<'a> StatusNormalizer<'a> {
    pub fn new(
        orphaned: &'a HashMap<Region, StatusSet>,
        plugged: &'a HashMap<Region, StatusSet>,
    ) -> Self {
        StatusNormalizer { orphaned, plugged }
    }

    pub fn from_tables(tables: &'a RegionTables) -> Self {
        Self::new(&tables.orphaned_status, &tables.plugged_status)
    }

    /// Orphaned wins over plugged when a literal appears in both tables.
    /// Unmatched values pass through; a null status stays null.
    pub fn normalize(&self, region: Region, raw_status: &RawValue) -> Option<WellStatus> {
        let key = status_key(raw_status)?;

        if self.orphaned.get(&region).is_some_and(|set| set.contains_key(&key)) {
            return Some(WellStatus::Orphaned);
        }
        if self.plugged.get(&region).is_some_and(|set| set.contains_key(&key)) {
            return Some(WellStatus::Plugged);
        }

        match raw_status {
            RawValue::Text(text) => Some(WellStatus::Other(text.clone())),
            _ => Some(WellStatus::Other(key)),
        }
    }

    /// Value counts of raw statuses per region, split by how they normalize.
    pub fn status_breakdown<'r>(
        &self,
        rows: impl IntoIterator<Item = (Region, &'r RawValue)>,
    ) -> BTreeMap<Region, BTreeMap<String, (usize, WellStatus)>> {
        let mut breakdown: BTreeMap<Region, BTreeMap<String, (usize, WellStatus)>> =
            BTreeMap::new();

        for (region, raw) in rows {
            let Some(status) = self.normalize(region, raw) else {
                continue;
            };
            let key = status_key(raw).unwrap_or_default();
            breakdown
                .entry(region)
                .or_default()
                .entry(key)
                .and_modify(|(count, _)| *count += 1)
                .or_insert((1, status));
        }

        breakdown
    }
}

/// Text key used for lookups; numeric codes lose any `.0` whether they
/// arrive as numbers or as text.
fn status_key(raw: &RawValue) -> Option<String> {
    match raw {
        RawValue::Null => None,
        RawValue::Text(s) => status_text_key(s),
        RawValue::Int(i) => Some(i.to_string()),
        RawValue::Float(f) => format_number(*f),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StatusCode;

    fn tables() -> (HashMap<Region, StatusSet>, HashMap<Region, StatusSet>) {
        let mut orphaned = HashMap::new();
        orphaned.insert(
            Region::SouthDakota,
            StatusSet::from_codes(&[StatusCode::Text("Abandoned-Not Regulated".into())]),
        );
        orphaned.insert(
            Region::Kentucky,
            StatusSet::from_codes(&[StatusCode::Text("AB".into())]),
        );

        let mut plugged = HashMap::new();
        plugged.insert(
            Region::SouthDakota,
            StatusSet::from_codes(&[
                StatusCode::Text("Abandoned-Not Regulated".into()),
                StatusCode::Text("Plugged and Abandoned".into()),
            ]),
        );
        plugged.insert(
            Region::Texas,
            StatusSet::from_codes(&[StatusCode::Int(7), StatusCode::Text("8".into())]),
        );
        (orphaned, plugged)
    }

    #[test]
    fn test_orphaned_and_plugged_lookup() {
        let (orphaned, plugged) = tables();
        let normalizer = StatusNormalizer::new(&orphaned, &plugged);

        assert_eq!(
            normalizer.normalize(Region::Kentucky, &"AB".into()),
            Some(WellStatus::Orphaned)
        );
        assert_eq!(
            normalizer.normalize(Region::SouthDakota, &"Plugged and Abandoned".into()),
            Some(WellStatus::Plugged)
        );
    }

    #[test]
    fn test_orphaned_takes_precedence() {
        let (orphaned, plugged) = tables();
        let normalizer = StatusNormalizer::new(&orphaned, &plugged);

        assert_eq!(
            normalizer.normalize(Region::SouthDakota, &"Abandoned-Not Regulated".into()),
            Some(WellStatus::Orphaned)
        );
    }

    #[test]
    fn test_numeric_codes_in_any_encoding() {
        let (orphaned, plugged) = tables();
        let normalizer = StatusNormalizer::new(&orphaned, &plugged);

        for raw in [RawValue::Int(7), RawValue::Float(7.0), RawValue::from("7")] {
            assert_eq!(normalizer.normalize(Region::Texas, &raw), Some(WellStatus::Plugged));
        }
        assert_eq!(
            normalizer.normalize(Region::Texas, &RawValue::Int(8)),
            Some(WellStatus::Plugged)
        );
    }

    #[test]
    fn test_text_cells_are_trimmed_and_numeric_text_collapsed() {
        let (orphaned, plugged) = tables();
        let normalizer = StatusNormalizer::new(&orphaned, &plugged);

        // CSV inputs are read as text; exported float columns write 7 as "7.0".
        for raw in ["7.0", " 7 ", "8.0"] {
            assert_eq!(
                normalizer.normalize(Region::Texas, &raw.into()),
                Some(WellStatus::Plugged)
            );
        }
        assert_eq!(
            normalizer.normalize(Region::Kentucky, &" AB ".into()),
            Some(WellStatus::Orphaned)
        );
        assert_eq!(
            normalizer.normalize(Region::Texas, &"7.5".into()),
            Some(WellStatus::Other("7.5".to_string()))
        );
        assert_eq!(normalizer.normalize(Region::Texas, &"  ".into()), None);
    }

    #[test]
    fn test_passthrough_when_unmatched() {
        let (orphaned, plugged) = tables();
        let normalizer = StatusNormalizer::new(&orphaned, &plugged);

        assert_eq!(
            normalizer.normalize(Region::Texas, &"ACTIVE".into()),
            Some(WellStatus::Other("ACTIVE".to_string()))
        );
        // No table entries at all for this region.
        assert_eq!(
            normalizer.normalize(Region::Utah, &"AB".into()),
            Some(WellStatus::Other("AB".to_string()))
        );
        assert_eq!(normalizer.normalize(Region::Texas, &RawValue::Null), None);
    }

    #[test]
    fn test_status_breakdown_counts() {
        let (orphaned, plugged) = tables();
        let normalizer = StatusNormalizer::new(&orphaned, &plugged);
        let ab = RawValue::from("AB");
        let other = RawValue::from("PR");

        let breakdown = normalizer.status_breakdown(vec![
            (Region::Kentucky, &ab),
            (Region::Kentucky, &ab),
            (Region::Kentucky, &other),
        ]);

        let kentucky = &breakdown[&Region::Kentucky];
        assert_eq!(kentucky["AB"], (2, WellStatus::Orphaned));
        assert_eq!(kentucky["PR"], (1, WellStatus::Other("PR".to_string())));
    }
}
