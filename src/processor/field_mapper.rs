use tracing::{debug, warn};

use super::identifier::{clean_identifier, is_all_zeros, strip_separators, trim_fixed_width};
use super::status_normalizer::StatusNormalizer;
use crate::config::{
    AuxPluggedProfile, CanonicalField, FieldMapping, LocatedBy, RegionProfile, RegionTables,
};
use crate::error::{IssueTally, RecordIssue, ReconcileError};
use crate::models::{
    AuxPluggedRecord, CanonicalWellRecord, LegalLocation, PriorReportRecord, RawRecord, RawTable,
    RawValue, Region, RegionExtract,
};

/// Fields every coordinate-located region is expected to supply.
const CORE_FIELDS: [CanonicalField; 8] = [
    CanonicalField::Identifier,
    CanonicalField::Latitude,
    CanonicalField::Longitude,
    CanonicalField::County,
    CanonicalField::Name,
    CanonicalField::Operator,
    CanonicalField::Status,
    CanonicalField::SpudDate,
];

const LEGAL_LAND_FIELDS: [CanonicalField; 3] = [
    CanonicalField::Township,
    CanonicalField::Range,
    CanonicalField::Section,
];

/// Projects source-specific rows onto the canonical record shape.
pub struct FieldMapper<'a> {
    tables: &'a RegionTables,
    normalizer: StatusNormalizer<'a>,
}

impl<'a> FieldMapper<'a> {
    pub fn new(tables: &'a RegionTables) -> Self {
        FieldMapper {
            tables,
            normalizer: StatusNormalizer::from_tables(tables),
        }
    }

    /// Maps one row. A canonical field is filled only when the mapping names
    /// a column and that column exists in `table`'s schema.
    pub fn map_record(
        &self,
        raw: &RawRecord,
        table: &RawTable,
        mapping: &FieldMapping,
        region: Region,
    ) -> CanonicalWellRecord {
        let value = |field: CanonicalField| -> Option<&RawValue> {
            let column = mapping.column(field)?;
            if !table.has_column(column) {
                return None;
            }
            raw.get(column)
        };
        let text = |field: CanonicalField| value(field).and_then(RawValue::as_text);

        let mut record = CanonicalWellRecord::new(region);
        record.identifier = text(CanonicalField::Identifier);
        record.latitude = value(CanonicalField::Latitude).and_then(RawValue::as_f64);
        record.longitude = value(CanonicalField::Longitude).and_then(RawValue::as_f64);
        record.county = text(CanonicalField::County);
        record.name = text(CanonicalField::Name);
        record.operator_name = text(CanonicalField::Operator);
        record.spud_date = text(CanonicalField::SpudDate);
        record.status = value(CanonicalField::Status)
            .and_then(|status| self.normalizer.normalize(region, status));

        if let (Some(township), Some(range), Some(section)) = (
            text(CanonicalField::Township),
            text(CanonicalField::Range),
            text(CanonicalField::Section),
        ) {
            record.legal_location = Some(LegalLocation {
                township,
                range,
                section,
            });
        }

        record
    }

    /// Maps a state extract. Identifiers are cleaned and then repaired with
    /// the region's registered transform.
    pub fn map_extract(
        &self,
        extract: &RegionExtract,
        tally: &mut IssueTally,
    ) -> Result<Vec<CanonicalWellRecord>, ReconcileError> {
        let region = extract.region;
        let profile = self
            .tables
            .profile(region)
            .ok_or_else(|| ReconcileError::SchemaMismatch {
                region: region.to_string(),
                reason: "no field mapping for this extract".to_string(),
            })?;

        self.tally_unmapped(&extract.table, profile, region, tally);

        let mut mapped = Vec::with_capacity(extract.table.len());
        for (index, raw) in extract.table.records.iter().enumerate() {
            let Some(record_region) =
                self.resolve_region(raw, &extract.table, &profile.fields, region, tally)
            else {
                continue;
            };

            let mut record = self.map_record(raw, &extract.table, &profile.fields, record_region);
            record.identifier = if profile.synthetic_identifier {
                Some((index + 1).to_string())
            } else {
                record
                    .identifier
                    .as_deref()
                    .and_then(clean_identifier)
                    .map(|id| match &profile.identifier_transform {
                        Some(transform) => transform.apply(&id),
                        None => id,
                    })
            };
            mapped.push(record);
        }

        debug!("Mapped {} rows from the {} extract", mapped.len(), region);
        Ok(mapped)
    }

    /// Maps the multi-state tracker. Region comes from the tracker's own
    /// column; rows from excluded or unknown jurisdictions are dropped.
    pub fn map_tracker(&self, table: &RawTable, tally: &mut IssueTally) -> Vec<CanonicalWellRecord> {
        let tracker = &self.tables.tracker;
        let Some(region_column) = tracker.fields.region.as_deref() else {
            return Vec::new();
        };

        let mut mapped = Vec::with_capacity(table.len());
        for (index, raw) in table.records.iter().enumerate() {
            let Some(region) = raw
                .text(region_column)
                .and_then(|name| name.parse::<Region>().ok())
            else {
                tally.record(RecordIssue::UnknownRegion);
                continue;
            };
            if self.tables.is_excluded(region) {
                tally.record(RecordIssue::ExcludedRegion);
                continue;
            }

            let mut record = self.map_record(raw, table, &tracker.fields, region);
            record.source_row = Some(index);
            record.identifier = record.identifier.as_deref().and_then(|raw_id| {
                let stripped = strip_separators(raw_id);
                if is_all_zeros(&stripped) || stripped.chars().count() < tracker.min_identifier_len
                {
                    None
                } else {
                    clean_identifier(&stripped)
                }
            });
            mapped.push(record);
        }

        mapped
    }

    pub fn map_prior_report(&self, table: &RawTable) -> Vec<PriorReportRecord> {
        let profile = &self.tables.prior_report;
        let columns = &profile.fields;
        let trim = profile.identifier_trim;

        let text = |raw: &RawRecord, column: &Option<String>| {
            column.as_deref().and_then(|c| raw.text(c))
        };
        let number = |raw: &RawRecord, column: &Option<String>| {
            column.as_deref().and_then(|c| raw.number(c))
        };

        table
            .records
            .iter()
            .map(|raw| PriorReportRecord {
                identifier: text(raw, &columns.identifier)
                    .and_then(|id| trim_fixed_width(&id, trim.prefix, trim.suffix)),
                region: text(raw, &columns.region).and_then(|name| name.parse().ok()),
                county: text(raw, &columns.county),
                well_name: text(raw, &columns.well_name),
                well_number: text(raw, &columns.well_number),
                township: text(raw, &columns.township),
                range: text(raw, &columns.range),
                section: text(raw, &columns.section),
                latitude: number(raw, &columns.latitude),
                longitude: number(raw, &columns.longitude),
            })
            .collect()
    }

    pub fn map_aux_plugged(
        &self,
        region: Region,
        profile: &AuxPluggedProfile,
        table: &RawTable,
    ) -> Vec<AuxPluggedRecord> {
        let columns = &profile.fields;
        let text = |raw: &RawRecord, column: &Option<String>| {
            column.as_deref().and_then(|c| raw.text(c))
        };

        table
            .records
            .iter()
            .map(|raw| AuxPluggedRecord {
                region,
                identifier: text(raw, &columns.identifier).and_then(|id| clean_identifier(&id)),
                lease: text(raw, &columns.lease),
                well: text(raw, &columns.well),
                township: text(raw, &columns.township),
                range: text(raw, &columns.range),
                section: text(raw, &columns.section),
                status: text(raw, &columns.status),
            })
            .collect()
    }

    /// Region for one extract row: the mapped override column when it holds a
    /// known region, otherwise the extract's own region.
    fn resolve_region(
        &self,
        raw: &RawRecord,
        table: &RawTable,
        mapping: &FieldMapping,
        fallback: Region,
        tally: &mut IssueTally,
    ) -> Option<Region> {
        let Some(column) = mapping.region.as_deref().filter(|c| table.has_column(c)) else {
            return Some(fallback);
        };
        match raw.text(column) {
            None => Some(fallback),
            Some(name) => match name.parse::<Region>() {
                Ok(region) => Some(region),
                Err(_) => {
                    warn!("Dropping {} row tagged with unknown region '{}'", fallback, name);
                    tally.record(RecordIssue::UnknownRegion);
                    None
                }
            },
        }
    }

    fn tally_unmapped(
        &self,
        table: &RawTable,
        profile: &RegionProfile,
        region: Region,
        tally: &mut IssueTally,
    ) {
        let mut expected: Vec<CanonicalField> = CORE_FIELDS.to_vec();
        if profile.synthetic_identifier {
            expected.retain(|f| *f != CanonicalField::Identifier);
        }
        if profile.located_by == LocatedBy::LegalLand {
            expected.retain(|f| !matches!(f, CanonicalField::Latitude | CanonicalField::Longitude));
            expected.extend(LEGAL_LAND_FIELDS);
        }

        for field in expected {
            let present = profile
                .fields
                .column(field)
                .is_some_and(|column| table.has_column(column));
            if !present {
                tally.unmapped_field(region, field.name());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WellStatus;

    const TABLES: &str = r#"
        excluded_regions = ["Maryland"]

        [orphaned_status]
        Ohio = ["OR"]
        Nevada = ["AB"]

        [plugged_status]
        Ohio = ["PA"]

        [tracker]
        min_identifier_len = 10

        [tracker.fields]
        identifier = "api_num"
        region = "stusps"
        status = "well_status"
        latitude = "latitude"
        longitude = "longitude"

        [prior_report]
        identifier_trim = { prefix = 4, suffix = 4 }

        [prior_report.fields]
        identifier = "Well identifier"
        region = "State"
        well_name = "Well name"

        [regions.Texas]
        identifier_transform = { kind = "prefix", code = "42" }

        [regions.Texas.fields]
        identifier = "API"
        latitude = "latitude"
        longitude = "longitude"
        county = "COUNTY_NAME"
        operator = "OPERATOR_NAME"

        [regions.Kansas]
        synthetic_identifier = true
        located_by = "legal_land"

        [regions.Kansas.fields]
        name = "Lease Name"
        township = "Twp."
        range = "Rng."
        section = "Sect."

        [regions.Nevada.fields]
        identifier = "apino"
        status = "status"
        region = "state_"
    "#;

    fn tables() -> RegionTables {
        RegionTables::from_toml_str(TABLES).unwrap()
    }

    fn table(columns: &[&str], records: Vec<RawRecord>) -> RawTable {
        RawTable::new(columns.iter().map(|c| c.to_string()).collect(), records)
    }

    #[test]
    fn test_absent_mapping_or_column_gives_none() {
        let tables = tables();
        let mapper = FieldMapper::new(&tables);
        let extract = RegionExtract::new(
            Region::Texas,
            // OPERATOR_NAME is mapped but missing from the schema.
            table(
                &["API", "latitude", "longitude", "COUNTY_NAME"],
                vec![
                    RawRecord::new()
                        .with("API", "001-12345")
                        .with("latitude", 31.5)
                        .with("longitude", -97.1)
                        .with("COUNTY_NAME", "Travis"),
                ],
            ),
        );

        let mut tally = IssueTally::new();
        let records = mapper.map_extract(&extract, &mut tally).unwrap();

        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.identifier.as_deref(), Some("4200112345"));
        assert_eq!(record.county.as_deref(), Some("Travis"));
        assert_eq!(record.operator_name, None);
        assert_eq!(record.name, None);
        assert_eq!(record.region, Region::Texas);

        let unmapped = &tally.unmapped_fields["Texas"];
        assert!(unmapped.contains(&"operator".to_string()));
        assert!(unmapped.contains(&"name".to_string()));
        assert!(!unmapped.contains(&"county".to_string()));
    }

    #[test]
    fn test_synthetic_identifiers_are_sequential() {
        let tables = tables();
        let mapper = FieldMapper::new(&tables);
        let rows = (0..3)
            .map(|i| {
                RawRecord::new()
                    .with("Lease Name", format!("LEASE {i}"))
                    .with("Twp.", 12_i64)
                    .with("Rng.", 3.0)
                    .with("Sect.", "7")
            })
            .collect();
        let extract = RegionExtract::new(
            Region::Kansas,
            table(&["Lease Name", "Twp.", "Rng.", "Sect."], rows),
        );

        let records = mapper.map_extract(&extract, &mut IssueTally::new()).unwrap();
        let ids: Vec<_> = records.iter().filter_map(|r| r.identifier.clone()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);

        let location = records[0].legal_location.as_ref().unwrap();
        assert_eq!(location.township, "12");
        assert_eq!(location.range, "3");
        assert_eq!(location.section, "7");
    }

    #[test]
    fn test_region_override_column() {
        let tables = tables();
        let mapper = FieldMapper::new(&tables);
        let extract = RegionExtract::new(
            Region::Nevada,
            table(
                &["apino", "status", "state_"],
                vec![
                    RawRecord::new().with("apino", "2700112345").with("status", "AB").with("state_", "NV"),
                    RawRecord::new().with("apino", "2700112346").with("status", "AB").with("state_", RawValue::Null),
                    RawRecord::new().with("apino", "2700112347").with("status", "AB").with("state_", "Nowhere"),
                ],
            ),
        );

        let mut tally = IssueTally::new();
        let records = mapper.map_extract(&extract, &mut tally).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.region == Region::Nevada));
        assert!(records.iter().all(|r| r.status == Some(WellStatus::Orphaned)));
        assert_eq!(tally.count(RecordIssue::UnknownRegion), 1);
    }

    #[test]
    fn test_extract_without_mapping_is_a_schema_mismatch() {
        let tables = tables();
        let mapper = FieldMapper::new(&tables);
        let extract = RegionExtract::new(Region::Utah, RawTable::default());

        let err = mapper.map_extract(&extract, &mut IssueTally::new()).unwrap_err();
        assert!(matches!(err, ReconcileError::SchemaMismatch { .. }));
    }

    #[test]
    fn test_tracker_identifier_rules() {
        let tables = tables();
        let mapper = FieldMapper::new(&tables);
        let columns = ["api_num", "stusps", "well_status", "latitude", "longitude"];
        let row = |api: &str, state: &str| {
            RawRecord::new()
                .with("api_num", api)
                .with("stusps", state)
                .with("well_status", "OR")
                .with("latitude", 40.0)
                .with("longitude", -81.0)
        };
        let tracker = table(
            &columns,
            vec![
                row("34-005-20001-00-00", "Ohio"),
                row("0000000000", "Ohio"),
                row("34-005", "Ohio"),
                row("2400112345", "Maryland"),
                row("9900112345", "Atlantis"),
            ],
        );

        let mut tally = IssueTally::new();
        let records = mapper.map_tracker(&tracker, &mut tally);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].identifier.as_deref(), Some("3400520001"));
        assert_eq!(records[2].source_row, Some(2));
        assert_eq!(records[0].status, Some(WellStatus::Orphaned));
        assert_eq!(records[1].identifier, None);
        assert_eq!(records[2].identifier, None);
        assert_eq!(tally.count(RecordIssue::ExcludedRegion), 1);
        assert_eq!(tally.count(RecordIssue::UnknownRegion), 1);
    }

    #[test]
    fn test_prior_report_identifier_trim() {
        let tables = tables();
        let mapper = FieldMapper::new(&tables);
        let prior = table(
            &["Well identifier", "State", "Well name"],
            vec![
                RawRecord::new()
                    .with("Well identifier", "API 42-001-12345 END")
                    .with("State", "Texas")
                    .with("Well name", "SMITH 1"),
            ],
        );

        let records = mapper.map_prior_report(&prior);
        assert_eq!(records[0].identifier.as_deref(), Some("4200112345"));
        assert_eq!(records[0].region, Some(Region::Texas));
        assert_eq!(records[0].county, None);
    }
}
