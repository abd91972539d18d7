use tracing::info;

use crate::config::{LocatedBy, RegionTables};
use crate::error::{IssueTally, RecordIssue};
use crate::models::CanonicalWellRecord;

fn usable(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v != 0.0)
}

/// Drops records without a usable coordinate pair and forces longitudes into
/// the western hemisphere. Regions located by legal land description keep
/// their records whatever the coordinates hold.
pub fn validate_coordinates(
    records: Vec<CanonicalWellRecord>,
    tables: &RegionTables,
    tally: &mut IssueTally,
) -> Vec<CanonicalWellRecord> {
    let before = records.len();
    let mut invalid = 0;

    let records: Vec<CanonicalWellRecord> = records
        .into_iter()
        .filter_map(|mut record| {
            let latitude = usable(record.latitude);
            let longitude = usable(record.longitude);

            if tables.located_by(record.region) == LocatedBy::LegalLand {
                record.latitude = latitude;
                record.longitude = longitude.map(|lon| -lon.abs());
                return Some(record);
            }

            match (latitude, longitude) {
                (Some(lat), Some(lon)) => {
                    record.latitude = Some(lat);
                    record.longitude = Some(-lon.abs());
                    Some(record)
                }
                _ => {
                    invalid += 1;
                    None
                }
            }
        })
        .collect();

    tally.add(RecordIssue::InvalidCoordinate, invalid);
    info!(
        "Coordinate check kept {}/{} records ({} invalid)",
        records.len(),
        before,
        invalid
    );
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Region;

    const TABLES: &str = r#"
        [orphaned_status]
        Ohio = ["OR"]
        [plugged_status]
        Ohio = ["PA"]
        [tracker.fields]
        identifier = "api_num"
        region = "stusps"
        [prior_report.fields]
        identifier = "Well identifier"
        [regions.Kansas]
        synthetic_identifier = true
        located_by = "legal_land"
        [regions.Texas.fields]
        identifier = "API"
    "#;

    fn at(region: Region, lat: Option<f64>, lon: Option<f64>) -> CanonicalWellRecord {
        let mut record = CanonicalWellRecord::new(region);
        record.latitude = lat;
        record.longitude = lon;
        record
    }

    #[test]
    fn test_invalid_coordinates_dropped() {
        let tables = RegionTables::from_toml_str(TABLES).unwrap();
        let mut tally = IssueTally::new();

        let records = validate_coordinates(
            vec![
                at(Region::Texas, Some(31.0), Some(97.5)),
                at(Region::Texas, Some(0.0), Some(-97.5)),
                at(Region::Texas, None, Some(-97.5)),
                at(Region::Texas, Some(31.0), Some(f64::NAN)),
                at(Region::Kansas, None, None),
            ],
            &tables,
            &mut tally,
        );

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].longitude, Some(-97.5));
        assert_eq!(records[1].region, Region::Kansas);
        assert_eq!(tally.count(RecordIssue::InvalidCoordinate), 3);
    }
}
