use std::collections::HashMap;
use tracing::info;

use super::identifier::strip_separators;
use crate::config::ExtractJoin;
use crate::models::RawTable;

/// Left-joins `right` onto `left`. Keys are compared with separators removed;
/// when several right rows share a key the last one wins. Columns present on
/// both sides keep the left value.
pub fn left_join(left: &RawTable, right: &RawTable, join: &ExtractJoin) -> RawTable {
    let mut lookup = HashMap::new();
    for record in &right.records {
        if let Some(key) = record.text(&join.right_on).map(|k| strip_separators(&k)) {
            if !key.is_empty() {
                lookup.insert(key, record);
            }
        }
    }

    let mut columns = left.columns.clone();
    for column in &right.columns {
        if !columns.contains(column) {
            columns.push(column.clone());
        }
    }

    let mut matched = 0;
    let records = left
        .records
        .iter()
        .map(|record| {
            let mut joined = record.clone();
            let key = record.text(&join.left_on).map(|k| strip_separators(&k));
            if let Some(other) = key.and_then(|k| lookup.get(&k)) {
                joined.merge_missing(other);
                matched += 1;
            }
            joined
        })
        .collect();

    info!(
        "Joined {} on {} = {}: {}/{} rows matched",
        join.with,
        join.left_on,
        join.right_on,
        matched,
        left.len()
    );
    RawTable::new(columns, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawRecord;

    fn join() -> ExtractJoin {
        ExtractJoin {
            with: "tracker".to_string(),
            left_on: "Well API".to_string(),
            right_on: "api_num".to_string(),
        }
    }

    #[test]
    fn test_left_join_last_match_wins() {
        let left = RawTable::new(
            vec!["Well API".into(), "Operator".into()],
            vec![
                RawRecord::new().with("Well API", "47-001-00001").with("Operator", "ACME"),
                RawRecord::new().with("Well API", "47-001-00002").with("Operator", "BETA"),
            ],
        );
        let right = RawTable::new(
            vec!["api_num".into(), "stusps".into(), "Operator".into()],
            vec![
                RawRecord::new().with("api_num", "4700100001").with("stusps", "WV").with("Operator", "X"),
                RawRecord::new().with("api_num", "4700100001").with("stusps", "West Virginia"),
            ],
        );

        let joined = left_join(&left, &right, &join());

        assert_eq!(joined.columns, vec!["Well API", "Operator", "api_num", "stusps"]);
        assert_eq!(joined.len(), 2);
        assert_eq!(joined.records[0].text("stusps").as_deref(), Some("West Virginia"));
        assert_eq!(joined.records[0].text("Operator").as_deref(), Some("ACME"));
        assert_eq!(joined.records[1].text("stusps"), None);
    }
}
