use std::collections::HashMap;

use super::Region;

/// A single cell as it was read from a source table.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
}

impl RawValue {
    pub fn is_null(&self) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Text(s) => s.trim().is_empty(),
            RawValue::Int(_) => false,
            RawValue::Float(f) => f.is_nan(),
        }
    }

    /// Trimmed text form of the value. Integral floats print without a
    /// fractional part so `12.0` and `12` produce the same key.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Null => None,
            RawValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            RawValue::Int(i) => Some(i.to_string()),
            RawValue::Float(f) => format_number(*f),
        }
    }

    /// Numeric form of the value; text is parsed after trimming.
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            RawValue::Null => None,
            RawValue::Text(s) => s.trim().parse::<f64>().ok(),
            RawValue::Int(i) => Some(*i as f64),
            RawValue::Float(f) => Some(*f),
        };
        value.filter(|v| v.is_finite())
    }
}

/// Formats a number the way keys are compared: integral values lose the
/// trailing `.0`, non-finite values have no text form.
pub fn format_number(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    if value.fract() == 0.0 && value.abs() < 1e15 {
        Some(format!("{}", value as i64))
    } else {
        Some(value.to_string())
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Int(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Float(value)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(RawValue::Null, Into::into)
    }
}

/// One row of a source table keyed by that source's own column names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    fields: HashMap<String, RawValue>,
}

impl RawRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, handy for fixtures.
    pub fn with(mut self, field: &str, value: impl Into<RawValue>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<RawValue>) {
        self.fields.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&RawValue> {
        self.fields.get(field)
    }

    pub fn text(&self, field: &str) -> Option<String> {
        self.get(field).and_then(RawValue::as_text)
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(RawValue::as_f64)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Copies every field of `other` that this record does not already have.
    pub fn merge_missing(&mut self, other: &RawRecord) {
        for (field, value) in &other.fields {
            self.fields
                .entry(field.clone())
                .or_insert_with(|| value.clone());
        }
    }
}

/// A table read from one source: its column schema and its rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, records: Vec<RawRecord>) -> Self {
        Self { columns, records }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Stacks `other` under this table; the schema becomes the union.
    pub fn append(&mut self, other: RawTable) {
        for column in other.columns {
            if !self.has_column(&column) {
                self.columns.push(column);
            }
        }
        self.records.extend(other.records);
    }

    /// The given rows, in the order asked for; indices past the end are
    /// skipped.
    pub fn select_rows(&self, rows: impl IntoIterator<Item = usize>) -> RawTable {
        let records = rows
            .into_iter()
            .filter_map(|row| self.records.get(row))
            .cloned()
            .collect();
        RawTable::new(self.columns.clone(), records)
    }
}

/// A state-supplied orphan-list extract.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionExtract {
    pub region: Region,
    pub table: RawTable,
}

impl RegionExtract {
    pub fn new(region: Region, table: RawTable) -> Self {
        Self { region, table }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_form_of_numbers() {
        assert_eq!(RawValue::Float(12.0).as_text().as_deref(), Some("12"));
        assert_eq!(RawValue::Float(12.5).as_text().as_deref(), Some("12.5"));
        assert_eq!(RawValue::Int(7).as_text().as_deref(), Some("7"));
        assert_eq!(RawValue::Float(f64::NAN).as_text(), None);
    }

    #[test]
    fn test_blank_text_is_null() {
        assert!(RawValue::from("   ").is_null());
        assert_eq!(RawValue::from("  AB ").as_text().as_deref(), Some("AB"));
        assert_eq!(RawValue::from(" ").as_text(), None);
    }

    #[test]
    fn test_numeric_parsing() {
        assert_eq!(RawValue::from(" -90.5 ").as_f64(), Some(-90.5));
        assert_eq!(RawValue::from("north").as_f64(), None);
        assert_eq!(RawValue::Float(f64::INFINITY).as_f64(), None);
    }

    #[test]
    fn test_merge_missing_keeps_existing_fields() {
        let mut left = RawRecord::new().with("Well API", "123").with("county", "Left");
        let right = RawRecord::new().with("county", "Right").with("latitude", 39.1);
        left.merge_missing(&right);

        assert_eq!(left.text("county").as_deref(), Some("Left"));
        assert_eq!(left.number("latitude"), Some(39.1));
    }

    #[test]
    fn test_append_unions_columns() {
        let mut first = RawTable::new(
            vec!["api_num".to_string(), "stusps".to_string()],
            vec![RawRecord::new().with("api_num", "1").with("stusps", "OH")],
        );
        let second = RawTable::new(
            vec!["api_num".to_string(), "county".to_string()],
            vec![RawRecord::new().with("api_num", "2").with("county", "Noble")],
        );
        first.append(second);

        assert_eq!(first.columns, vec!["api_num", "stusps", "county"]);
        assert_eq!(first.len(), 2);
        let picked = first.select_rows([1, 0, 7]);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked.records[0].text("api_num").as_deref(), Some("2"));
    }
}
