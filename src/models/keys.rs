//! Named composite keys used when a region has no reliable identifier.
//!
//! Every constructor returns `None` if any component is missing, so a
//! partially-null record can never match anything.

use super::{AuxPluggedRecord, CanonicalWellRecord, PriorReportRecord};

fn all_present<const N: usize>(parts: [Option<&String>; N]) -> Option<[String; N]> {
    let mut out: [String; N] = std::array::from_fn(|_| String::new());
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part?.clone();
    }
    Some(out)
}

/// Free-text well name plus well number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameNumberKey {
    pub well_name: String,
    pub well_number: String,
}

impl NameNumberKey {
    /// Indiana keeps its well number in the spud-date field.
    pub fn from_record(record: &CanonicalWellRecord) -> Option<Self> {
        let [well_name, well_number] =
            all_present([record.name.as_ref(), record.spud_date.as_ref()])?;
        Some(Self { well_name, well_number })
    }

    pub fn from_prior(record: &PriorReportRecord) -> Option<Self> {
        let [well_name, well_number] =
            all_present([record.well_name.as_ref(), record.well_number.as_ref()])?;
        Some(Self { well_name, well_number })
    }
}

/// County, well name and well number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CountyNameNumberKey {
    pub county: String,
    pub well_name: String,
    pub well_number: String,
}

impl CountyNameNumberKey {
    /// Kansas keeps its well number in the operator field.
    pub fn from_record(record: &CanonicalWellRecord) -> Option<Self> {
        let [county, well_name, well_number] = all_present([
            record.county.as_ref(),
            record.name.as_ref(),
            record.operator_name.as_ref(),
        ])?;
        Some(Self {
            county,
            well_name,
            well_number,
        })
    }

    pub fn from_prior(record: &PriorReportRecord) -> Option<Self> {
        let [county, well_name, well_number] = all_present([
            record.county.as_ref(),
            record.well_name.as_ref(),
            record.well_number.as_ref(),
        ])?;
        Some(Self {
            county,
            well_name,
            well_number,
        })
    }
}

/// Operator plus well name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperatorNameKey {
    pub operator: String,
    pub well_name: String,
}

impl OperatorNameKey {
    pub fn from_record(record: &CanonicalWellRecord) -> Option<Self> {
        let [operator, well_name] =
            all_present([record.operator_name.as_ref(), record.name.as_ref()])?;
        Some(Self { operator, well_name })
    }
}

/// Lease, well number and township/range/section.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LegalLocationKey {
    pub lease: String,
    pub well: String,
    pub township: String,
    pub range: String,
    pub section: String,
}

impl LegalLocationKey {
    pub fn from_record(record: &CanonicalWellRecord) -> Option<Self> {
        let location = record.legal_location.as_ref()?;
        let [lease, well, township, range, section] = all_present([
            record.name.as_ref(),
            record.operator_name.as_ref(),
            Some(&location.township),
            Some(&location.range),
            Some(&location.section),
        ])?;
        Some(Self {
            lease,
            well,
            township,
            range,
            section,
        })
    }

    pub fn from_prior(record: &PriorReportRecord) -> Option<Self> {
        let [lease, well, township, range, section] = all_present([
            record.well_name.as_ref(),
            record.well_number.as_ref(),
            record.township.as_ref(),
            record.range.as_ref(),
            record.section.as_ref(),
        ])?;
        Some(Self {
            lease,
            well,
            township,
            range,
            section,
        })
    }

    pub fn from_aux(record: &AuxPluggedRecord) -> Option<Self> {
        let [lease, well, township, range, section] = all_present([
            record.lease.as_ref(),
            record.well.as_ref(),
            record.township.as_ref(),
            record.range.as_ref(),
            record.section.as_ref(),
        ])?;
        Some(Self {
            lease,
            well,
            township,
            range,
            section,
        })
    }
}
