use serde::Serialize;

use super::Region;

/// One well listed in the prior federal orphaned-well report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorReportRecord {
    pub identifier: Option<String>,
    pub region: Option<Region>,
    pub county: Option<String>,
    pub well_name: Option<String>,
    pub well_number: Option<String>,
    pub township: Option<String>,
    pub range: Option<String>,
    pub section: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl PriorReportRecord {
    pub fn new() -> Self {
        Self {
            identifier: None,
            region: None,
            county: None,
            well_name: None,
            well_number: None,
            township: None,
            range: None,
            section: None,
            latitude: None,
            longitude: None,
        }
    }
}

impl Default for PriorReportRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// A row of a region's all-wells table, used to confirm plugging for
/// regions without reliable identifiers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuxPluggedRecord {
    pub region: Region,
    pub identifier: Option<String>,
    pub lease: Option<String>,
    pub well: Option<String>,
    pub township: Option<String>,
    pub range: Option<String>,
    pub section: Option<String>,
    pub status: Option<String>,
}
