use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ReconcileError;

/// State-level jurisdiction a well record belongs to.
///
/// Covers every state that appears in either source dataset, including the
/// tracker-only jurisdictions that are excluded from reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Region {
    Alabama,
    Alaska,
    Arizona,
    Arkansas,
    California,
    Colorado,
    Florida,
    Idaho,
    Illinois,
    Indiana,
    Kansas,
    Kentucky,
    Louisiana,
    Maryland,
    Michigan,
    Mississippi,
    Missouri,
    Montana,
    Nebraska,
    Nevada,
    NewMexico,
    NewYork,
    NorthDakota,
    Ohio,
    Oklahoma,
    Oregon,
    Pennsylvania,
    SouthDakota,
    Tennessee,
    Texas,
    Utah,
    Virginia,
    Washington,
    WestVirginia,
    Wyoming,
}

const REGION_NAMES: &[(Region, &str, &str)] = &[
    (Region::Alabama, "Alabama", "AL"),
    (Region::Alaska, "Alaska", "AK"),
    (Region::Arizona, "Arizona", "AZ"),
    (Region::Arkansas, "Arkansas", "AR"),
    (Region::California, "California", "CA"),
    (Region::Colorado, "Colorado", "CO"),
    (Region::Florida, "Florida", "FL"),
    (Region::Idaho, "Idaho", "ID"),
    (Region::Illinois, "Illinois", "IL"),
    (Region::Indiana, "Indiana", "IN"),
    (Region::Kansas, "Kansas", "KS"),
    (Region::Kentucky, "Kentucky", "KY"),
    (Region::Louisiana, "Louisiana", "LA"),
    (Region::Maryland, "Maryland", "MD"),
    (Region::Michigan, "Michigan", "MI"),
    (Region::Mississippi, "Mississippi", "MS"),
    (Region::Missouri, "Missouri", "MO"),
    (Region::Montana, "Montana", "MT"),
    (Region::Nebraska, "Nebraska", "NE"),
    (Region::Nevada, "Nevada", "NV"),
    (Region::NewMexico, "New Mexico", "NM"),
    (Region::NewYork, "New York", "NY"),
    (Region::NorthDakota, "North Dakota", "ND"),
    (Region::Ohio, "Ohio", "OH"),
    (Region::Oklahoma, "Oklahoma", "OK"),
    (Region::Oregon, "Oregon", "OR"),
    (Region::Pennsylvania, "Pennsylvania", "PA"),
    (Region::SouthDakota, "South Dakota", "SD"),
    (Region::Tennessee, "Tennessee", "TN"),
    (Region::Texas, "Texas", "TX"),
    (Region::Utah, "Utah", "UT"),
    (Region::Virginia, "Virginia", "VA"),
    (Region::Washington, "Washington", "WA"),
    (Region::WestVirginia, "West Virginia", "WV"),
    (Region::Wyoming, "Wyoming", "WY"),
];

impl Region {
    pub fn all() -> impl Iterator<Item = Region> {
        REGION_NAMES.iter().map(|(region, _, _)| *region)
    }

    pub fn name(self) -> &'static str {
        REGION_NAMES
            .iter()
            .find(|(region, _, _)| *region == self)
            .map(|(_, name, _)| *name)
            .unwrap_or("")
    }

    /// Two-letter postal abbreviation.
    pub fn abbreviation(self) -> &'static str {
        REGION_NAMES
            .iter()
            .find(|(region, _, _)| *region == self)
            .map(|(_, _, abbrev)| *abbrev)
            .unwrap_or("")
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Region {
    type Err = ReconcileError;

    /// Accepts the full state name (case-insensitive) or its postal
    /// abbreviation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        REGION_NAMES
            .iter()
            .find(|(_, name, abbrev)| {
                name.eq_ignore_ascii_case(wanted) || abbrev.eq_ignore_ascii_case(wanted)
            })
            .map(|(region, _, _)| *region)
            .ok_or_else(|| ReconcileError::UnknownRegion(wanted.to_string()))
    }
}

impl TryFrom<String> for Region {
    type Error = ReconcileError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Region> for String {
    fn from(region: Region) -> Self {
        region.name().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_names_and_abbreviations() {
        assert_eq!("Texas".parse::<Region>().unwrap(), Region::Texas);
        assert_eq!("west virginia".parse::<Region>().unwrap(), Region::WestVirginia);
        assert_eq!(" NM ".parse::<Region>().unwrap(), Region::NewMexico);
        assert!("Atlantis".parse::<Region>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_name() {
        for region in Region::all() {
            assert_eq!(region.to_string().parse::<Region>().unwrap(), region);
            assert_eq!(region.abbreviation().len(), 2);
        }
    }

    #[test]
    fn test_colorado_has_an_abbreviation() {
        assert_eq!(Region::Colorado.abbreviation(), "CO");
    }
}
