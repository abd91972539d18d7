use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::ReconcileError;
use crate::models::{CanonicalWellRecord, Region};

/// Decides whether a record's coordinates fall inside the region it claims.
/// `None` means no verdict: missing coordinates or no geometry for the region.
pub trait ContainmentCheck {
    fn is_within_claimed_region(&self, record: &CanonicalWellRecord) -> Option<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&latitude)
            && (self.min_lon..=self.max_lon).contains(&longitude)
    }
}

/// Rectangular region extents, a coarse stand-in for real boundaries.
#[derive(Debug, Clone, Default)]
pub struct BoundingBoxes {
    boxes: HashMap<Region, BoundingBox>,
}

impl BoundingBoxes {
    pub fn new(boxes: HashMap<Region, BoundingBox>) -> Self {
        Self { boxes }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read region bounds: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load region bounds: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: BTreeMap<String, BoundingBox> =
            toml::from_str(content).context("Failed to parse region bounds")?;

        let mut boxes = HashMap::new();
        for (name, bounds) in raw {
            let region: Region = name.parse()?;
            if bounds.min_lat > bounds.max_lat || bounds.min_lon > bounds.max_lon {
                return Err(ReconcileError::InvalidConfig(format!(
                    "bounding box for {region} has min above max"
                ))
                .into());
            }
            boxes.insert(region, bounds);
        }
        Ok(Self { boxes })
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

impl ContainmentCheck for BoundingBoxes {
    fn is_within_claimed_region(&self, record: &CanonicalWellRecord) -> Option<bool> {
        let bounds = self.boxes.get(&record.region)?;
        let latitude = record.latitude?;
        let longitude = record.longitude?;
        Some(bounds.contains(latitude, longitude))
    }
}
