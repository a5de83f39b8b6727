use serde::{Deserialize, Serialize};

use crate::lod::DisplayToggles;

use super::Coord;

/// Kinds of content streamed per detail level. Each one is fetched, trimmed
/// and published independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureCategory {
    PointOfInterest,
    StateBoundary,
    DistrictBoundary,
    City,
    DynamicAsset,
}

impl FeatureCategory {
    pub const ALL: [FeatureCategory; 5] = [
        FeatureCategory::PointOfInterest,
        FeatureCategory::StateBoundary,
        FeatureCategory::DistrictBoundary,
        FeatureCategory::City,
        FeatureCategory::DynamicAsset,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FeatureCategory::PointOfInterest => "stations",
            FeatureCategory::StateBoundary => "states",
            FeatureCategory::DistrictBoundary => "districts",
            FeatureCategory::City => "cities",
            FeatureCategory::DynamicAsset => "assets",
        }
    }

    /// Points of interest are wanted at every level, everything else follows
    /// the level's display toggles.
    pub fn is_eligible(&self, toggles: &DisplayToggles) -> bool {
        match self {
            FeatureCategory::PointOfInterest => true,
            FeatureCategory::StateBoundary => toggles.show_boundaries,
            FeatureCategory::DistrictBoundary => toggles.show_boundaries && toggles.show_labels,
            FeatureCategory::City => toggles.show_labels,
            FeatureCategory::DynamicAsset => toggles.show_assets,
        }
    }
}

impl std::fmt::Display for FeatureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RenderAttributes {
    Point { label: Option<String> },
    Outline { rings: Vec<Vec<Coord>> },
    Asset { kind: String, heading_deg: f64 },
}

#[derive(Clone, Debug, PartialEq)]
pub struct FeatureRecord {
    pub id: String,
    pub category: FeatureCategory,
    pub position: Coord,
    /// Higher survives trimming first.
    pub importance: f64,
    pub attributes: RenderAttributes,
    pub properties: serde_json::Value,
}

impl FeatureRecord {
    pub fn point(
        id: impl Into<String>,
        category: FeatureCategory,
        position: Coord,
        importance: f64,
    ) -> Self {
        Self {
            id: id.into(),
            category,
            position,
            importance,
            attributes: RenderAttributes::Point { label: None },
            properties: serde_json::Value::Null,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match &self.attributes {
            RenderAttributes::Point { label } => label.as_deref(),
            _ => self.properties.get("name").and_then(|v| v.as_str()),
        }
    }
}
