use serde::{Deserialize, Serialize};

/// Smallest accepted cost multiplier; anything cheaper breaks the
/// heuristic's relation to geometric length
pub const MIN_COST_MULTIPLIER: f64 = 0.8;

/// OSM `highway` class of a road segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadClass {
    Motorway,
    Trunk,
    Primary,
    Secondary,
    Tertiary,
    Unclassified,
    Residential,
    LivingStreet,
    #[default]
    Other,
}

impl RoadClass {
    /// Parses an OSM `highway` tag, case-insensitively.
    /// Unrecognized tags map to [`RoadClass::Other`].
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "motorway" => Self::Motorway,
            "trunk" => Self::Trunk,
            "primary" => Self::Primary,
            "secondary" => Self::Secondary,
            "tertiary" => Self::Tertiary,
            "unclassified" => Self::Unclassified,
            "residential" => Self::Residential,
            "living_street" => Self::LivingStreet,
            _ => Self::Other,
        }
    }

    /// Travel cost multiplier applied to the geometric length
    pub fn cost_multiplier(self) -> f64 {
        match self {
            Self::Motorway | Self::Trunk => 0.8,
            Self::Primary | Self::Secondary => 1.0,
            Self::Tertiary | Self::Unclassified => 1.2,
            Self::Residential | Self::LivingStreet => 1.5,
            Self::Other => 1.0,
        }
    }

    /// Default speed limit in km/h
    pub fn default_speed_kmh(self) -> f64 {
        match self {
            Self::Motorway => 120.0,
            Self::Trunk => 100.0,
            Self::Primary => 80.0,
            Self::Secondary => 60.0,
            Self::Tertiary => 50.0,
            Self::Unclassified | Self::Residential => 30.0,
            Self::LivingStreet => 20.0,
            Self::Other => 50.0,
        }
    }
}
