use serde::{Deserialize, Serialize};

use crate::{Error, search::AlgorithmKind};

/// Settings of one exploration round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaceConfig {
    pub algorithm: AlgorithmKind,
    /// Radius around the start node that bounds the explored area
    #[serde(alias = "searchRadiusKm", alias = "radius")]
    pub search_radius_km: f64,
    /// Search steps performed per animation tick
    #[serde(alias = "animationSpeed", alias = "speed")]
    pub animation_speed: u32,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            algorithm: AlgorithmKind::AStar,
            search_radius_km: 4.0,
            animation_speed: 5,
        }
    }
}

impl RaceConfig {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a non-positive radius or a zero speed.
    pub fn validate(&self) -> Result<(), Error> {
        if !self.search_radius_km.is_finite() || self.search_radius_km <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "search radius must be positive, got {}",
                self.search_radius_km
            )));
        }
        if self.animation_speed == 0 {
            return Err(Error::InvalidConfig(
                "animation speed must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Time multiplier of the final route trace, `max(log2(speed), 1)`
    pub fn route_time_multiplier(&self) -> f64 {
        f64::from(self.animation_speed).log2().max(1.0)
    }
}
