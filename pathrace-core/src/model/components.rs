//! Road network components - nodes and edges

use geo::{Distance, Euclidean, Haversine, Point};

use super::road_class::{MIN_COST_MULTIPLIER, RoadClass};
use crate::{Error, OsmNodeId};

/// Road graph node
#[derive(Debug, Clone, PartialEq)]
pub struct RoadNode {
    /// OSM ID of the node
    pub id: OsmNodeId,
    /// Node coordinates, `x` is longitude and `y` is latitude
    pub geometry: Point<f64>,
}

impl RoadNode {
    pub fn new(id: OsmNodeId, lat: f64, lon: f64) -> Self {
        Self {
            id,
            geometry: Point::new(lon, lat),
        }
    }

    pub fn lat(&self) -> f64 {
        self.geometry.y()
    }

    pub fn lon(&self) -> f64 {
        self.geometry.x()
    }

    /// `[lon, lat]` pair as consumed by trail renderers
    pub fn lon_lat(&self) -> [f64; 2] {
        [self.lon(), self.lat()]
    }

    /// Great-circle distance in meters
    pub fn distance_m(&self, other: &RoadNode) -> f64 {
        Haversine.distance(self.geometry, other.geometry)
    }

    /// Straight-line distance in coordinate degrees
    pub fn distance_deg(&self, other: &RoadNode) -> f64 {
        Euclidean.distance(self.geometry, other.geometry)
    }
}

/// Road graph edge (street segment)
#[derive(Debug, Clone, PartialEq)]
pub struct RoadEdge {
    /// Geometric length in meters
    pub length: f64,
    /// Travel cost, `length * road_class.cost_multiplier()`
    pub cost: f64,
    pub road_class: RoadClass,
    /// Traversable in both directions
    pub bidirectional: bool,
}

impl RoadEdge {
    /// Derives the edge cost from its length and road class.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEdge`] for a negative or non-finite length
    /// or a cost multiplier below [`MIN_COST_MULTIPLIER`].
    pub fn between(
        from: &RoadNode,
        to: &RoadNode,
        road_class: RoadClass,
        bidirectional: bool,
    ) -> Result<Self, Error> {
        Self::with_multiplier(
            from,
            to,
            from.distance_m(to),
            road_class,
            road_class.cost_multiplier(),
            bidirectional,
        )
    }

    fn with_multiplier(
        from: &RoadNode,
        to: &RoadNode,
        length: f64,
        road_class: RoadClass,
        multiplier: f64,
        bidirectional: bool,
    ) -> Result<Self, Error> {
        let invalid = |reason| Error::InvalidEdge {
            from: from.id,
            to: to.id,
            reason,
        };
        if !length.is_finite() || length < 0.0 {
            return Err(invalid("length must be finite and non-negative"));
        }
        if multiplier.is_nan() || multiplier < MIN_COST_MULTIPLIER {
            return Err(invalid("cost multiplier below minimum"));
        }
        Ok(Self {
            length,
            cost: length * multiplier,
            road_class,
            bidirectional,
        })
    }

    /// Speed limit derived from the road class, km/h
    pub fn speed_limit_kmh(&self) -> f64 {
        self.road_class.default_speed_kmh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (RoadNode, RoadNode) {
        (
            RoadNode::new(1, 52.5200, 13.4050),
            RoadNode::new(2, 52.5210, 13.4050),
        )
    }

    #[test]
    fn cost_follows_road_class() {
        let (a, b) = pair();
        let residential = RoadEdge::between(&a, &b, RoadClass::Residential, true).unwrap();
        let motorway = RoadEdge::between(&a, &b, RoadClass::Motorway, true).unwrap();

        assert!((residential.length - 111.19).abs() < 0.5);
        assert!((residential.cost - residential.length * 1.5).abs() < 1e-9);
        assert!((motorway.cost - motorway.length * 0.8).abs() < 1e-9);
        assert!(motorway.cost >= motorway.length * MIN_COST_MULTIPLIER);
    }

    #[test]
    fn rejects_invalid_multiplier_and_length() {
        let (a, b) = pair();
        let zero = RoadEdge::with_multiplier(&a, &b, 10.0, RoadClass::Other, 0.0, true);
        assert!(matches!(zero, Err(Error::InvalidEdge { .. })));

        let negative = RoadEdge::with_multiplier(&a, &b, -1.0, RoadClass::Other, 1.0, true);
        assert!(matches!(negative, Err(Error::InvalidEdge { .. })));

        let nan = RoadEdge::with_multiplier(&a, &b, f64::NAN, RoadClass::Other, 1.0, true);
        assert!(nan.is_err());
    }
}
