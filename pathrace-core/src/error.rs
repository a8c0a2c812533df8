use thiserror::Error;

use crate::OsmNodeId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Unknown node: {0}")]
    UnknownNode(OsmNodeId),
    #[error("Invalid node index")]
    InvalidNodeIndex,
    #[error("Invalid edge {from} -> {to}: {reason}")]
    InvalidEdge {
        from: OsmNodeId,
        to: OsmNodeId,
        reason: &'static str,
    },
    #[error("Graph integrity violated: {0}")]
    GraphIntegrity(String),
    #[error("Step budget of {0} exceeded")]
    StepBudgetExceeded(usize),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Point lies outside the search area")]
    OutsideSearchArea,
    #[error("No nearby points found for snapping")]
    NoPointsFound,
    #[error("GeoJSON error: {0}")]
    GeoJsonError(String),
}
