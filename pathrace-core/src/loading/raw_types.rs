use serde::{Deserialize, Serialize};

use crate::OsmNodeId;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawNode {
    pub id: OsmNodeId,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawWay {
    /// Node ids in travel order
    pub nodes: Vec<OsmNodeId>,
    /// OSM `highway` tag
    #[serde(default, alias = "roadType")]
    pub road_type: Option<String>,
    #[serde(default)]
    pub oneway: bool,
}

/// Road data of one exploration area
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawRoadData {
    pub nodes: Vec<RawNode>,
    pub ways: Vec<RawWay>,
}

impl RawRoadData {
    /// Parses road data from a JSON document
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidData`] if the document is malformed.
    pub fn from_json(json: &str) -> Result<Self, crate::Error> {
        serde_json::from_str(json).map_err(|e| crate::Error::InvalidData(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_document() {
        let data = RawRoadData::from_json(
            r#"{
                "nodes": [{"id": 1, "lat": 1.0, "lon": 2.0}, {"id": 2, "lat": 1.1, "lon": 2.1}],
                "ways": [{"nodes": [1, 2], "roadType": "primary"}, {"nodes": [2, 1], "oneway": true}]
            }"#,
        )
        .unwrap();

        assert_eq!(data.nodes.len(), 2);
        assert_eq!(data.ways[0].road_type.as_deref(), Some("primary"));
        assert!(!data.ways[0].oneway);
        assert!(data.ways[1].oneway);
        assert_eq!(data.ways[1].road_type, None);
    }

    #[test]
    fn malformed_document_is_invalid_data() {
        assert!(matches!(
            RawRoadData::from_json("{\"nodes\": 3}"),
            Err(crate::Error::InvalidData(_))
        ));
    }
}
