use geo::{LineString, coord, line_string};
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use petgraph::graph::NodeIndex;
use serde_json::json;

use crate::{
    Error, RoadGraph,
    timeline::{TimelineScheduler, Waypoint},
};

impl TimelineScheduler {
    /// Converts every scheduled segment to a `GeoJSON` `LineString` feature.
    ///
    /// `source` tags the features, e.g. `"algorithm"` or `"player"`.
    pub fn to_geojson(&self, source: &str) -> Result<FeatureCollection, Error> {
        let features = self
            .waypoints()
            .iter()
            .enumerate()
            .map(|(idx, waypoint)| waypoint_feature(waypoint, idx, source))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(FeatureCollection {
            features,
            bbox: None,
            foreign_members: None,
        })
    }

    pub fn to_geojson_string(&self, source: &str) -> Result<String, Error> {
        serde_json::to_string(&self.to_geojson(source)?)
            .map_err(|e| Error::GeoJsonError(e.to_string()))
    }
}

fn waypoint_feature(waypoint: &Waypoint, idx: usize, source: &str) -> Result<Feature, Error> {
    let [from_lon, from_lat] = waypoint.from;
    let [to_lon, to_lat] = waypoint.to;
    let line = line_string![
        (x: from_lon, y: from_lat),
        (x: to_lon, y: to_lat)
    ];
    let geometry = Geometry::new(GeoJsonValue::from(&line));

    let value = json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": {
            "source": source,
            "segment_index": idx,
            "category": waypoint.kind,
            "start_time": waypoint.start_time,
            "end_time": waypoint.end_time,
            "duration": waypoint.duration(),
        }
    });

    serde_json::from_value::<Feature>(value).map_err(|e| Error::GeoJsonError(e.to_string()))
}

/// Builds a single `LineString` feature following `path` through `graph`
pub fn path_feature(graph: &RoadGraph, path: &[NodeIndex], name: &str) -> Result<Feature, Error> {
    let coords = path
        .iter()
        .map(|&idx| {
            graph
                .node_at(idx)
                .map(|node| coord! { x: node.lon(), y: node.lat() })
                .ok_or(Error::InvalidNodeIndex)
        })
        .collect::<Result<Vec<_>, _>>()?;
    let geometry = Geometry::new(GeoJsonValue::from(&LineString::new(coords)));
    let node_ids: Vec<_> = path
        .iter()
        .filter_map(|&idx| graph.node_at(idx).map(|node| node.id))
        .collect();

    let value = json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": {
            "name": name,
            "node_count": path.len(),
            "node_ids": node_ids,
            "length_m": graph.path_length_m(path),
        }
    });

    serde_json::from_value::<Feature>(value).map_err(|e| Error::GeoJsonError(e.to_string()))
}

/// Merges feature collections, keeping their order
pub fn merge_collections(collections: impl IntoIterator<Item = FeatureCollection>) -> FeatureCollection {
    FeatureCollection {
        features: collections
            .into_iter()
            .flat_map(|collection| collection.features)
            .collect(),
        bbox: None,
        foreign_members: None,
    }
}
