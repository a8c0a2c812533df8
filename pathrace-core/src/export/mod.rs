//! `GeoJSON` export of timelines and paths

mod to_geojson;

pub use to_geojson::{merge_collections, path_feature};
