//! Road network graph

use geo::{Point, Rect, coord};
use hashbrown::HashMap;
use itertools::Itertools;
use log::trace;
use petgraph::{
    Directed, Direction, Graph,
    graph::{EdgeIndex, NodeIndex},
    visit::EdgeRef,
};
use rstar::{RTree, primitives::GeomWithData};

use super::{RoadClass, RoadEdge, RoadNode};
use crate::{Error, OsmNodeId};

/// R-tree entry: `[lon, lat]` tagged with the graph node it belongs to
pub type IndexedPoint = GeomWithData<[f64; 2], NodeIndex>;

/// A node reachable from another one over a single edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub node: NodeIndex,
    pub edge: EdgeIndex,
    pub cost: f64,
}

/// Owning container of road nodes and the edges between them.
///
/// Every edge is stored once; a bidirectional edge is traversable from
/// both of its endpoints, so both adjacency views share the same edge.
#[derive(Debug, Clone, Default)]
pub struct RoadGraph {
    pub(crate) graph: Graph<RoadNode, RoadEdge, Directed>,
    index: HashMap<OsmNodeId, NodeIndex>,
    rtree: RTree<IndexedPoint>,
    bounds: Option<Rect<f64>>,
}

impl RoadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node, or returns the existing one if `id` is already known
    pub fn add_node(&mut self, id: OsmNodeId, lat: f64, lon: f64) -> NodeIndex {
        if let Some(&existing) = self.index.get(&id) {
            return existing;
        }

        let idx = self.graph.add_node(RoadNode::new(id, lat, lon));
        self.index.insert(id, idx);
        self.rtree.insert(IndexedPoint::new([lon, lat], idx));
        self.extend_bounds(lon, lat);
        idx
    }

    fn extend_bounds(&mut self, lon: f64, lat: f64) {
        self.bounds = Some(match self.bounds {
            None => Rect::new(coord! { x: lon, y: lat }, coord! { x: lon, y: lat }),
            Some(rect) => Rect::new(
                coord! { x: rect.min().x.min(lon), y: rect.min().y.min(lat) },
                coord! { x: rect.max().x.max(lon), y: rect.max().y.max(lat) },
            ),
        });
    }

    /// Connects two nodes with a single edge.
    ///
    /// Connecting a node to itself is a no-op returning `Ok(None)`.
    /// Connecting an already connected pair returns the existing edge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownNode`] if either id is not in the graph and
    /// [`Error::InvalidEdge`] if the derived cost is invalid.
    pub fn connect(
        &mut self,
        from: OsmNodeId,
        to: OsmNodeId,
        road_type: Option<&str>,
        bidirectional: bool,
    ) -> Result<Option<EdgeIndex>, Error> {
        let a = self.node_index(from).ok_or(Error::UnknownNode(from))?;
        let b = self.node_index(to).ok_or(Error::UnknownNode(to))?;

        if a == b {
            trace!("Ignoring self-loop on node {from}");
            return Ok(None);
        }

        if let Some(existing) = self.find_connection(a, b) {
            return Ok(Some(existing));
        }

        let road_class = road_type.map(RoadClass::from_tag).unwrap_or_default();
        let edge = RoadEdge::between(
            &self.graph[a],
            &self.graph[b],
            road_class,
            bidirectional,
        )?;
        Ok(Some(self.graph.add_edge(a, b, edge)))
    }

    fn find_connection(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        self.graph.find_edge(a, b).or_else(|| {
            self.graph
                .find_edge(b, a)
                .filter(|&e| self.graph[e].bidirectional)
        })
    }

    /// Edge that can be travelled from `from` to `to`, if any
    pub fn edge_between(&self, from: NodeIndex, to: NodeIndex) -> Option<&RoadEdge> {
        self.find_connection(from, to).map(|e| &self.graph[e])
    }

    /// Geometric length of a node sequence in meters
    pub fn path_length_m(&self, path: &[NodeIndex]) -> f64 {
        path.iter()
            .tuple_windows()
            .filter_map(|(&a, &b)| Some(self.node_at(a)?.distance_m(self.node_at(b)?)))
            .sum()
    }

    pub fn node_index(&self, id: OsmNodeId) -> Option<NodeIndex> {
        self.index.get(&id).copied()
    }

    pub fn node(&self, id: OsmNodeId) -> Option<&RoadNode> {
        self.node_index(id).and_then(|idx| self.graph.node_weight(idx))
    }

    pub fn node_at(&self, idx: NodeIndex) -> Option<&RoadNode> {
        self.graph.node_weight(idx)
    }

    pub fn contains(&self, idx: NodeIndex) -> bool {
        idx.index() < self.graph.node_count()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Geographic bounding box of all inserted nodes
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.bounds
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &RoadNode)> {
        self.graph
            .node_indices()
            .map(move |idx| (idx, &self.graph[idx]))
    }

    /// Nodes reachable over one edge, in edge insertion order.
    ///
    /// `Direction::Outgoing` follows edges the way they can be travelled,
    /// `Direction::Incoming` lists the nodes that can travel to `node`.
    pub fn neighbors(&self, node: NodeIndex, direction: Direction) -> Vec<Neighbor> {
        let mut neighbors: Vec<Neighbor> = self
            .graph
            .edges_directed(node, direction)
            .chain(
                self.graph
                    .edges_directed(node, direction.opposite())
                    .filter(|edge| edge.weight().bidirectional),
            )
            .map(|edge| Neighbor {
                node: if edge.source() == node {
                    edge.target()
                } else {
                    edge.source()
                },
                edge: edge.id(),
                cost: edge.weight().cost,
            })
            .collect();
        neighbors.sort_unstable_by_key(|n| n.edge);
        neighbors
    }

    /// Closest node to `point` (`x` = lon, `y` = lat) and its distance in meters
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoPointsFound`] on an empty graph.
    pub fn nearest_node(&self, point: &Point<f64>) -> Result<(NodeIndex, f64), Error> {
        let nearest = self
            .rtree
            .nearest_neighbor(&[point.x(), point.y()])
            .ok_or(Error::NoPointsFound)?;
        let node = &self.graph[nearest.data];
        let probe = RoadNode {
            id: node.id,
            geometry: *point,
        };
        Ok((nearest.data, node.distance_m(&probe)))
    }

    /// Removes every node and edge, e.g. when a new area is selected
    pub fn clear(&mut self) {
        self.graph.clear();
        self.index.clear();
        self.rtree = RTree::new();
        self.bounds = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> RoadGraph {
        let mut graph = RoadGraph::new();
        graph.add_node(1, 0.0, 0.0);
        graph.add_node(2, 0.0, 0.001);
        graph.add_node(3, 0.001, 0.0);
        graph.connect(1, 2, Some("primary"), true).unwrap();
        graph.connect(2, 3, None, false).unwrap();
        graph.connect(3, 1, Some("residential"), true).unwrap();
        graph
    }

    #[test]
    fn edges_carry_road_class_speed() {
        let graph = triangle();
        let [n1, n2, n3] = [1, 2, 3].map(|id| graph.node_index(id).unwrap());

        assert_eq!(graph.edge_between(n1, n2).unwrap().speed_limit_kmh(), 80.0);
        assert_eq!(graph.edge_between(n3, n1).unwrap().speed_limit_kmh(), 30.0);
        assert_eq!(graph.edge_between(n2, n3).unwrap().speed_limit_kmh(), 50.0);
    }

    #[test]
    fn add_node_is_idempotent() {
        let mut graph = RoadGraph::new();
        let first = graph.add_node(7, 1.0, 2.0);
        let second = graph.add_node(7, 5.0, 5.0);

        assert_eq!(first, second);
        assert_eq!(graph.node_count(), 1);
        assert_eq!(graph.node(7).unwrap().lat(), 1.0);
    }

    #[test]
    fn bounds_grow_with_inserts() {
        let graph = triangle();
        let bounds = graph.bounds().unwrap();
        assert_eq!(bounds.min(), coord! { x: 0.0, y: 0.0 });
        assert_eq!(bounds.max(), coord! { x: 0.001, y: 0.001 });
    }

    #[test]
    fn connect_rejects_unknown_nodes_and_ignores_self_loops() {
        let mut graph = triangle();
        assert_eq!(graph.connect(1, 99, None, true), Err(Error::UnknownNode(99)));
        assert_eq!(graph.connect(1, 1, None, true), Ok(None));
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn connect_does_not_duplicate_edges() {
        let mut graph = triangle();
        let existing = graph.graph.find_edge(
            graph.node_index(1).unwrap(),
            graph.node_index(2).unwrap(),
        );
        assert_eq!(graph.connect(1, 2, None, true).unwrap(), existing);
        // reverse of a bidirectional edge
        assert_eq!(graph.connect(2, 1, None, true).unwrap(), existing);
        assert_eq!(graph.edge_count(), 3);
    }

    #[test]
    fn one_way_edges_are_directional() {
        let graph = triangle();
        let n2 = graph.node_index(2).unwrap();
        let n3 = graph.node_index(3).unwrap();

        let out_of_3: Vec<_> = graph
            .neighbors(n3, Direction::Outgoing)
            .iter()
            .map(|n| n.node)
            .collect();
        assert!(!out_of_3.contains(&n2));

        let into_3: Vec<_> = graph
            .neighbors(n3, Direction::Incoming)
            .iter()
            .map(|n| n.node)
            .collect();
        assert!(into_3.contains(&n2));
    }

    #[test]
    fn shared_edge_appears_in_both_adjacency_lists() {
        let graph = triangle();
        let n1 = graph.node_index(1).unwrap();
        let n2 = graph.node_index(2).unwrap();

        let from_1 = graph.neighbors(n1, Direction::Outgoing);
        let from_2 = graph.neighbors(n2, Direction::Outgoing);
        let edge_12 = from_1.iter().find(|n| n.node == n2).unwrap().edge;
        let edge_21 = from_2.iter().find(|n| n.node == n1).unwrap().edge;
        assert_eq!(edge_12, edge_21);
    }

    #[test]
    fn neighbors_follow_insertion_order() {
        let graph = triangle();
        let n1 = graph.node_index(1).unwrap();
        let edges: Vec<_> = graph
            .neighbors(n1, Direction::Outgoing)
            .iter()
            .map(|n| n.edge.index())
            .collect();
        assert_eq!(edges, vec![0, 2]);
    }

    #[test]
    fn nearest_node_snaps_to_closest() {
        let graph = triangle();
        let (idx, meters) = graph.nearest_node(&Point::new(0.0009, 0.0001)).unwrap();
        assert_eq!(graph.node_at(idx).unwrap().id, 2);
        assert!(meters < 20.0);

        assert_eq!(
            RoadGraph::new().nearest_node(&Point::new(0.0, 0.0)),
            Err(Error::NoPointsFound)
        );
    }

    #[test]
    fn edge_between_respects_direction() {
        let graph = triangle();
        let n2 = graph.node_index(2).unwrap();
        let n3 = graph.node_index(3).unwrap();
        assert!(graph.edge_between(n2, n3).is_some());
        assert!(graph.edge_between(n3, n2).is_none());

        let n1 = graph.node_index(1).unwrap();
        let length = graph.path_length_m(&[n1, n2, n3]);
        assert!(length > 200.0 && length < 300.0);
    }

    #[test]
    fn clear_empties_everything() {
        let mut graph = triangle();
        graph.clear();
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.bounds().is_none());
        assert!(graph.node(1).is_none());
    }
}
