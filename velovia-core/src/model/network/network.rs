//! Base road graph with a spatial index for coordinate snapping

use geo::{Distance, Haversine, LineString, Point};
use hashbrown::HashMap;
use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use super::components::{RoadEdge, RoadNode};
use crate::{Error, NodeId};

/// Node reference stored in the R-tree, positioned in lon/lat degree space
#[derive(Debug, Clone, Copy)]
pub struct IndexedPoint {
    pub position: [f64; 2],
    pub node: NodeIndex,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// Immutable base road network shared by every weighted variant.
///
/// Holds the directed graph, a lookup from source node ids to graph
/// indices, and an R-tree over node positions for nearest-node queries.
#[derive(Debug, Clone)]
pub struct RoadNetwork {
    pub graph: DiGraph<RoadNode, RoadEdge>,
    node_ids: HashMap<NodeId, NodeIndex>,
    index: RTree<IndexedPoint>,
}

impl RoadNetwork {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn node_index(&self, id: NodeId) -> Option<NodeIndex> {
        self.node_ids.get(&id).copied()
    }

    pub fn node_point(&self, node: NodeIndex) -> Result<Point<f64>, Error> {
        self.graph
            .node_weight(node)
            .map(|n| n.geometry)
            .ok_or(Error::UnrecoverableError("node index out of bounds"))
    }

    /// Nearest graph node to the given point, with the great-circle
    /// distance to it in meters. `None` on an empty network.
    pub fn nearest_node(&self, point: &Point<f64>) -> Option<(NodeIndex, f64)> {
        let found = self.index.nearest_neighbor(&[point.x(), point.y()])?;
        let node_point = Point::new(found.position[0], found.position[1]);
        Some((found.node, Haversine.distance(*point, node_point)))
    }

    /// Snap a coordinate to the nearest node, failing with
    /// `OutOfCoverage` when it lies farther than `max_distance_m`.
    pub fn snap(&self, point: &Point<f64>, max_distance_m: f64) -> Result<NodeIndex, Error> {
        let (node, distance_m) = self.nearest_node(point).ok_or(Error::OutOfCoverage {
            distance_m: f64::INFINITY,
            limit_m: max_distance_m,
        })?;

        if distance_m > max_distance_m {
            return Err(Error::OutOfCoverage {
                distance_m,
                limit_m: max_distance_m,
            });
        }

        Ok(node)
    }
}

/// Incremental constructor for `RoadNetwork`.
///
/// Nodes are deduplicated by id; insertion order fixes the graph
/// indices, which keeps routing tie-breaks stable for identical input.
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    graph: DiGraph<RoadNode, RoadEdge>,
    node_ids: HashMap<NodeId, NodeIndex>,
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: NodeId, geometry: Point<f64>) -> NodeIndex {
        match self.node_ids.get(&id) {
            Some(index) => *index,
            None => {
                let index = self.graph.add_node(RoadNode { id, geometry });
                self.node_ids.insert(id, index);
                index
            }
        }
    }

    /// # Errors
    ///
    /// Fails if either endpoint id has not been added as a node.
    pub fn add_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        edge: RoadEdge,
    ) -> Result<EdgeIndex, Error> {
        let source = self
            .node_ids
            .get(&source)
            .copied()
            .ok_or_else(|| Error::InvalidData(format!("unknown source node id {source}")))?;
        let target = self
            .node_ids
            .get(&target)
            .copied()
            .ok_or_else(|| Error::InvalidData(format!("unknown target node id {target}")))?;

        Ok(self.graph.add_edge(source, target, edge))
    }

    pub fn build(self) -> RoadNetwork {
        let points: Vec<IndexedPoint> = self
            .graph
            .node_indices()
            .map(|node| IndexedPoint {
                position: [
                    self.graph[node].geometry.x(),
                    self.graph[node].geometry.y(),
                ],
                node,
            })
            .collect();

        RoadNetwork {
            graph: self.graph,
            node_ids: self.node_ids,
            index: RTree::bulk_load(points),
        }
    }
}

/// Great-circle length of a polyline in meters
pub fn polyline_length_m(geometry: &LineString<f64>) -> f64 {
    geometry
        .lines()
        .map(|segment| Haversine.distance(segment.start_point(), segment.end_point()))
        .sum()
}

#[cfg(test)]
mod tests {
    use geo::line_string;

    use super::*;
    use crate::model::network::components::{BikeInfrastructure, RoadClass, Surface};

    fn edge(geometry: LineString<f64>) -> RoadEdge {
        let length_m = polyline_length_m(&geometry);
        RoadEdge {
            geometry,
            length_m,
            class: RoadClass::Residential,
            infrastructure: BikeInfrastructure::None,
            surface: Surface::Paved,
            speed_override: None,
        }
    }

    fn two_node_network() -> RoadNetwork {
        let mut builder = NetworkBuilder::new();
        builder.add_node(1, Point::new(-86.91, 40.42));
        builder.add_node(2, Point::new(-86.90, 40.42));
        builder
            .add_edge(1, 2, edge(line_string![(x: -86.91, y: 40.42), (x: -86.90, y: 40.42)]))
            .unwrap();
        builder.build()
    }

    #[test]
    fn snaps_to_the_closest_node() {
        let network = two_node_network();
        let near_second = Point::new(-86.9001, 40.4201);

        let (node, distance) = network.nearest_node(&near_second).unwrap();
        assert_eq!(network.graph[node].id, 2);
        assert!(distance < 50.0);
    }

    #[test]
    fn snap_rejects_far_coordinates() {
        let network = two_node_network();
        let far = Point::new(-87.5, 40.42);

        let result = network.snap(&far, 2000.0);
        assert!(matches!(result, Err(Error::OutOfCoverage { .. })));
    }

    #[test]
    fn duplicate_node_ids_collapse() {
        let mut builder = NetworkBuilder::new();
        let first = builder.add_node(7, Point::new(0.0, 0.0));
        let second = builder.add_node(7, Point::new(0.0, 0.0));
        assert_eq!(first, second);
    }

    #[test]
    fn edge_with_unknown_endpoint_is_rejected() {
        let mut builder = NetworkBuilder::new();
        builder.add_node(1, Point::new(0.0, 0.0));
        let result =
            builder.add_edge(1, 99, edge(line_string![(x: 0.0, y: 0.0), (x: 0.1, y: 0.0)]));
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn polyline_length_matches_haversine() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0)];
        let length = polyline_length_m(&line);
        // one degree of longitude at the equator
        assert!((length - 111_195.0).abs() < 200.0);
    }
}
