//! A* search over one weighted variant.
//!
//! The heuristic is the great-circle distance to the target scaled by
//! the variant's minimum cost per meter. Every edge costs at least
//! that rate times its length, so the bound never overestimates and
//! the first settlement of the target is optimal, matching Dijkstra.

use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use fixedbitset::FixedBitSet;
use geo::{Distance, Haversine};
use hashbrown::HashMap;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::Error;
use crate::graphs::GraphVariant;
use crate::model::RoadNetwork;
use crate::routing::path::{SearchOutcome, reconstruct};
use crate::routing::state::EstimatedState;

/// # Errors
///
/// `NoRouteFound` when the frontier empties before reaching the
/// target, `Timeout` when the search exceeds its budget.
pub(crate) fn astar_search(
    network: &RoadNetwork,
    variant: &GraphVariant,
    source: NodeIndex,
    target: NodeIndex,
    budget: Duration,
) -> Result<SearchOutcome, Error> {
    let started = Instant::now();
    let goal = network.graph[target].geometry;
    let rate = variant.min_cost_per_meter;
    let remainder = |node: NodeIndex| Haversine.distance(network.graph[node].geometry, goal) * rate;

    let mut costs: HashMap<NodeIndex, f64> = HashMap::new();
    let mut predecessors: HashMap<NodeIndex, (NodeIndex, EdgeIndex)> = HashMap::new();
    let mut settled = FixedBitSet::with_capacity(network.graph.node_count());
    let mut settled_count = 0usize;
    let mut heap = BinaryHeap::new();

    costs.insert(source, 0.0);
    heap.push(EstimatedState {
        estimate: remainder(source),
        cost: 0.0,
        node: source,
    });

    while let Some(EstimatedState { cost, node, .. }) = heap.pop() {
        if settled.contains(node.index()) {
            continue;
        }
        settled.insert(node.index());
        settled_count += 1;

        if node == target {
            return Ok(reconstruct(
                &predecessors,
                source,
                target,
                cost,
                settled_count,
            ));
        }

        if started.elapsed() > budget {
            return Err(Error::Timeout {
                budget_ms: budget.as_millis() as u64,
            });
        }

        for edge in network.graph.edges(node) {
            let next = edge.target();
            let next_cost = cost + variant.costs[edge.id().index()];

            match costs.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    predecessors.insert(next, (node, edge.id()));
                    heap.push(EstimatedState {
                        estimate: next_cost + remainder(next),
                        cost: next_cost,
                        node: next,
                    });
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        predecessors.insert(next, (node, edge.id()));
                        heap.push(EstimatedState {
                            estimate: next_cost + remainder(next),
                            cost: next_cost,
                            node: next,
                        });
                    }
                }
            }
        }
    }

    Err(Error::NoRouteFound)
}

#[cfg(test)]
mod tests {
    use geo::{LineString, Point, line_string};

    use super::*;
    use crate::calibration::CalibrationProfile;
    use crate::graphs::WeightedGraphs;
    use crate::model::{
        BikeInfrastructure, NetworkBuilder, RoadClass, RoadEdge, RouteType, Surface,
        polyline_length_m,
    };
    use crate::risk::{DEFAULT_RISK_RESOLUTION, RiskIndex};
    use crate::routing::dijkstra::dijkstra_search;

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

    /// 3x2 block with a diagonal shortcut and a detached node
    fn block_network() -> RoadNetwork {
        let coords = [
            (1, 0.00, 0.00),
            (2, 0.01, 0.00),
            (3, 0.02, 0.00),
            (4, 0.00, 0.01),
            (5, 0.01, 0.01),
            (6, 0.02, 0.01),
            (99, 2.00, 2.00),
        ];
        let mut builder = NetworkBuilder::new();
        for (id, lon, lat) in coords {
            builder.add_node(id, Point::new(lon, lat));
        }
        let pairs = [(1, 2), (2, 3), (4, 5), (5, 6), (1, 4), (2, 5), (3, 6), (1, 5)];
        for (a, b) in pairs {
            let (ax, ay) = coords.iter().find(|c| c.0 == a).map(|c| (c.1, c.2)).unwrap();
            let (bx, by) = coords.iter().find(|c| c.0 == b).map(|c| (c.1, c.2)).unwrap();
            builder
                .add_edge(a, b, edge(line_string![(x: ax, y: ay), (x: bx, y: by)]))
                .unwrap();
            builder
                .add_edge(b, a, edge(line_string![(x: bx, y: by), (x: ax, y: ay)]))
                .unwrap();
        }
        builder.build()
    }

    #[test]
    fn matches_dijkstra_cost_and_path() {
        let network = block_network();
        let risk = RiskIndex::build(&[], DEFAULT_RISK_RESOLUTION).unwrap();
        let profile = CalibrationProfile::with_coefficients(0.0, 0.0);
        let graphs = WeightedGraphs::build(&network, &profile, &risk);
        let variant = graphs.variant(RouteType::Fastest).unwrap();

        let source = network.node_index(1).unwrap();
        let target = network.node_index(6).unwrap();
        let budget = Duration::from_secs(5);

        let by_astar = astar_search(&network, variant, source, target, budget).unwrap();
        let by_dijkstra = dijkstra_search(&network, variant, source, target, budget).unwrap();

        assert!((by_astar.cost - by_dijkstra.cost).abs() < 1e-9);
        assert_eq!(by_astar.nodes, by_dijkstra.nodes);
        assert!(by_astar.settled <= by_dijkstra.settled);
    }

    #[test]
    fn unreachable_target_reports_no_route() {
        let network = block_network();
        let risk = RiskIndex::build(&[], DEFAULT_RISK_RESOLUTION).unwrap();
        let profile = CalibrationProfile::with_coefficients(0.0, 0.0);
        let graphs = WeightedGraphs::build(&network, &profile, &risk);
        let variant = graphs.variant(RouteType::Fastest).unwrap();

        let source = network.node_index(1).unwrap();
        let detached = network.node_index(99).unwrap();

        let result = astar_search(&network, variant, source, detached, Duration::from_secs(5));
        assert!(matches!(result, Err(Error::NoRouteFound)));
    }

    #[test]
    fn exhausted_budget_reports_timeout() {
        let network = block_network();
        let risk = RiskIndex::build(&[], DEFAULT_RISK_RESOLUTION).unwrap();
        let profile = CalibrationProfile::with_coefficients(0.0, 0.0);
        let graphs = WeightedGraphs::build(&network, &profile, &risk);
        let variant = graphs.variant(RouteType::Fastest).unwrap();

        let source = network.node_index(1).unwrap();
        let target = network.node_index(6).unwrap();

        let result = astar_search(&network, variant, source, target, Duration::ZERO);
        assert!(matches!(result, Err(Error::Timeout { .. })));
    }
}
