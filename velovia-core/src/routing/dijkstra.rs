//! Dijkstra search over one weighted variant

use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use fixedbitset::FixedBitSet;
use hashbrown::HashMap;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::Error;
use crate::graphs::GraphVariant;
use crate::model::RoadNetwork;
use crate::routing::path::{SearchOutcome, reconstruct};
use crate::routing::state::SearchState;

/// Cheapest path from `source` to `target` under the variant's edge
/// costs. The goal test runs when a node is settled, before the budget
/// check, so a trivial source-equals-target query always succeeds.
///
/// # Errors
///
/// `NoRouteFound` when the frontier empties before reaching the
/// target, `Timeout` when the search exceeds its budget.
pub(crate) fn dijkstra_search(
    network: &RoadNetwork,
    variant: &GraphVariant,
    source: NodeIndex,
    target: NodeIndex,
    budget: Duration,
) -> Result<SearchOutcome, Error> {
    let started = Instant::now();

    let mut distances: HashMap<NodeIndex, f64> = HashMap::new();
    let mut predecessors: HashMap<NodeIndex, (NodeIndex, EdgeIndex)> = HashMap::new();
    let mut settled = FixedBitSet::with_capacity(network.graph.node_count());
    let mut settled_count = 0usize;
    let mut heap = BinaryHeap::new();

    distances.insert(source, 0.0);
    heap.push(SearchState {
        cost: 0.0,
        node: source,
    });

    while let Some(SearchState { cost, node }) = heap.pop() {
        // Stale frontier entry, a cheaper path was already settled
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

            match distances.entry(next) {
                hashbrown::hash_map::Entry::Vacant(entry) => {
                    entry.insert(next_cost);
                    predecessors.insert(next, (node, edge.id()));
                    heap.push(SearchState {
                        cost: next_cost,
                        node: next,
                    });
                }
                hashbrown::hash_map::Entry::Occupied(mut entry) => {
                    // Strict improvement only, so equal-cost rivals
                    // never displace an established predecessor
                    if next_cost < *entry.get() {
                        *entry.get_mut() = next_cost;
                        predecessors.insert(next, (node, edge.id()));
                        heap.push(SearchState {
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
    use crate::graphs::{CostStats, VariantValidation};
    use crate::model::{
        BikeInfrastructure, NetworkBuilder, RoadClass, RoadEdge, RouteType, Surface,
        polyline_length_m,
    };

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

    fn variant(costs: Vec<f64>) -> GraphVariant {
        GraphVariant {
            route_type: RouteType::Fastest,
            costs,
            min_cost_per_meter: 0.0,
            cost_stats: CostStats::default(),
            validation: VariantValidation::default(),
        }
    }

    /// a --10--> d, a --2--> b --3--> d, plus a detached node 99
    fn diamond() -> RoadNetwork {
        let mut builder = NetworkBuilder::new();
        builder.add_node(1, Point::new(0.00, 0.0));
        builder.add_node(2, Point::new(0.01, 0.0));
        builder.add_node(3, Point::new(0.02, 0.0));
        builder.add_node(99, Point::new(1.0, 1.0));
        builder
            .add_edge(1, 3, edge(line_string![(x: 0.00, y: 0.0), (x: 0.02, y: 0.0)]))
            .unwrap();
        builder
            .add_edge(1, 2, edge(line_string![(x: 0.00, y: 0.0), (x: 0.01, y: 0.0)]))
            .unwrap();
        builder
            .add_edge(2, 3, edge(line_string![(x: 0.01, y: 0.0), (x: 0.02, y: 0.0)]))
            .unwrap();
        builder.build()
    }

    #[test]
    fn cheaper_detour_beats_direct_edge() {
        let network = diamond();
        let variant = variant(vec![10.0, 2.0, 3.0]);
        let source = network.node_index(1).unwrap();
        let target = network.node_index(3).unwrap();

        let outcome =
            dijkstra_search(&network, &variant, source, target, Duration::from_secs(5)).unwrap();

        assert_eq!(outcome.cost, 5.0);
        assert_eq!(outcome.nodes.len(), 3);
        assert_eq!(outcome.edges.len(), 2);
    }

    #[test]
    fn unreachable_target_reports_no_route() {
        let network = diamond();
        let variant = variant(vec![1.0, 1.0, 1.0]);
        let source = network.node_index(1).unwrap();
        let detached = network.node_index(99).unwrap();

        let result = dijkstra_search(&network, &variant, source, detached, Duration::from_secs(5));
        assert!(matches!(result, Err(Error::NoRouteFound)));
    }

    #[test]
    fn exhausted_budget_reports_timeout() {
        let network = diamond();
        let variant = variant(vec![1.0, 1.0, 1.0]);
        let source = network.node_index(1).unwrap();
        let target = network.node_index(3).unwrap();

        let result = dijkstra_search(&network, &variant, source, target, Duration::ZERO);
        assert!(matches!(result, Err(Error::Timeout { budget_ms: 0 })));
    }

    #[test]
    fn equal_cost_paths_resolve_toward_smaller_node_index() {
        // two equal-cost routes 1 -> 3; the path through node 2 wins
        // because node 2 was inserted first and carries the smaller
        // graph index
        let mut builder = NetworkBuilder::new();
        builder.add_node(1, Point::new(0.00, 0.0));
        builder.add_node(2, Point::new(0.01, 0.01));
        builder.add_node(4, Point::new(0.01, -0.01));
        builder.add_node(3, Point::new(0.02, 0.0));
        builder
            .add_edge(1, 2, edge(line_string![(x: 0.00, y: 0.0), (x: 0.01, y: 0.01)]))
            .unwrap();
        builder
            .add_edge(1, 4, edge(line_string![(x: 0.00, y: 0.0), (x: 0.01, y: -0.01)]))
            .unwrap();
        builder
            .add_edge(2, 3, edge(line_string![(x: 0.01, y: 0.01), (x: 0.02, y: 0.0)]))
            .unwrap();
        builder
            .add_edge(4, 3, edge(line_string![(x: 0.01, y: -0.01), (x: 0.02, y: 0.0)]))
            .unwrap();
        let network = builder.build();

        let variant = variant(vec![2.0, 2.0, 2.0, 2.0]);
        let source = network.node_index(1).unwrap();
        let target = network.node_index(3).unwrap();

        for _ in 0..5 {
            let outcome =
                dijkstra_search(&network, &variant, source, target, Duration::from_secs(5))
                    .unwrap();
            assert_eq!(outcome.nodes[1], network.node_index(2).unwrap());
        }
    }

    #[test]
    fn source_equal_to_target_is_a_zero_cost_outcome() {
        let network = diamond();
        let variant = variant(vec![1.0, 1.0, 1.0]);
        let source = network.node_index(1).unwrap();

        let outcome =
            dijkstra_search(&network, &variant, source, source, Duration::ZERO).unwrap();

        assert_eq!(outcome.cost, 0.0);
        assert_eq!(outcome.nodes, vec![source]);
        assert!(outcome.edges.is_empty());
        assert_eq!(outcome.settled, 1);
    }
}
