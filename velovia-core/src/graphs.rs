//! Weighted graph variants derived from the base network.
//!
//! The four route types share one parameterized cost function driven
//! by a small policy descriptor, not four duplicated code paths. All
//! variants reference the same base topology; a variant is just an
//! edge-indexed cost array plus validation and heuristic metadata.

use std::collections::BTreeMap;

use log::{info, warn};
use petgraph::algo::connected_components;
use petgraph::graph::EdgeIndex;
use rayon::prelude::*;
use serde::Serialize;

use crate::calibration::CalibrationProfile;
use crate::infrastructure::{edge_quality, is_qualifying};
use crate::model::{RoadNetwork, RouteType};
use crate::risk::RiskIndex;

/// Positive floor under every edge cost, so no weighting combination
/// can produce the zero or negative weights that break Dijkstra.
pub const MIN_EDGE_COST: f64 = 1e-3;

/// Which multiplicative terms a route type applies on top of the base
/// travel-time cost
#[derive(Debug, Clone, Copy)]
struct CostPolicy {
    risk_enabled: bool,
    infrastructure_enabled: bool,
}

fn policy(route_type: RouteType) -> CostPolicy {
    match route_type {
        RouteType::Fastest => CostPolicy {
            risk_enabled: false,
            infrastructure_enabled: false,
        },
        RouteType::Safe => CostPolicy {
            risk_enabled: true,
            infrastructure_enabled: false,
        },
        RouteType::Bike => CostPolicy {
            risk_enabled: false,
            infrastructure_enabled: true,
        },
        RouteType::SafeBike => CostPolicy {
            risk_enabled: true,
            infrastructure_enabled: true,
        },
    }
}

/// Per-edge attributes cached once for cost computation and path
/// reduction. `travel_secs` is real-world time, free of weighting.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EdgeMetrics {
    pub length_m: f64,
    pub travel_secs: f64,
    pub risk: f64,
    pub quality: f64,
    pub qualifying: bool,
}

/// Structural validation outcome for one variant
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct VariantValidation {
    pub connected_components: usize,
    pub isolated_nodes: usize,
    pub non_finite_costs: usize,
    pub negative_costs: usize,
    pub valid: bool,
}

/// Cost distribution of a variant, recorded at build time so
/// statistics never rescan the arrays
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CostStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// One weighted variant: an edge-indexed cost array over the shared
/// base topology
#[derive(Debug, Clone)]
pub struct GraphVariant {
    pub route_type: RouteType,
    /// Traversal cost per edge, indexed by `EdgeIndex::index()`
    pub costs: Vec<f64>,
    /// Tightest lower bound on cost per meter across all edges; scales
    /// the A* great-circle heuristic while keeping it admissible
    pub min_cost_per_meter: f64,
    pub cost_stats: CostStats,
    pub validation: VariantValidation,
}

/// The full variant set plus the shared per-edge metrics
#[derive(Debug, Clone)]
pub struct WeightedGraphs {
    pub variants: BTreeMap<RouteType, GraphVariant>,
    /// Indexed by `EdgeIndex::index()`, shared by all variants
    pub metrics: Vec<EdgeMetrics>,
}

impl WeightedGraphs {
    /// Build all four variants. Called exactly once at startup; the
    /// result is immutable and shared across concurrent searches.
    pub fn build(network: &RoadNetwork, profile: &CalibrationProfile, risk: &RiskIndex) -> Self {
        let edge_count = network.edge_count();

        let metrics: Vec<EdgeMetrics> = (0..edge_count)
            .into_par_iter()
            .map(|index| {
                let edge = &network.graph[EdgeIndex::new(index)];
                let speed = profile.effective_speed(edge);
                EdgeMetrics {
                    length_m: edge.length_m,
                    travel_secs: edge.length_m / speed,
                    risk: risk.edge_risk(&edge.geometry),
                    quality: edge_quality(edge),
                    qualifying: is_qualifying(edge),
                }
            })
            .collect();

        // Topology is shared, so component structure is identical for
        // every variant; compute it once.
        let components = connected_components(&network.graph);
        let isolated = network
            .graph
            .node_indices()
            .filter(|node| network.graph.neighbors_undirected(*node).next().is_none())
            .count();

        let variants = RouteType::ALL
            .iter()
            .map(|route_type| {
                let variant =
                    build_variant(*route_type, &metrics, profile, components, isolated);
                if variant.validation.valid {
                    info!(
                        "variant '{route_type}' ready: {} edges, min cost rate {:.6}",
                        variant.costs.len(),
                        variant.min_cost_per_meter
                    );
                } else {
                    warn!(
                        "variant '{route_type}' failed validation: {} non-finite and {} negative costs",
                        variant.validation.non_finite_costs, variant.validation.negative_costs
                    );
                }
                (*route_type, variant)
            })
            .collect();

        Self { variants, metrics }
    }

    /// # Errors
    ///
    /// Fails with `VariantUnavailable` when the variant is missing or
    /// did not pass validation.
    pub fn variant(&self, route_type: RouteType) -> Result<&GraphVariant, crate::Error> {
        match self.variants.get(&route_type) {
            Some(variant) if variant.validation.valid => Ok(variant),
            _ => Err(crate::Error::VariantUnavailable(route_type)),
        }
    }

    pub fn any_usable(&self) -> bool {
        self.variants.values().any(|v| v.validation.valid)
    }

    pub fn usable_count(&self) -> usize {
        self.variants.values().filter(|v| v.validation.valid).count()
    }
}

fn build_variant(
    route_type: RouteType,
    metrics: &[EdgeMetrics],
    profile: &CalibrationProfile,
    components: usize,
    isolated: usize,
) -> GraphVariant {
    let policy = policy(route_type);

    let costs: Vec<f64> = metrics
        .par_iter()
        .map(|edge| edge_cost(edge, policy, profile))
        .collect();

    let mut non_finite = 0usize;
    let mut negative = 0usize;
    let mut min_rate = f64::INFINITY;
    let mut min_cost = f64::INFINITY;
    let mut max_cost = f64::NEG_INFINITY;
    let mut cost_sum = 0.0;
    for (cost, edge) in costs.iter().zip(metrics) {
        if !cost.is_finite() {
            non_finite += 1;
            continue;
        }
        if *cost < 0.0 {
            negative += 1;
        }
        min_cost = min_cost.min(*cost);
        max_cost = max_cost.max(*cost);
        cost_sum += cost;
        if edge.length_m > 0.0 {
            min_rate = min_rate.min(cost / edge.length_m);
        }
    }

    let finite = costs.len() - non_finite;
    let cost_stats = if finite > 0 {
        CostStats {
            min: min_cost,
            max: max_cost,
            mean: cost_sum / finite as f64,
        }
    } else {
        CostStats::default()
    };

    GraphVariant {
        route_type,
        costs,
        min_cost_per_meter: if min_rate.is_finite() { min_rate } else { 0.0 },
        cost_stats,
        validation: VariantValidation {
            connected_components: components,
            isolated_nodes: isolated,
            non_finite_costs: non_finite,
            negative_costs: negative,
            valid: non_finite == 0 && negative == 0,
        },
    }
}

/// The single parameterized cost function shared by all variants.
/// Non-finite results are passed through for validation to count
/// instead of being masked by the floor.
fn edge_cost(edge: &EdgeMetrics, policy: CostPolicy, profile: &CalibrationProfile) -> f64 {
    let mut cost = edge.travel_secs;
    if policy.risk_enabled {
        cost *= 1.0 + profile.risk_coefficient * edge.risk;
    }
    if policy.infrastructure_enabled {
        cost *= 1.0 - profile.infrastructure_coefficient * edge.quality;
    }

    if cost.is_finite() { cost.max(MIN_EDGE_COST) } else { cost }
}

#[cfg(test)]
mod tests {
    use geo::{Point, line_string};

    use super::*;
    use crate::model::{
        BikeInfrastructure, IncidentCategory, IncidentRecord, NetworkBuilder, RoadClass,
        RoadEdge, Surface, polyline_length_m,
    };
    use crate::risk::DEFAULT_RISK_RESOLUTION;

    fn small_network() -> RoadNetwork {
        let mut builder = NetworkBuilder::new();
        builder.add_node(1, Point::new(-86.910, 40.420));
        builder.add_node(2, Point::new(-86.905, 40.420));
        builder.add_node(3, Point::new(-86.900, 40.420));

        let plain = line_string![(x: -86.910, y: 40.420), (x: -86.905, y: 40.420)];
        builder
            .add_edge(
                1,
                2,
                RoadEdge {
                    length_m: polyline_length_m(&plain),
                    geometry: plain,
                    class: RoadClass::Residential,
                    infrastructure: BikeInfrastructure::None,
                    surface: Surface::Paved,
                    speed_override: None,
                },
            )
            .unwrap();

        let lane = line_string![(x: -86.905, y: 40.420), (x: -86.900, y: 40.420)];
        builder
            .add_edge(
                2,
                3,
                RoadEdge {
                    length_m: polyline_length_m(&lane),
                    geometry: lane,
                    class: RoadClass::Residential,
                    infrastructure: BikeInfrastructure::SeparatedTrack,
                    surface: Surface::Paved,
                    speed_override: None,
                },
            )
            .unwrap();

        builder.build()
    }

    fn risk_at_first_edge() -> RiskIndex {
        let incidents = vec![IncidentRecord::new(
            Point::new(-86.910, 40.420),
            IncidentCategory::Assault,
            None,
        )];
        RiskIndex::build(&incidents, DEFAULT_RISK_RESOLUTION).unwrap()
    }

    #[test]
    fn policies_apply_the_right_terms() {
        let network = small_network();
        let risk = risk_at_first_edge();
        let profile = CalibrationProfile::with_coefficients(1.0, 0.5);

        let graphs = WeightedGraphs::build(&network, &profile, &risk);

        let fastest = &graphs.variants[&RouteType::Fastest].costs;
        let safe = &graphs.variants[&RouteType::Safe].costs;
        let bike = &graphs.variants[&RouteType::Bike].costs;
        let safe_bike = &graphs.variants[&RouteType::SafeBike].costs;

        // edge 0 carries risk but no infrastructure
        assert!(safe[0] > fastest[0]);
        assert_eq!(bike[0], fastest[0]);
        // edge 1 carries infrastructure but no risk
        assert!(bike[1] < fastest[1]);
        assert_eq!(safe[1], fastest[1]);
        // the combined variant applies both terms
        assert!(safe_bike[0] > fastest[0]);
        assert!(safe_bike[1] < fastest[1]);
    }

    #[test]
    fn costs_never_drop_below_the_floor() {
        let network = small_network();
        let risk = RiskIndex::build(&[], DEFAULT_RISK_RESOLUTION).unwrap();
        // maximal legal discount on every edge
        let profile = CalibrationProfile::with_coefficients(0.0, 0.9);

        let graphs = WeightedGraphs::build(&network, &profile, &risk);

        for variant in graphs.variants.values() {
            assert!(variant.validation.valid);
            for cost in &variant.costs {
                assert!(*cost >= MIN_EDGE_COST);
            }
        }
    }

    #[test]
    fn min_cost_rate_bounds_every_edge() {
        let network = small_network();
        let risk = risk_at_first_edge();
        let profile = CalibrationProfile::with_coefficients(2.0, 0.5);

        let graphs = WeightedGraphs::build(&network, &profile, &risk);

        for variant in graphs.variants.values() {
            for (cost, edge) in variant.costs.iter().zip(&graphs.metrics) {
                assert!(cost / edge.length_m >= variant.min_cost_per_meter - 1e-12);
            }
        }
    }

    #[test]
    fn invalid_variant_is_unavailable() {
        let network = small_network();
        let risk = RiskIndex::build(&[], DEFAULT_RISK_RESOLUTION).unwrap();
        let profile = CalibrationProfile::with_coefficients(0.0, 0.0);

        let mut graphs = WeightedGraphs::build(&network, &profile, &risk);
        graphs
            .variants
            .get_mut(&RouteType::Bike)
            .unwrap()
            .validation
            .valid = false;

        assert!(matches!(
            graphs.variant(RouteType::Bike),
            Err(crate::Error::VariantUnavailable(RouteType::Bike))
        ));
        assert!(graphs.variant(RouteType::Fastest).is_ok());
        assert_eq!(graphs.usable_count(), 3);
    }
}
