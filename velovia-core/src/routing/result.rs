//! Reduction of a raw search outcome into the client-facing route

use petgraph::graph::NodeIndex;
use serde::Serialize;
use serde_json::json;

use crate::Error;
use crate::graphs::EdgeMetrics;
use crate::model::{Algorithm, RoadNetwork, RouteType};
use crate::routing::path::SearchOutcome;

/// One calculated route, or a failed attempt carrying its error.
///
/// `route` is a polyline of `[lat, lon]` pairs. A trivial route whose
/// endpoints snap to the same node holds a single point.
#[derive(Debug, Clone, Serialize)]
pub struct RouteResult {
    pub route: Vec<[f64; 2]>,
    pub distance_meters: f64,
    pub estimated_time_minutes: f64,
    /// 0 to 100, higher is safer; 100 for a zero-length route
    pub safety_score: f64,
    /// Share of the distance on dedicated bike infrastructure
    pub bike_coverage_percent: f64,
    pub route_type: RouteType,
    pub algorithm_used: Algorithm,
    pub calculation_time_ms: f64,
    /// Nodes settled by the search
    pub node_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl RouteResult {
    /// Placeholder entry for a route that could not be produced, used
    /// by comparisons where one failure must not sink the others
    pub fn failure(route_type: RouteType, algorithm: Algorithm, message: String) -> Self {
        Self {
            route: Vec::new(),
            distance_meters: 0.0,
            estimated_time_minutes: 0.0,
            safety_score: 0.0,
            bike_coverage_percent: 0.0,
            route_type,
            algorithm_used: algorithm,
            calculation_time_ms: 0.0,
            node_count: 0,
            error_message: Some(message),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error_message.is_some()
    }

    /// GeoJSON feature with the route geometry in lon/lat order and
    /// the summary figures as properties
    pub fn to_geojson(&self) -> geojson::Feature {
        let geometry = match self.route.len() {
            0 => None,
            1 => Some(geojson::Geometry::new(geojson::Value::Point(vec![
                self.route[0][1],
                self.route[0][0],
            ]))),
            _ => {
                let line: geo::LineString<f64> = self
                    .route
                    .iter()
                    .map(|pair| (pair[1], pair[0]))
                    .collect::<Vec<_>>()
                    .into();
                Some(geojson::Geometry::new(geojson::Value::from(&line)))
            }
        };

        let properties = json!({
            "route_type": self.route_type,
            "algorithm_used": self.algorithm_used,
            "distance_meters": self.distance_meters,
            "estimated_time_minutes": self.estimated_time_minutes,
            "safety_score": self.safety_score,
            "bike_coverage_percent": self.bike_coverage_percent,
            "node_count": self.node_count,
        });

        geojson::Feature {
            bbox: None,
            geometry,
            id: None,
            properties: properties.as_object().cloned(),
            foreign_members: None,
        }
    }
}

/// Turn a search outcome into a `RouteResult`. `calculation_time_ms`
/// is left at zero for the caller to fill once total timing is known.
///
/// # Errors
///
/// `UnrecoverableError` when the path does not span the snapped
/// endpoints, which indicates a broken predecessor chain.
pub(crate) fn reduce(
    network: &RoadNetwork,
    metrics: &[EdgeMetrics],
    outcome: &SearchOutcome,
    source: NodeIndex,
    target: NodeIndex,
    route_type: RouteType,
    algorithm: Algorithm,
) -> Result<RouteResult, Error> {
    if outcome.nodes.first() != Some(&source) || outcome.nodes.last() != Some(&target) {
        return Err(Error::UnrecoverableError(
            "search path does not span the snapped endpoints",
        ));
    }

    let mut route: Vec<[f64; 2]> = Vec::new();
    let mut distance_m = 0.0;
    let mut travel_secs = 0.0;
    let mut risk_exposure = 0.0;
    let mut qualifying_m = 0.0;

    if outcome.edges.is_empty() {
        let point = network.graph[source].geometry;
        route.push([point.y(), point.x()]);
    } else {
        for (position, edge) in outcome.edges.iter().enumerate() {
            let geometry = &network.graph[*edge].geometry;
            for (index, coord) in geometry.0.iter().enumerate() {
                // consecutive edges share a vertex
                if position > 0 && index == 0 {
                    continue;
                }
                route.push([coord.y, coord.x]);
            }

            let edge_metrics = &metrics[edge.index()];
            distance_m += edge_metrics.length_m;
            travel_secs += edge_metrics.travel_secs;
            risk_exposure += edge_metrics.risk * edge_metrics.length_m;
            if edge_metrics.qualifying {
                qualifying_m += edge_metrics.length_m;
            }
        }
    }

    let (safety_score, bike_coverage_percent) = if distance_m > 0.0 {
        let mean_risk = risk_exposure / distance_m;
        (
            ((1.0 - mean_risk) * 100.0).clamp(0.0, 100.0),
            (qualifying_m / distance_m * 100.0).clamp(0.0, 100.0),
        )
    } else {
        (100.0, 0.0)
    };

    Ok(RouteResult {
        route,
        distance_meters: distance_m,
        estimated_time_minutes: travel_secs / 60.0,
        safety_score,
        bike_coverage_percent,
        route_type,
        algorithm_used: algorithm,
        calculation_time_ms: 0.0,
        node_count: outcome.settled,
        error_message: None,
    })
}
