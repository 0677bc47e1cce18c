//! Route calculation over a prepared engine.
//!
//! Searches run against the immutable engine state and keep all
//! mutable bookkeeping on their own stack, so any number of routes can
//! be calculated concurrently without locks.

mod astar;
mod dijkstra;
mod path;
mod result;
mod state;

use std::collections::BTreeMap;
use std::time::Instant;

use geo::Point;
use itertools::Itertools;
use log::debug;
use petgraph::graph::NodeIndex;
use rayon::prelude::*;

pub use result::RouteResult;

use crate::Error;
use crate::model::{Algorithm, RouteRequest, RouteType, RoutingEngine, validate_coordinate};
use crate::routing::astar::astar_search;
use crate::routing::dijkstra::dijkstra_search;
use crate::routing::result::reduce;

/// Calculate a single route.
///
/// # Errors
///
/// `Validation` for malformed coordinates, `OutOfCoverage` when an
/// endpoint snaps beyond the configured radius, `VariantUnavailable`
/// when the requested variant failed validation at build time,
/// `NoRouteFound` and `Timeout` from the search itself.
pub fn calculate_route(
    engine: &RoutingEngine,
    request: &RouteRequest,
) -> Result<RouteResult, Error> {
    let started = Instant::now();
    request.validate()?;

    let source = engine.network.snap(&request.start, engine.limits.snap_radius_m)?;
    let target = engine.network.snap(&request.end, engine.limits.snap_radius_m)?;

    let mut route = solve(engine, request.route_type, request.algorithm, source, target)?;
    route.calculation_time_ms = started.elapsed().as_secs_f64() * 1000.0;

    debug!(
        "routed '{}' via {}: {:.0} m, {} nodes settled, {:.1} ms",
        request.route_type,
        request.algorithm.as_str(),
        route.distance_meters,
        route.node_count,
        route.calculation_time_ms
    );

    Ok(route)
}

/// Calculate one route per requested type between the same endpoints.
///
/// Coordinates are validated and snapped once, then the searches run
/// in parallel. The map always holds one entry per distinct requested
/// type; a type that cannot be routed yields a failure entry carrying
/// its error message instead of sinking the whole comparison.
pub fn compare_routes(
    engine: &RoutingEngine,
    start: Point<f64>,
    end: Point<f64>,
    route_types: &[RouteType],
    algorithm: Algorithm,
) -> BTreeMap<RouteType, RouteResult> {
    let requested: Vec<RouteType> = route_types.iter().copied().unique().collect();

    let endpoints = validate_coordinate(&start)
        .and_then(|()| validate_coordinate(&end))
        .and_then(|()| {
            let source = engine.network.snap(&start, engine.limits.snap_radius_m)?;
            let target = engine.network.snap(&end, engine.limits.snap_radius_m)?;
            Ok((source, target))
        });

    let (source, target) = match endpoints {
        Ok(pair) => pair,
        Err(error) => {
            let message = error.to_string();
            return requested
                .into_iter()
                .map(|route_type| {
                    let entry = RouteResult::failure(route_type, algorithm, message.clone());
                    (route_type, entry)
                })
                .collect();
        }
    };

    requested
        .into_par_iter()
        .map(|route_type| {
            let started = Instant::now();
            let entry = match solve(engine, route_type, algorithm, source, target) {
                Ok(mut route) => {
                    route.calculation_time_ms = started.elapsed().as_secs_f64() * 1000.0;
                    route
                }
                Err(error) => RouteResult::failure(route_type, algorithm, error.to_string()),
            };
            (route_type, entry)
        })
        .collect()
}

fn solve(
    engine: &RoutingEngine,
    route_type: RouteType,
    algorithm: Algorithm,
    source: NodeIndex,
    target: NodeIndex,
) -> Result<RouteResult, Error> {
    let variant = engine.graphs.variant(route_type)?;
    let budget = engine.limits.search_budget();

    let outcome = match algorithm {
        Algorithm::Dijkstra => dijkstra_search(&engine.network, variant, source, target, budget)?,
        Algorithm::AStar => astar_search(&engine.network, variant, source, target, budget)?,
    };

    reduce(
        &engine.network,
        &engine.graphs.metrics,
        &outcome,
        source,
        target,
        route_type,
        algorithm,
    )
}
