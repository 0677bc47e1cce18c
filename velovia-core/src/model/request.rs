//! Request vocabulary shared by the engine and its callers

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use geo::Point;
use serde::{Deserialize, Serialize};

use crate::Error;

/// Weighting policy selecting one of the four graph variants
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RouteType {
    Fastest,
    Safe,
    Bike,
    SafeBike,
}

impl RouteType {
    pub const ALL: [RouteType; 4] = [
        RouteType::Fastest,
        RouteType::Safe,
        RouteType::Bike,
        RouteType::SafeBike,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RouteType::Fastest => "fastest",
            RouteType::Safe => "safe",
            RouteType::Bike => "bike",
            RouteType::SafeBike => "safe_bike",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RouteType::Fastest => "Fastest Route",
            RouteType::Safe => "Safe Route",
            RouteType::Bike => "Bike Route",
            RouteType::SafeBike => "Safe + Bike Route",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RouteType::Fastest => "Shortest travel time without penalties",
            RouteType::Safe => "Avoids high-incident areas using reported incident data",
            RouteType::Bike => "Prioritizes bike lanes and cycling infrastructure",
            RouteType::SafeBike => "Balances safety and bike infrastructure preferences",
        }
    }
}

impl fmt::Display for RouteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RouteType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fastest" => Ok(RouteType::Fastest),
            "safe" => Ok(RouteType::Safe),
            "bike" => Ok(RouteType::Bike),
            "safe_bike" => Ok(RouteType::SafeBike),
            other => Err(Error::Validation(format!(
                "route type must be one of fastest, safe, bike, safe_bike (got '{other}')"
            ))),
        }
    }
}

/// Search algorithm choice. Both return the same optimal cost; A* uses
/// an admissible great-circle heuristic to settle fewer nodes.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Algorithm {
    #[default]
    #[serde(rename = "dijkstra")]
    Dijkstra,
    #[serde(rename = "astar")]
    AStar,
}

impl Algorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::Dijkstra => "dijkstra",
            Algorithm::AStar => "astar",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dijkstra" => Ok(Algorithm::Dijkstra),
            "astar" => Ok(Algorithm::AStar),
            other => Err(Error::Validation(format!(
                "algorithm must be one of dijkstra, astar (got '{other}')"
            ))),
        }
    }
}

/// One route calculation request
#[derive(Debug, Clone, Copy)]
pub struct RouteRequest {
    /// Start coordinate (x = longitude, y = latitude)
    pub start: Point<f64>,
    /// End coordinate (x = longitude, y = latitude)
    pub end: Point<f64>,
    pub route_type: RouteType,
    pub algorithm: Algorithm,
}

impl RouteRequest {
    /// # Errors
    ///
    /// Fails with `Validation` when a coordinate is non-finite or
    /// outside the valid latitude/longitude ranges.
    pub fn validate(&self) -> Result<(), Error> {
        validate_coordinate(&self.start)?;
        validate_coordinate(&self.end)
    }
}

pub fn validate_coordinate(point: &Point<f64>) -> Result<(), Error> {
    let (lon, lat) = (point.x(), point.y());
    if !lon.is_finite() || !lat.is_finite() {
        return Err(Error::Validation(
            "coordinates must be finite numbers".to_string(),
        ));
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(Error::Validation(format!(
            "latitude must be between -90 and 90 (got {lat})"
        )));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(Error::Validation(format!(
            "longitude must be between -180 and 180 (got {lon})"
        )));
    }
    Ok(())
}

/// Per-engine search bounds. Fixed at construction, never mutated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SearchLimits {
    /// Maximum distance between a request coordinate and its snapped
    /// node before the request is out of coverage
    #[serde(default = "default_snap_radius")]
    pub snap_radius_m: f64,
    /// Wall-clock budget for a single shortest-path search
    #[serde(default = "default_search_budget")]
    pub search_budget_ms: u64,
}

impl SearchLimits {
    pub fn search_budget(&self) -> Duration {
        Duration::from_millis(self.search_budget_ms)
    }
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            snap_radius_m: default_snap_radius(),
            search_budget_ms: default_search_budget(),
        }
    }
}

fn default_snap_radius() -> f64 {
    2000.0
}

fn default_search_budget() -> u64 {
    5000
}
