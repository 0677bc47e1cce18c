//! Domain model: the road network, incident records, request types,
//! and the assembled engine

pub mod engine;
pub mod incident;
pub mod network;
pub mod request;

pub use engine::{RoutingEngine, RoutingStatistics, VariantStatistics};
pub use incident::{IncidentCategory, IncidentRecord};
pub use network::{
    BikeInfrastructure, NetworkBuilder, RoadClass, RoadEdge, RoadNetwork, RoadNode, Surface,
    polyline_length_m,
};
pub use request::{Algorithm, RouteRequest, RouteType, SearchLimits, validate_coordinate};
