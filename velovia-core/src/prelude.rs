// Re-export key components
pub use crate::loading::{EngineConfig, create_routing_engine};
pub use crate::model::{
    Algorithm, RouteRequest, RouteType, RoutingEngine, RoutingStatistics, SearchLimits,
};
pub use crate::routing::{RouteResult, calculate_route, compare_routes};

// Core identifier types
pub use crate::Error;
pub use crate::NodeId;
