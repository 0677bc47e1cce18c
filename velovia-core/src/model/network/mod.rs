//! Base road network model

pub mod components;
pub mod network;

pub use components::{BikeInfrastructure, RoadClass, RoadEdge, RoadNode, Surface};
pub use network::{IndexedPoint, NetworkBuilder, RoadNetwork, polyline_length_m};
