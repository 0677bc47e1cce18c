//! This module is responsible for loading source data (road network,
//! incident files) and building a prepared routing engine.

mod builder;
mod config;
mod incidents;
mod network;

pub use builder::create_routing_engine;
pub use config::EngineConfig;
pub use incidents::{IncidentBatch, incidents_from_csv, incidents_from_geojson, load_incidents};
pub use network::{NetworkLoad, load_network, network_from_geojson};
