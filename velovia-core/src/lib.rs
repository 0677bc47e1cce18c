//! Core routing engine for safety-aware pedestrian and bicycle
//! routing.
//!
//! The engine is prepared once from a road network and an incident
//! history: incidents are aggregated into a spatial risk index, weight
//! coefficients are calibrated against the network, and four weighted
//! graph variants are derived from one shared topology. Preparation is
//! the only mutable phase; everything afterwards is read-only, so
//! routes can be calculated concurrently without locks.

pub mod calibration;
pub mod error;
pub mod graphs;
pub mod infrastructure;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod risk;
pub mod routing;

pub use error::Error;

/// Stable identifier of a road network node, fixed by the source data
pub type NodeId = i64;
