//! Infrastructure model: per-edge bike infrastructure quality in [0,1]

use serde::Serialize;

use crate::model::{BikeInfrastructure, RoadEdge, RoadNetwork, Surface};

/// Edges at or above this quality count toward bike coverage
pub const QUALIFYING_QUALITY: f64 = 0.5;

/// Quality score for an edge: the infrastructure kind sets the base
/// score, the surface dampens it.
pub fn edge_quality(edge: &RoadEdge) -> f64 {
    (infrastructure_score(edge.infrastructure) * surface_factor(edge.surface)).clamp(0.0, 1.0)
}

/// Whether the edge counts toward the bike-coverage share of a route
pub fn is_qualifying(edge: &RoadEdge) -> bool {
    edge_quality(edge) >= QUALIFYING_QUALITY
}

fn infrastructure_score(infrastructure: BikeInfrastructure) -> f64 {
    match infrastructure {
        BikeInfrastructure::SeparatedTrack => 1.0,
        BikeInfrastructure::PaintedLane => 0.75,
        BikeInfrastructure::SharedPath => 0.5,
        BikeInfrastructure::SharedLane => 0.25,
        BikeInfrastructure::None => 0.0,
    }
}

fn surface_factor(surface: Surface) -> f64 {
    match surface {
        Surface::Paved | Surface::Unknown => 1.0,
        Surface::Gravel => 0.8,
        Surface::Dirt => 0.6,
    }
}

/// Network-wide infrastructure totals for diagnostics
#[derive(Debug, Clone, Default, Serialize)]
pub struct InfrastructureSummary {
    pub total_edges: usize,
    /// Edges with any bike infrastructure at all
    pub covered_edges: usize,
    /// Edges meeting the qualifying quality threshold
    pub qualifying_edges: usize,
    pub coverage_percent: f64,
    pub mean_quality: f64,
}

pub fn summarize(network: &RoadNetwork) -> InfrastructureSummary {
    let total_edges = network.edge_count();
    if total_edges == 0 {
        return InfrastructureSummary::default();
    }

    let mut covered_edges = 0usize;
    let mut qualifying_edges = 0usize;
    let mut quality_sum = 0.0;

    for edge in network.graph.edge_weights() {
        let quality = edge_quality(edge);
        quality_sum += quality;
        if quality > 0.0 {
            covered_edges += 1;
        }
        if quality >= QUALIFYING_QUALITY {
            qualifying_edges += 1;
        }
    }

    InfrastructureSummary {
        total_edges,
        covered_edges,
        qualifying_edges,
        coverage_percent: covered_edges as f64 / total_edges as f64 * 100.0,
        mean_quality: quality_sum / total_edges as f64,
    }
}
