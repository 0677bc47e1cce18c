//! Weight calibration: derives the scalar coefficients that put the
//! risk and infrastructure terms on a scale comparable to the base
//! travel-time cost.
//!
//! Both signals are normalized to [0,1] per edge before calibration.
//! A coefficient is then chosen as `emphasis / population mean`, which
//! makes the graph-wide average magnitude of each term equal its
//! configured emphasis, bounded by a hard cap. Deterministic for
//! identical inputs.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use itertools::Itertools;
use log::{info, warn};
use petgraph::graph::EdgeIndex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::infrastructure::edge_quality;
use crate::model::{IncidentRecord, RoadClass, RoadEdge, RoadNetwork};
use crate::risk::{DEFAULT_RISK_RESOLUTION, RiskIndex};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CalibrationError {
    #[error("no incident records available for calibration")]
    NoIncidents,
    #[error("road network has no edges to calibrate against")]
    NoEdges,
    #[error("no edge matched either the risk or the infrastructure signal")]
    NoSignalOverlap,
}

/// Calibration tuning knobs with conservative defaults
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Target graph-wide mean of `risk_coefficient * risk`
    #[serde(default = "default_risk_emphasis")]
    pub risk_emphasis: f64,
    /// Target graph-wide mean of `infrastructure_coefficient * quality`
    #[serde(default = "default_infrastructure_emphasis")]
    pub infrastructure_emphasis: f64,
    #[serde(default = "default_max_risk_coefficient")]
    pub max_risk_coefficient: f64,
    /// Capped below 1.0 so the infrastructure bonus can never zero out
    /// an edge cost
    #[serde(default = "default_max_infrastructure_coefficient")]
    pub max_infrastructure_coefficient: f64,
    /// H3 resolution of the risk index cells
    #[serde(default = "default_risk_resolution")]
    pub risk_resolution: u8,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            risk_emphasis: default_risk_emphasis(),
            infrastructure_emphasis: default_infrastructure_emphasis(),
            max_risk_coefficient: default_max_risk_coefficient(),
            max_infrastructure_coefficient: default_max_infrastructure_coefficient(),
            risk_resolution: default_risk_resolution(),
        }
    }
}

fn default_risk_emphasis() -> f64 {
    0.5
}

fn default_infrastructure_emphasis() -> f64 {
    0.25
}

fn default_max_risk_coefficient() -> f64 {
    3.0
}

fn default_max_infrastructure_coefficient() -> f64 {
    0.9
}

fn default_risk_resolution() -> u8 {
    DEFAULT_RISK_RESOLUTION
}

/// Fixed coefficient set produced by one calibration run.
/// Immutable thereafter and shared read-only by the graph builder.
#[derive(Debug, Clone, Serialize)]
pub struct CalibrationProfile {
    pub risk_coefficient: f64,
    pub infrastructure_coefficient: f64,
    /// Base traversal speed per road class in m/s
    pub base_speeds: BTreeMap<RoadClass, f64>,
    pub summary: CalibrationSummary,
}

impl CalibrationProfile {
    /// Real-world traversal speed for an edge in m/s
    pub fn effective_speed(&self, edge: &RoadEdge) -> f64 {
        match edge.speed_override {
            Some(speed) if speed > 0.0 && speed.is_finite() => speed,
            _ => self
                .base_speeds
                .get(&edge.class)
                .copied()
                .unwrap_or_else(|| edge.class.default_speed_mps()),
        }
    }

    /// Profile with the given coefficients and default speeds, for
    /// callers assembling an engine without source data.
    pub fn with_coefficients(risk_coefficient: f64, infrastructure_coefficient: f64) -> Self {
        Self {
            risk_coefficient,
            infrastructure_coefficient,
            base_speeds: default_base_speeds(),
            summary: CalibrationSummary::default(),
        }
    }
}

/// Provenance statistics recorded during calibration. Read-only
/// observability data, never fed back into routing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CalibrationSummary {
    pub incident_count: usize,
    pub category_counts: BTreeMap<String, usize>,
    pub first_incident: Option<NaiveDateTime>,
    pub last_incident: Option<NaiveDateTime>,
    pub edge_count: usize,
    pub risk_matched_edges: usize,
    pub risk_coverage_percent: f64,
    pub infrastructure_matched_edges: usize,
    pub infrastructure_coverage_percent: f64,
    pub mean_edge_risk: f64,
    pub mean_edge_quality: f64,
    pub risk_cell_count: usize,
    pub risk_scale: f64,
}

fn default_base_speeds() -> BTreeMap<RoadClass, f64> {
    RoadClass::ALL
        .iter()
        .map(|class| (*class, class.default_speed_mps()))
        .collect()
}

/// Derive a calibration profile from the base network, the incident
/// population, and the risk index built from it.
///
/// # Errors
///
/// Fails when either input collection is empty, or when no edge
/// matches the risk signal and none carries bike infrastructure.
pub fn calibrate(
    network: &RoadNetwork,
    incidents: &[IncidentRecord],
    risk: &RiskIndex,
    config: &CalibrationConfig,
) -> Result<CalibrationProfile, CalibrationError> {
    if incidents.is_empty() {
        return Err(CalibrationError::NoIncidents);
    }

    let edge_count = network.edge_count();
    if edge_count == 0 {
        return Err(CalibrationError::NoEdges);
    }

    // Per-edge signal populations; parallel map, sequential reduction
    // to keep float accumulation deterministic.
    let signals: Vec<(f64, f64)> = (0..edge_count)
        .into_par_iter()
        .map(|index| {
            let edge = &network.graph[EdgeIndex::new(index)];
            (risk.edge_risk(&edge.geometry), edge_quality(edge))
        })
        .collect();

    let mut risk_sum = 0.0;
    let mut quality_sum = 0.0;
    let mut risk_matched = 0usize;
    let mut quality_matched = 0usize;
    for (edge_risk, quality) in &signals {
        risk_sum += edge_risk;
        quality_sum += quality;
        if *edge_risk > 0.0 {
            risk_matched += 1;
        }
        if *quality > 0.0 {
            quality_matched += 1;
        }
    }

    let mean_risk = risk_sum / edge_count as f64;
    let mean_quality = quality_sum / edge_count as f64;

    if risk_matched == 0 && quality_matched == 0 {
        return Err(CalibrationError::NoSignalOverlap);
    }

    let risk_coefficient = if mean_risk > 0.0 {
        (config.risk_emphasis / mean_risk).clamp(0.0, config.max_risk_coefficient)
    } else {
        warn!("incident data matched no edges; the safe variants will mirror fastest");
        0.0
    };

    let infrastructure_coefficient = if mean_quality > 0.0 {
        (config.infrastructure_emphasis / mean_quality)
            .clamp(0.0, config.max_infrastructure_coefficient)
    } else {
        warn!("network carries no bike infrastructure; the bike variants will mirror fastest");
        0.0
    };

    let (first_incident, last_incident) = incidents
        .iter()
        .filter_map(|incident| incident.occurred_at)
        .minmax()
        .into_option()
        .map_or((None, None), |(first, last)| (Some(first), Some(last)));

    let category_counts: BTreeMap<String, usize> = incidents
        .iter()
        .counts_by(|incident| incident.category.as_str())
        .into_iter()
        .map(|(category, count)| (category.to_string(), count))
        .collect();

    let summary = CalibrationSummary {
        incident_count: incidents.len(),
        category_counts,
        first_incident,
        last_incident,
        edge_count,
        risk_matched_edges: risk_matched,
        risk_coverage_percent: risk_matched as f64 / edge_count as f64 * 100.0,
        infrastructure_matched_edges: quality_matched,
        infrastructure_coverage_percent: quality_matched as f64 / edge_count as f64 * 100.0,
        mean_edge_risk: mean_risk,
        mean_edge_quality: mean_quality,
        risk_cell_count: risk.cell_count(),
        risk_scale: risk.scale(),
    };

    info!(
        "calibrated coefficients: risk {risk_coefficient:.3} (coverage {:.1}%), \
         infrastructure {infrastructure_coefficient:.3} (coverage {:.1}%)",
        summary.risk_coverage_percent, summary.infrastructure_coverage_percent
    );

    Ok(CalibrationProfile {
        risk_coefficient,
        infrastructure_coefficient,
        base_speeds: default_base_speeds(),
        summary,
    })
}
