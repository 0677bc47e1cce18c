//! The assembled routing engine.
//!
//! Everything in here is built once at startup and never mutated
//! afterwards, so an `Arc<RoutingEngine>` can be shared across request
//! handlers without synchronization.

use std::collections::BTreeMap;

use log::info;
use serde::Serialize;

use crate::Error;
use crate::calibration::{CalibrationConfig, CalibrationProfile, CalibrationSummary, calibrate};
use crate::graphs::{CostStats, VariantValidation, WeightedGraphs};
use crate::infrastructure::{InfrastructureSummary, summarize};
use crate::model::network::RoadNetwork;
use crate::model::request::{RouteType, SearchLimits};
use crate::model::IncidentRecord;
use crate::risk::RiskIndex;

/// Immutable routing state: the base network, the risk index, the
/// calibration profile, and the four weighted variants derived from
/// them
pub struct RoutingEngine {
    pub network: RoadNetwork,
    pub graphs: WeightedGraphs,
    pub profile: CalibrationProfile,
    pub risk: RiskIndex,
    pub infrastructure: InfrastructureSummary,
    pub limits: SearchLimits,
}

impl RoutingEngine {
    /// Run the full preparation pipeline: risk index, calibration,
    /// then the weighted variants.
    ///
    /// # Errors
    ///
    /// Propagates calibration failures and fails with
    /// `NoUsableVariant` when every variant flunks validation.
    pub fn assemble(
        network: RoadNetwork,
        incidents: &[IncidentRecord],
        config: &CalibrationConfig,
        limits: SearchLimits,
    ) -> Result<Self, Error> {
        let risk = RiskIndex::build(incidents, config.risk_resolution)?;
        let profile = calibrate(&network, incidents, &risk, config)?;
        let graphs = WeightedGraphs::build(&network, &profile, &risk);

        if !graphs.any_usable() {
            return Err(Error::NoUsableVariant);
        }

        let infrastructure = summarize(&network);

        info!(
            "engine ready: {} nodes, {} edges, {}/{} variants usable",
            network.node_count(),
            network.edge_count(),
            graphs.usable_count(),
            graphs.variants.len()
        );

        Ok(Self {
            network,
            graphs,
            profile,
            risk,
            infrastructure,
            limits,
        })
    }

    /// Snapshot of the engine's build-time figures. Pure assembly of
    /// recorded data, no recomputation.
    pub fn statistics(&self) -> RoutingStatistics {
        let variants = self
            .graphs
            .variants
            .iter()
            .map(|(route_type, variant)| {
                (
                    *route_type,
                    VariantStatistics {
                        validation: variant.validation,
                        cost_stats: variant.cost_stats,
                        min_cost_per_meter: variant.min_cost_per_meter,
                    },
                )
            })
            .collect();

        RoutingStatistics {
            node_count: self.network.node_count(),
            edge_count: self.network.edge_count(),
            risk_coefficient: self.profile.risk_coefficient,
            infrastructure_coefficient: self.profile.infrastructure_coefficient,
            variants,
            calibration: self.profile.summary.clone(),
            infrastructure: self.infrastructure.clone(),
            limits: self.limits,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct VariantStatistics {
    pub validation: VariantValidation,
    pub cost_stats: CostStats,
    pub min_cost_per_meter: f64,
}

/// Read-only introspection view over a prepared engine
#[derive(Debug, Clone, Serialize)]
pub struct RoutingStatistics {
    pub node_count: usize,
    pub edge_count: usize,
    pub risk_coefficient: f64,
    pub infrastructure_coefficient: f64,
    pub variants: BTreeMap<RouteType, VariantStatistics>,
    pub calibration: CalibrationSummary,
    pub infrastructure: InfrastructureSummary,
    pub limits: SearchLimits,
}
