//! Spatial risk model: severity-weighted incident density per H3 cell.
//!
//! Incidents are bucketed into hexagonal grid cells and their severity
//! weights summed per cell. Densities are normalized against the 95th
//! percentile of the occupied-cell population, so a handful of extreme
//! cells cannot flatten the signal for the rest of the coverage area.

use geo::{LineString, Point};
use h3o::{CellIndex, LatLng, Resolution};
use hashbrown::HashMap;
use log::warn;

use crate::Error;
use crate::model::IncidentRecord;

/// Default H3 resolution for risk cells, roughly 0.1 km^2 hexagons
pub const DEFAULT_RISK_RESOLUTION: u8 = 9;

const NORMALIZATION_PERCENTILE: f64 = 0.95;

/// Immutable severity-density index over H3 cells
#[derive(Debug, Clone)]
pub struct RiskIndex {
    cells: HashMap<CellIndex, f64>,
    /// Density corresponding to a normalized risk of 1.0
    scale: f64,
    resolution: Resolution,
    skipped: usize,
}

impl RiskIndex {
    /// Bucket incidents into cells and fix the normalization scale.
    ///
    /// Incidents whose coordinates H3 rejects are skipped and counted.
    /// Deterministic for identical input, regardless of record order.
    ///
    /// # Errors
    ///
    /// Fails with `InvalidData` on an invalid H3 resolution.
    pub fn build(incidents: &[IncidentRecord], resolution: u8) -> Result<Self, Error> {
        let resolution = Resolution::try_from(resolution)
            .map_err(|e| Error::InvalidData(format!("got invalid H3 resolution: {e}")))?;

        let mut cells: HashMap<CellIndex, f64> = HashMap::new();
        let mut skipped = 0usize;

        for incident in incidents {
            match LatLng::new(incident.location.y(), incident.location.x()) {
                Ok(lat_lng) => {
                    *cells.entry(lat_lng.to_cell(resolution)).or_insert(0.0) += incident.severity;
                }
                Err(_) => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!("skipped {skipped} incidents with coordinates outside the H3 domain");
        }

        let scale = percentile_density(&cells);

        Ok(Self {
            cells,
            scale,
            resolution,
            skipped,
        })
    }

    /// Normalized risk in [0,1] for the cell containing `point`.
    /// Zero for unoccupied cells, coordinates H3 rejects, or an index
    /// built without incidents.
    pub fn normalized_at(&self, point: &Point<f64>) -> f64 {
        if self.scale <= 0.0 {
            return 0.0;
        }

        let Ok(lat_lng) = LatLng::new(point.y(), point.x()) else {
            return 0.0;
        };

        match self.cells.get(&lat_lng.to_cell(self.resolution)) {
            Some(density) => (density / self.scale).clamp(0.0, 1.0),
            None => 0.0,
        }
    }

    /// Mean normalized risk over the polyline vertices, so long edges
    /// sample every cell they pass through rather than one endpoint.
    pub fn edge_risk(&self, geometry: &LineString<f64>) -> f64 {
        let coords = &geometry.0;
        if coords.is_empty() || self.scale <= 0.0 {
            return 0.0;
        }

        let total: f64 = coords
            .iter()
            .map(|coord| self.normalized_at(&Point::new(coord.x, coord.y)))
            .sum();

        total / coords.len() as f64
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn resolution(&self) -> u8 {
        self.resolution.into()
    }

    pub fn skipped_incidents(&self) -> usize {
        self.skipped
    }
}

/// Percentile-clipped normalization scale over occupied cells
fn percentile_density(cells: &HashMap<CellIndex, f64>) -> f64 {
    if cells.is_empty() {
        return 0.0;
    }

    let mut densities: Vec<f64> = cells.values().copied().collect();
    densities.sort_unstable_by(f64::total_cmp);

    let rank = ((densities.len() - 1) as f64 * NORMALIZATION_PERCENTILE).ceil() as usize;
    densities[rank]
}
