use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationConfig;
use crate::model::SearchLimits;

/// Configuration for building a routing engine from source data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// GeoJSON file with the road network as LineString features
    pub network_path: PathBuf,
    /// Incident files, CSV or GeoJSON, merged in order
    pub incident_paths: Vec<PathBuf>,
    #[serde(default)]
    pub calibration: CalibrationConfig,
    #[serde(default)]
    pub limits: SearchLimits,
}
