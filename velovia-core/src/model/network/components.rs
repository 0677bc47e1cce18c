//! Road network components - nodes, edges, and their tag vocabularies

use geo::{LineString, Point};
use serde::{Deserialize, Serialize};

use crate::NodeId;

/// Road graph node
#[derive(Debug, Clone)]
pub struct RoadNode {
    /// Stable identifier from the source network
    pub id: NodeId,
    /// Node coordinates (x = longitude, y = latitude)
    pub geometry: Point<f64>,
}

/// Road graph edge (street segment), directed source to target.
/// Undirected streets are stored as two opposing edges.
#[derive(Debug, Clone)]
pub struct RoadEdge {
    /// Polyline oriented from the source node to the target node
    pub geometry: LineString<f64>,
    /// Geometric length in meters
    pub length_m: f64,
    pub class: RoadClass,
    pub infrastructure: BikeInfrastructure,
    pub surface: Surface,
    /// Per-edge speed in m/s, overriding the class default when present
    pub speed_override: Option<f64>,
}

/// Functional class of a street segment
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RoadClass {
    Primary,
    Secondary,
    Tertiary,
    Residential,
    Service,
    Cycleway,
    Footway,
    Path,
    Unclassified,
}

impl RoadClass {
    pub const ALL: [RoadClass; 9] = [
        RoadClass::Primary,
        RoadClass::Secondary,
        RoadClass::Tertiary,
        RoadClass::Residential,
        RoadClass::Service,
        RoadClass::Cycleway,
        RoadClass::Footway,
        RoadClass::Path,
        RoadClass::Unclassified,
    ];

    /// Base traversal speed in m/s for a cyclist on this class of street
    pub fn default_speed_mps(self) -> f64 {
        match self {
            RoadClass::Primary => 6.5,
            RoadClass::Secondary => 6.0,
            RoadClass::Tertiary => 5.5,
            RoadClass::Residential => 5.0,
            RoadClass::Service => 4.5,
            RoadClass::Cycleway => 5.5,
            RoadClass::Footway => 2.5,
            RoadClass::Path => 3.0,
            RoadClass::Unclassified => 4.5,
        }
    }

    /// Map a raw network tag onto a road class, defaulting to `Unclassified`
    pub fn from_label(raw: &str) -> Self {
        let label = raw.trim().to_ascii_lowercase();
        match label.as_str() {
            "primary" | "primary_link" | "trunk" | "trunk_link" => RoadClass::Primary,
            "secondary" | "secondary_link" => RoadClass::Secondary,
            "tertiary" | "tertiary_link" => RoadClass::Tertiary,
            "residential" | "living_street" => RoadClass::Residential,
            "service" | "track" => RoadClass::Service,
            "cycleway" => RoadClass::Cycleway,
            "footway" | "pedestrian" | "steps" => RoadClass::Footway,
            "path" | "bridleway" => RoadClass::Path,
            _ => RoadClass::Unclassified,
        }
    }
}

/// Kind of bicycle infrastructure present on an edge
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BikeInfrastructure {
    /// Physically separated cycle track
    SeparatedTrack,
    /// Painted on-street bike lane
    PaintedLane,
    /// Shared pedestrian/bike path
    SharedPath,
    /// Sharrow or advisory lane on the roadway
    SharedLane,
    None,
}

impl BikeInfrastructure {
    pub fn from_label(raw: &str) -> Self {
        let label = raw.trim().to_ascii_lowercase();
        match label.as_str() {
            "track" | "separated" | "separated_track" | "cycleway" => {
                BikeInfrastructure::SeparatedTrack
            }
            "lane" | "painted_lane" => BikeInfrastructure::PaintedLane,
            "shared_path" | "path" | "shared_use" => BikeInfrastructure::SharedPath,
            "shared_lane" | "sharrow" | "shared" => BikeInfrastructure::SharedLane,
            _ => BikeInfrastructure::None,
        }
    }
}

/// Surface quality of an edge
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    Paved,
    Gravel,
    Dirt,
    Unknown,
}

impl Surface {
    pub fn from_label(raw: &str) -> Self {
        let label = raw.trim().to_ascii_lowercase();
        match label.as_str() {
            "paved" | "asphalt" | "concrete" | "paving_stones" => Surface::Paved,
            "gravel" | "fine_gravel" | "compacted" => Surface::Gravel,
            "dirt" | "ground" | "earth" | "grass" | "unpaved" | "sand" => Surface::Dirt,
            _ => Surface::Unknown,
        }
    }
}
