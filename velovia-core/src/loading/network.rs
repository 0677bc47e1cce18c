//! Road network ingestion from GeoJSON.
//!
//! Each LineString feature becomes a road segment. Endpoints are
//! welded into shared nodes by quantizing their coordinates, so
//! segments that meet at the same position connect without an explicit
//! node file. Node ids follow first-appearance order, which keeps the
//! graph layout identical across loads of the same file.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use geo::{LineString, Point};
use hashbrown::HashMap;
use log::{info, warn};

use crate::model::{
    BikeInfrastructure, NetworkBuilder, RoadClass, RoadEdge, RoadNetwork, Surface,
    polyline_length_m, validate_coordinate,
};
use crate::{Error, NodeId};

/// ~1 cm of longitude at the equator; endpoints closer than this weld
/// into one node
const QUANTIZE_SCALE: f64 = 1e7;

/// Loaded network plus the number of features dropped on the way
#[derive(Debug)]
pub struct NetworkLoad {
    pub network: RoadNetwork,
    pub skipped: usize,
}

/// # Errors
///
/// Fails on an unreadable file or a document that is not a GeoJSON
/// feature collection. Individual degenerate features are skipped.
pub fn load_network(path: &Path) -> Result<NetworkLoad, Error> {
    let mut text = String::new();
    File::open(path)?.read_to_string(&mut text)?;

    let load = network_from_geojson(&text)?;
    info!(
        "loaded road network from {}: {} nodes, {} edges ({} features skipped)",
        path.display(),
        load.network.node_count(),
        load.network.edge_count(),
        load.skipped
    );
    Ok(load)
}

/// # Errors
///
/// Fails when the document does not parse as a GeoJSON feature
/// collection.
pub fn network_from_geojson(text: &str) -> Result<NetworkLoad, Error> {
    let document: geojson::GeoJson = text
        .parse()
        .map_err(|e| Error::InvalidData(format!("network GeoJSON: {e}")))?;

    let geojson::GeoJson::FeatureCollection(collection) = document else {
        return Err(Error::InvalidData(
            "network GeoJSON must be a FeatureCollection".to_string(),
        ));
    };

    let mut builder = NetworkBuilder::new();
    let mut node_keys: HashMap<(i64, i64), NodeId> = HashMap::new();
    let mut skipped = 0usize;

    for feature in &collection.features {
        match parse_segment(feature) {
            Some(segment) => add_segment(&mut builder, &mut node_keys, segment)?,
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!("skipped {skipped} network features without a usable linestring");
    }

    Ok(NetworkLoad {
        network: builder.build(),
        skipped,
    })
}

struct Segment {
    geometry: LineString<f64>,
    class: RoadClass,
    infrastructure: BikeInfrastructure,
    surface: Surface,
    oneway: bool,
    speed_override: Option<f64>,
}

fn parse_segment(feature: &geojson::Feature) -> Option<Segment> {
    let geometry = feature.geometry.as_ref()?;
    let geojson::Value::LineString(positions) = &geometry.value else {
        return None;
    };
    if positions.len() < 2 {
        return None;
    }

    let mut coords = Vec::with_capacity(positions.len());
    for position in positions {
        if position.len() < 2 {
            return None;
        }
        let point = Point::new(position[0], position[1]);
        validate_coordinate(&point).ok()?;
        coords.push((position[0], position[1]));
    }
    let geometry: LineString<f64> = coords.into();

    let text = |key: &str| {
        feature
            .properties
            .as_ref()
            .and_then(|map| map.get(key))
            .and_then(|value| value.as_str())
            .map(str::to_string)
    };

    let class = text("class")
        .or_else(|| text("highway"))
        .map(|label| RoadClass::from_label(&label))
        .unwrap_or(RoadClass::Unclassified);
    let infrastructure = text("bike")
        .or_else(|| text("cycleway"))
        .map(|label| BikeInfrastructure::from_label(&label))
        .unwrap_or(BikeInfrastructure::None);
    let surface = text("surface")
        .map(|label| Surface::from_label(&label))
        .unwrap_or(Surface::Unknown);

    let oneway = feature
        .properties
        .as_ref()
        .and_then(|map| map.get("oneway"))
        .map(|value| match value {
            serde_json::Value::Bool(flag) => *flag,
            serde_json::Value::String(text) => {
                matches!(text.trim(), "yes" | "true" | "1")
            }
            serde_json::Value::Number(number) => number.as_i64() == Some(1),
            _ => false,
        })
        .unwrap_or(false);

    let speed_override = feature
        .properties
        .as_ref()
        .and_then(|map| map.get("speed_mps"))
        .and_then(|value| value.as_f64())
        .filter(|speed| speed.is_finite() && *speed > 0.0);

    Some(Segment {
        geometry,
        class,
        infrastructure,
        surface,
        oneway,
        speed_override,
    })
}

fn add_segment(
    builder: &mut NetworkBuilder,
    node_keys: &mut HashMap<(i64, i64), NodeId>,
    segment: Segment,
) -> Result<(), Error> {
    let first = segment.geometry.0[0];
    let last = segment.geometry.0[segment.geometry.0.len() - 1];

    let source = weld_node(builder, node_keys, first.x, first.y);
    let target = weld_node(builder, node_keys, last.x, last.y);

    let length_m = polyline_length_m(&segment.geometry);
    let forward = RoadEdge {
        geometry: segment.geometry.clone(),
        length_m,
        class: segment.class,
        infrastructure: segment.infrastructure,
        surface: segment.surface,
        speed_override: segment.speed_override,
    };
    builder.add_edge(source, target, forward)?;

    if !segment.oneway {
        let mut reversed = segment.geometry;
        reversed.0.reverse();
        let backward = RoadEdge {
            geometry: reversed,
            length_m,
            class: segment.class,
            infrastructure: segment.infrastructure,
            surface: segment.surface,
            speed_override: segment.speed_override,
        };
        builder.add_edge(target, source, backward)?;
    }

    Ok(())
}

fn weld_node(
    builder: &mut NetworkBuilder,
    node_keys: &mut HashMap<(i64, i64), NodeId>,
    lon: f64,
    lat: f64,
) -> NodeId {
    let key = (
        (lon * QUANTIZE_SCALE).round() as i64,
        (lat * QUANTIZE_SCALE).round() as i64,
    );
    match node_keys.get(&key) {
        Some(id) => *id,
        None => {
            let id = node_keys.len() as NodeId;
            node_keys.insert(key, id);
            builder.add_node(id, Point::new(lon, lat));
            id
        }
    }
}
