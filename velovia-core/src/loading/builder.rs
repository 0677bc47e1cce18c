use geo::{ConvexHull, Intersects, MultiPoint};
use log::info;

use super::config::EngineConfig;
use super::incidents::load_incidents;
use super::network::load_network;
use crate::model::{IncidentRecord, RoadNetwork, RoutingEngine};
use crate::Error;

/// Creates a routing engine based on the provided configuration
///
/// # Errors
///
/// Returns an error if there are problems reading or processing data,
/// or if no usable graph variant can be built from it
pub fn create_routing_engine(config: &EngineConfig) -> Result<RoutingEngine, Error> {
    validate_config(config)?;

    info!(
        "processing road network: {}",
        config.network_path.display()
    );

    // Parse the network in a separate thread while incidents load
    let network_path = config.network_path.clone();
    let network_handle = std::thread::spawn(move || load_network(&network_path));

    info!(
        "processing incident data ({} files)",
        config.incident_paths.len()
    );
    let incidents = load_incidents(&config.incident_paths)?;

    let network = network_handle
        .join()
        .map_err(|_| Error::UnrecoverableError("network loading thread panicked"))??
        .network;

    validate_incident_overlap(&network, &incidents.records);

    let engine = RoutingEngine::assemble(
        network,
        &incidents.records,
        &config.calibration,
        config.limits,
    )?;

    info!("routing engine created successfully");
    // Parsing the network document and the incident files allocates
    // heavily, and glibc does not always hand freed memory back to the
    // system. Release the free tail of the heap before serving.
    //
    // # Safety
    //
    // This call is safe to use on linux with glibc implementation
    // which is checked by the cfg attribute in compile time.
    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    unsafe {
        if libc::malloc_trim(0) == 0 {
            log::warn!("Memory trimming failed - continuing anyway");
        } else {
            log::debug!("Successfully trimmed unused heap memory");
        }
    }
    Ok(engine)
}

fn validate_config(config: &EngineConfig) -> Result<(), Error> {
    if !config.network_path.exists() {
        return Err(Error::InvalidData(format!(
            "network file not found: {}",
            config.network_path.display()
        )));
    }

    if config.incident_paths.is_empty() {
        return Err(Error::InvalidData(
            "No incident files provided in the configuration".to_string(),
        ));
    }

    for path in &config.incident_paths {
        if !path.exists() {
            return Err(Error::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("incident file not found: {}", path.display()),
            )));
        }
    }

    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn validate_incident_overlap(network: &RoadNetwork, incidents: &[IncidentRecord]) {
    if incidents.is_empty() || network.node_count() < 3 {
        return;
    }

    let graph_nodes: MultiPoint = network
        .graph
        .node_weights()
        .map(|node| node.geometry)
        .collect();
    let graph_hull = graph_nodes.convex_hull();

    let outside_hull = incidents
        .iter()
        .filter(|incident| !incident.location.intersects(&graph_hull))
        .count();

    let total = incidents.len();
    let percentage = (outside_hull as f64 / total as f64) * 100.0;
    if outside_hull > 0 {
        log::warn!(
            "{outside_hull} of {total} incidents ({percentage:.1}%) fall outside the road \
        network coverage area. They will not contribute to any edge's risk signal. \
        Consider using a larger network extract that covers the incident data."
        );
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("velovia-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_network_file_is_rejected() {
        let config = EngineConfig {
            network_path: PathBuf::from("/nonexistent/network.geojson"),
            incident_paths: vec![],
            ..EngineConfig::default()
        };
        assert!(matches!(
            create_routing_engine(&config),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn empty_incident_list_is_rejected() {
        let network_path = temp_file("net.geojson", r#"{"type":"FeatureCollection","features":[]}"#);
        let config = EngineConfig {
            network_path,
            incident_paths: vec![],
            ..EngineConfig::default()
        };
        assert!(matches!(
            create_routing_engine(&config),
            Err(Error::InvalidData(_))
        ));
    }

    #[test]
    fn missing_incident_file_is_an_io_error() {
        let network_path = temp_file("net2.geojson", r#"{"type":"FeatureCollection","features":[]}"#);
        let config = EngineConfig {
            network_path,
            incident_paths: vec![PathBuf::from("/nonexistent/incidents.csv")],
            ..EngineConfig::default()
        };
        assert!(matches!(
            create_routing_engine(&config),
            Err(Error::IoError(_))
        ));
    }
}
