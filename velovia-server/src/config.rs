//! Server configuration loaded from a TOML file.

use std::net::SocketAddr;
use std::path::Path;

use serde::Deserialize;
use velovia_core::loading::EngineConfig;

/// Top-level configuration for the routing service.
///
/// The `[engine]` table is handed to the core loader unchanged; the
/// remaining fields belong to the HTTP layer.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    /// Wall-clock limit per request, enforced by the middleware stack.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Upper bound on requests processed concurrently.
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    /// Engine data sources and search limits.
    pub engine: EngineConfig,
}

impl ServerConfig {
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let text = std::fs::read_to_string(path)
            .map_err(|error| format!("cannot read {}: {error}", path.display()))?;
        let config = toml::from_str(&text)
            .map_err(|error| format!("cannot parse {}: {error}", path.display()))?;
        Ok(config)
    }
}

pub fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8000))
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_max_concurrent_requests() -> usize {
    64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_file_fills_in_the_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            [engine]
            network_path = "data/network.geojson"
            incident_paths = ["data/incidents.csv"]
            "#,
        )
        .unwrap();

        assert_eq!(config.listen, default_listen());
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.max_concurrent_requests, 64);
        assert_eq!(config.engine.limits.snap_radius_m, 2000.0);
    }

    #[test]
    fn overrides_are_honored() {
        let config: ServerConfig = toml::from_str(
            r#"
            listen = "127.0.0.1:9100"
            request_timeout_secs = 5

            [engine]
            network_path = "net.geojson"
            incident_paths = ["a.csv", "b.geojson"]

            [engine.limits]
            snap_radius_m = 500.0
            search_budget_ms = 1000
            "#,
        )
        .unwrap();

        assert_eq!(config.listen.port(), 9100);
        assert_eq!(config.request_timeout_secs, 5);
        assert_eq!(config.engine.incident_paths.len(), 2);
        assert_eq!(config.engine.limits.search_budget_ms, 1000);
    }
}
