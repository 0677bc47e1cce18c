//! JSON API over the routing engine.
//!
//! Endpoints:
//! - `POST /route`: calculate a single route
//! - `POST /route/compare`: one route per requested type
//! - `GET /health`: liveness and initialization status, always 200
//! - `GET /stats`: engine statistics, 503 while degraded
//! - `GET /modes`: the available route types

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::error_handling::HandleErrorLayer;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use geo::Point;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower::limit::ConcurrencyLimitLayer;
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use velovia_core::loading::{EngineConfig, create_routing_engine};
use velovia_core::model::{Algorithm, RouteRequest, RouteType, RoutingEngine, RoutingStatistics};
use velovia_core::routing::{RouteResult, calculate_route, compare_routes};

use crate::config::ServerConfig;
use crate::error::ApiError;

/// State shared across request handlers.
///
/// `engine` is `None` when initialization failed; the server keeps
/// answering `/health` so the failure stays observable.
#[derive(Clone)]
pub struct AppState {
    pub engine: Option<Arc<RoutingEngine>>,
    pub startup_errors: Arc<Vec<String>>,
    pub initialization_seconds: f64,
    pub started: Instant,
}

impl AppState {
    /// Build the engine from configuration, tolerating failure.
    pub fn initialize(config: &EngineConfig) -> Self {
        let started = Instant::now();
        match create_routing_engine(config) {
            Ok(engine) => {
                let state = AppState {
                    engine: Some(Arc::new(engine)),
                    startup_errors: Arc::new(Vec::new()),
                    initialization_seconds: started.elapsed().as_secs_f64(),
                    started,
                };
                info!("engine ready in {:.2} s", state.initialization_seconds);
                state
            }
            Err(engine_error) => {
                let message = format!("engine initialization failed: {engine_error}");
                error!("{message}");
                AppState {
                    engine: None,
                    startup_errors: Arc::new(vec![message]),
                    initialization_seconds: started.elapsed().as_secs_f64(),
                    started,
                }
            }
        }
    }

    fn engine(&self) -> Result<Arc<RoutingEngine>, ApiError> {
        self.engine.clone().ok_or_else(ApiError::not_initialized)
    }
}

/// Assemble the application router with its middleware stack.
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/route", post(route))
        .route("/route/compare", post(compare))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .route("/modes", get(modes))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(HandleErrorLayer::new(middleware_error))
                .layer(ConcurrencyLimitLayer::new(config.max_concurrent_requests))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.request_timeout_secs,
                ))),
        )
        .with_state(state)
}

async fn middleware_error(source: BoxError) -> ApiError {
    if source.is::<tower::timeout::error::Elapsed>() {
        ApiError::new(
            StatusCode::GATEWAY_TIMEOUT,
            "timeout",
            "request exceeded the server processing deadline",
        )
    } else {
        ApiError::internal(source.to_string())
    }
}

/// Route calculation request body.
#[derive(Debug, Deserialize)]
pub struct RouteBody {
    pub start_lat: f64,
    pub start_lon: f64,
    pub end_lat: f64,
    pub end_lon: f64,
    pub route_type: RouteType,
    #[serde(default)]
    pub algorithm: Algorithm,
}

impl RouteBody {
    fn into_request(self) -> RouteRequest {
        RouteRequest {
            start: Point::new(self.start_lon, self.start_lat),
            end: Point::new(self.end_lon, self.end_lat),
            route_type: self.route_type,
            algorithm: self.algorithm,
        }
    }
}

/// Route comparison request body; absent `route_types` means all four.
#[derive(Debug, Deserialize)]
pub struct CompareBody {
    pub start_lat: f64,
    pub start_lon: f64,
    pub end_lat: f64,
    pub end_lon: f64,
    pub route_types: Option<Vec<RouteType>>,
    #[serde(default)]
    pub algorithm: Algorithm,
}

#[derive(Debug, Serialize)]
pub struct SystemInfo {
    pub version: &'static str,
    pub initialization_time_seconds: f64,
    pub uptime_seconds: f64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub initialized: bool,
    pub system_info: SystemInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub graph_stats: Option<RoutingStatistics>,
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ModeInfo {
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ModesResponse {
    pub modes: BTreeMap<RouteType, ModeInfo>,
}

/// POST /route - calculate a single route between two points.
async fn route(
    State(state): State<AppState>,
    Json(body): Json<RouteBody>,
) -> Result<Json<RouteResult>, ApiError> {
    let engine = state.engine()?;
    let request = body.into_request();

    let result = tokio::task::spawn_blocking(move || calculate_route(&engine, &request))
        .await
        .map_err(|join_error| ApiError::internal(join_error.to_string()))??;

    Ok(Json(result))
}

/// POST /route/compare - one entry per requested route type, with
/// per-entry failures instead of a global error.
async fn compare(
    State(state): State<AppState>,
    Json(body): Json<CompareBody>,
) -> Result<Json<BTreeMap<RouteType, RouteResult>>, ApiError> {
    let engine = state.engine()?;
    let start = Point::new(body.start_lon, body.start_lat);
    let end = Point::new(body.end_lon, body.end_lat);
    let requested = body.route_types.unwrap_or_else(|| RouteType::ALL.to_vec());
    let algorithm = body.algorithm;

    let results = tokio::task::spawn_blocking(move || {
        compare_routes(&engine, start, end, &requested, algorithm)
    })
    .await
    .map_err(|join_error| ApiError::internal(join_error.to_string()))?;

    Ok(Json(results))
}

/// GET /health - always 200 so orchestration can read the status.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let initialized = state.engine.is_some();
    let errors = state.startup_errors.as_ref().clone();
    let status = if initialized && errors.is_empty() {
        "healthy"
    } else {
        "unhealthy"
    };

    Json(HealthResponse {
        status,
        initialized,
        system_info: SystemInfo {
            version: env!("CARGO_PKG_VERSION"),
            initialization_time_seconds: state.initialization_seconds,
            uptime_seconds: state.started.elapsed().as_secs_f64(),
        },
        graph_stats: state.engine.as_ref().map(|engine| engine.statistics()),
        errors,
    })
}

/// GET /stats - engine statistics plus runtime information.
async fn stats(State(state): State<AppState>) -> Result<Json<serde_json::Value>, ApiError> {
    let engine = state.engine()?;

    let mut body = serde_json::to_value(engine.statistics())
        .map_err(|serialize_error| ApiError::internal(serialize_error.to_string()))?;
    if let serde_json::Value::Object(map) = &mut body {
        map.insert(
            "initialization_time_seconds".to_string(),
            json!(state.initialization_seconds),
        );
        map.insert("initialized".to_string(), json!(true));
        map.insert(
            "startup_errors".to_string(),
            json!(state.startup_errors.as_slice()),
        );
    }

    Ok(Json(body))
}

/// GET /modes - the route types this deployment can serve.
async fn modes() -> Json<ModesResponse> {
    let modes = RouteType::ALL
        .iter()
        .map(|&route_type| {
            (
                route_type,
                ModeInfo {
                    name: route_type.label(),
                    description: route_type.description(),
                },
            )
        })
        .collect();

    Json(ModesResponse { modes })
}
