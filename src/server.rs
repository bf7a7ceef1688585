//! HTTP API server
//!
//! Routes:
//! - `GET /` - liveness banner
//! - `GET /health` - store and credential status
//! - `GET /weather/{city}` - normalized current weather
//! - `GET /cache/stats` - cached city count and store memory usage
//! - `DELETE /cache/{city}` - drop one city's entry (including a city named
//!   "stats", which shares its path with the stats route)
//! - `DELETE /cache` - drop every weather entry

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::data::WeatherView;
use crate::gateway::{CacheStats, GatewayError, HealthReport, WeatherGateway};

/// Shared handler state
pub type AppState = Arc<WeatherGateway>;

/// Liveness banner returned by `GET /`
#[derive(Debug, Serialize, Deserialize)]
pub struct Banner {
    pub message: String,
    pub version: String,
}

/// Body of `DELETE /cache/{city}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ClearedEntry {
    pub deleted: bool,
}

/// Body of `DELETE /cache`
#[derive(Debug, Serialize, Deserialize)]
pub struct ClearedAll {
    pub deleted: u64,
}

/// Error body carrying a human-readable detail string
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

/// Gateway failure rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(GatewayError);

impl From<GatewayError> for ApiError {
    fn from(err: GatewayError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    /// Only the local empty-payload case is a 404; upstream 404s are 500s
    pub fn status(&self) -> StatusCode {
        match self.0 {
            GatewayError::NotFound => StatusCode::NOT_FOUND,
            GatewayError::Configuration | GatewayError::Upstream(_) | GatewayError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            match &self.0 {
                GatewayError::Upstream(e) => {
                    error!(error = %self.0, upstream_status = ?e.status(), "Request failed")
                }
                _ => error!(error = %self.0, "Request failed"),
            }
        }

        let body = ErrorBody {
            detail: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// CORS policy admitting a single origin with credentials
pub fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

/// Builds the router with all endpoints
pub fn router(gateway: AppState, origin: HeaderValue) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/weather/{city}", get(weather_handler))
        .route(
            "/cache/stats",
            get(cache_stats_handler).delete(clear_stats_city_handler),
        )
        .route("/cache/{city}", delete(clear_cache_handler))
        .route("/cache", delete(clear_all_cache_handler))
        .layer(cors_layer(origin))
        .layer(TraceLayer::new_for_http())
        .with_state(gateway)
}

/// Serves the router until `shutdown` resolves
pub async fn serve(
    addr: SocketAddr,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Weather API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

async fn root_handler() -> Json<Banner> {
    Json(Banner {
        message: "Weather API is running!".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn health_handler(State(gateway): State<AppState>) -> Json<HealthReport> {
    Json(gateway.health_check().await)
}

async fn weather_handler(
    State(gateway): State<AppState>,
    Path(city): Path<String>,
) -> Result<Json<WeatherView>, ApiError> {
    Ok(Json(gateway.get_weather(&city).await?))
}

async fn cache_stats_handler(State(gateway): State<AppState>) -> Json<CacheStats> {
    Json(gateway.cache_stats().await)
}

async fn clear_cache_handler(
    State(gateway): State<AppState>,
    Path(city): Path<String>,
) -> Result<Json<ClearedEntry>, ApiError> {
    let deleted = gateway.clear_cache(&city).await?;
    Ok(Json(ClearedEntry { deleted }))
}

/// `DELETE /cache/stats` lands on the static stats route, so the city is fixed
async fn clear_stats_city_handler(
    State(gateway): State<AppState>,
) -> Result<Json<ClearedEntry>, ApiError> {
    let deleted = gateway.clear_cache("stats").await?;
    Ok(Json(ClearedEntry { deleted }))
}

async fn clear_all_cache_handler(
    State(gateway): State<AppState>,
) -> Result<Json<ClearedAll>, ApiError> {
    let deleted = gateway.clear_all_cache().await?;
    Ok(Json(ClearedAll { deleted }))
}
