pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;

use service_core::axum::{
    http::{header, HeaderName, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post},
    Json, Router,
};
use service_core::middleware::request_id_middleware;
use tracing::Instrument;
use service_core::observability::{extract_request_id, extract_traceparent, REQUEST_ID_HEADER};
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::services::VerifyProvider;

#[derive(Clone)]
pub struct AppState {
    pub config: GatewayConfig,
    pub provider: Arc<dyn VerifyProvider>,
}

impl AppState {
    pub fn new(config: GatewayConfig, provider: Arc<dyn VerifyProvider>) -> Self {
        Self { config, provider }
    }
}

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/api/create-factor", post(handlers::create_factor))
        .route("/api/verify-factor", post(handlers::verify_factor))
        .route("/api/challenge", post(handlers::challenge));

    Router::new()
        .route("/health", get(health_check))
        .merge(api_routes)
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id =
                    extract_request_id(request.headers()).unwrap_or_else(|| "-".to_string());
                let traceparent =
                    extract_traceparent(request.headers()).unwrap_or_else(|| "-".to_string());

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    traceparent = %traceparent,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(cors_layer(&state.config.security.allowed_origins))
}

/// Serve `app` until `shutdown` resolves. Everything logged while serving,
/// including the shutdown itself, sits under one `service` span.
pub async fn serve<F>(
    listener: TcpListener,
    app: Router,
    config: &GatewayConfig,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let service_span = tracing::info_span!(
        "service",
        service = %config.service_name,
        version = %config.service_version,
    );

    let addr = listener.local_addr()?;
    service_span.in_scope(|| tracing::info!(address = %addr, "TOTP verify gateway listening"));

    service_core::axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .into_future()
        .instrument(service_span)
        .await
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(allowed_origins.iter().filter_map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|e| tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e))
                .ok()
        }))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

/// Service health check
pub async fn health_check(
    service_core::axum::extract::State(state): service_core::axum::extract::State<AppState>,
) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
    }))
}
