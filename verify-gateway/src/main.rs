use std::net::SocketAddr;
use tokio::signal;
use verify_gateway::{
    build_router, config::GatewayConfig, serve, services::build_provider, AppState,
};

use service_core::observability::logging::init_tracing;

#[tokio::main]
async fn main() -> Result<(), service_core::error::AppError> {
    // Missing credentials abort startup
    let config = GatewayConfig::from_env()?;

    init_tracing(
        &config.service_name,
        &config.log_level,
        config.otlp_endpoint.as_deref(),
    )?;

    tracing::info!(
        service = %config.service_name,
        version = %config.service_version,
        "Starting TOTP verify gateway"
    );

    let provider = build_provider(&config.provider);
    let state = AppState::new(config.clone(), provider);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve(listener, app, &config, shutdown_signal()).await?;

    tracing::info!("Service shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
