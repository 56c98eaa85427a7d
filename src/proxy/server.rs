use axum::extract::DefaultBodyLimit;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::CorsLayer;

use super::routes::{enhance_handler, health_check};
use super::{ProxyState, SharedState};
use crate::api::client::ENHANCE_PATH;
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

pub fn router(state: SharedState) -> AppResult<Router> {
    let origin = state
        .config
        .allowed_origin
        .parse::<HeaderValue>()
        .map_err(|e| AppError::Config(format!("Invalid allowed_origin: {}", e)))?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let max_upload = state.config.max_upload_bytes;

    Ok(Router::new()
        .route(ENHANCE_PATH, post(enhance_handler))
        .route("/health", get(health_check))
        .layer(DefaultBodyLimit::max(max_upload))
        .layer(cors)
        .with_state(state))
}

/// Serves on an already bound listener until Ctrl+C or SIGTERM.
pub async fn serve(listener: TcpListener, state: SharedState) -> AppResult<()> {
    let app = router(state)?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub async fn start_server(config: AppConfig) -> AppResult<()> {
    let address = format!("{}:{}", config.bind_address, config.port);
    let state = Arc::new(ProxyState::new(config)?);

    log::info!("Binding to {}", address);
    let listener = TcpListener::bind(&address).await?;
    log::info!(
        "Proxy running on {}, backend {}",
        address,
        state.backend_url()
    );

    serve(listener, state).await?;
    log::info!("Proxy shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => log::info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                log::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                log::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                log::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
