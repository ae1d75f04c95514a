//! Sheetmap API Server implementation
//!
//! HTTP REST API server using Axum. Exposes export (records → .xlsx download)
//! and import (upload or remote URL → records) over the schemas loaded at
//! startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;
use crate::schema::SchemaRegistry;

/// API Server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// Directory of YAML schema documents loaded at startup
    pub schema_dir: PathBuf,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            schema_dir: PathBuf::from("schemas"),
        }
    }
}

/// Shared application state
#[derive(Debug, Clone)]
pub struct AppState {
    pub version: String,
    pub schemas: Arc<SchemaRegistry>,
}

impl AppState {
    pub fn new(schemas: SchemaRegistry) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            schemas: Arc::new(schemas),
        }
    }
}

/// Routes, state and middleware
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health and info endpoints
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        // Core API endpoints
        .route("/api/v1/schemas", get(handlers::schemas))
        .route("/api/v1/export", post(handlers::export))
        .route("/api/v1/import", post(handlers::import_upload))
        .route("/api/v1/import/url", post(handlers::import_url))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Run the API server
pub async fn run_api_server(config: ApiConfig) -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "royalbit_sheetmap=info,sheetmap_server=info,tower_http=info".into()),
        )
        .init();

    let registry = SchemaRegistry::load_dir(&config.schema_dir)?;
    info!(
        "Loaded {} schemas from {}: {:?}",
        registry.len(),
        config.schema_dir.display(),
        registry.names()
    );

    let app = router(Arc::new(AppState::new(registry)));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Sheetmap API Server starting on http://{}", addr);
    info!("   Endpoints: /api/v1/export, /api/v1/import, /api/v1/import/url, /api/v1/schemas");
    info!("   Health: /health, Version: /version");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Sheetmap API Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
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

    info!("Shutdown signal received, stopping server...");
}
