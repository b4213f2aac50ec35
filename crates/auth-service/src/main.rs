//! Auth service entry point.

use auth_service::config::{Config, LogFormat};
use auth_service::credentials::{CredentialStore, InMemoryCredentialStore};
use auth_service::observability::metrics::init_metrics_recorder;
use auth_service::routes::{self, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Log format is needed before the full config can be reported on
    let log_format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|v| v.parse::<LogFormat>().ok())
        .unwrap_or_default();

    let (text_layer, json_layer) = match log_format {
        LogFormat::Text => (Some(tracing_subscriber::fmt::layer()), None),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_service=debug,auth_server=debug,tower_http=debug".into()),
        )
        .with(text_layer)
        .with(json_layer)
        .init();

    info!("Starting auth service");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!(target: "auth.config", "Failed to load configuration: {}", e);
        e
    })?;

    info!(
        target: "auth.config",
        bind_address = %config.bind_address,
        jwt_algorithm = %config.jwt_algorithm,
        token_ttl_seconds = config.token_ttl_seconds,
        jwt_clock_skew_seconds = config.jwt_clock_skew_seconds,
        public_paths = ?config.public_paths,
        disable_csrf = config.security.disable_csrf,
        stateless_sessions = config.security.stateless_sessions,
        metrics_enabled = config.metrics_enabled,
        "Configuration loaded successfully"
    );

    let metrics_handle = if config.metrics_enabled {
        Some(init_metrics_recorder().map_err(|e| {
            error!("Failed to initialize metrics recorder: {}", e);
            e
        })?)
    } else {
        None
    };

    // Parse bind address before moving config
    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!(target: "auth.config", "Invalid bind address: {}", e);
        e
    })?;

    // Create application state
    let store = Arc::new(InMemoryCredentialStore::new());
    let state = AppState::new(config, Arc::clone(&store) as Arc<dyn CredentialStore>).map_err(|e| {
        error!("Failed to initialize token codec: {}", e);
        e
    })?;

    let seeded = state
        .verifier
        .seed(&state.config.seed_users)
        .await
        .map_err(|e| {
            error!("Failed to seed accounts: {}", e);
            e
        })?;
    if store.is_empty().await {
        warn!("No accounts registered; accounts can only be created through /join");
    } else {
        info!(
            seeded,
            accounts = store.len().await,
            "Seed accounts registered"
        );
    }

    // Build application routes
    let app = routes::build_routes(Arc::new(state), metrics_handle);

    info!("Auth service listening on {}", addr);

    // Start server with graceful shutdown support
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Auth service shutdown complete");

    Ok(())
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
