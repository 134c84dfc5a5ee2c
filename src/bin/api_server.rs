// API Server Binary Entry Point
//
// Purpose: Start the Axum API server over the crop recommender
// Usage: cargo run --features api --bin api_server

use crop_advisor_rust::{create_router, AdvisorConfig, AppState};
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing (structured logging)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    // Default log level: info for our crate, warn for others
                    "crop_advisor_rust=info,tower_http=debug,axum=debug,warn".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting API server...");

    // Configuration: ADVISOR_CONFIG file (optional) + DATASET_PATH / PORT /
    // RISK_SCORING / MARKET_FALLBACK overrides
    let config = AdvisorConfig::from_env()?;

    tracing::info!("Configuration:");
    tracing::info!("  DATASET_PATH: {}", config.dataset_path.display());
    tracing::info!("  RISK_SCORING: {:?}", config.scoring);
    tracing::info!("  MARKET_FALLBACK: {}", config.market_fallback_path.display());
    tracing::info!("  PORT: {}", config.port);

    let port = config.port;

    // Range table + model are built once, before any request is accepted
    tracing::info!("Initializing application state...");
    let state = tokio::task::spawn_blocking(move || AppState::new(config)).await??;
    tracing::info!("Application state initialized successfully");

    // Create router with all endpoints and middleware
    let app = create_router(state);

    // Bind to address
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting server on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .await?;

    Ok(())
}
