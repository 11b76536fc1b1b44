//! Social Feed Server Library
//!
//! REST API for registration, login, and a public feed of posts with
//! likes and comments behind bearer-token auth.

pub mod core;
pub mod posts;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::core::{AppState, ServerConfig};

pub async fn run() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("feed_server=info,tower_http=info"));
    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_err()
    {
        // Already set, ignore
    }

    info!("=== Feed Server ===");

    let config = ServerConfig::from_env()?;
    let state = AppState::init(config).await?;
    info!("Data directory: {:?}", state.config.data_dir);

    let addr = state.listen_addr();
    let app = crate::core::router(state);

    info!("Server running on port {}", addr.port());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
