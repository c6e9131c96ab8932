// ABOUTME: HTTP server startup and graceful shutdown.
// ABOUTME: Binds the configured address and serves the API router until Ctrl-C.

use tokio::net::TcpListener;

use super::routes::build_router;
use super::state::AppState;
use crate::config::Config;
use crate::error::Result;

pub async fn serve(config: &Config) -> Result<()> {
    let state = AppState::from_config(config)?;

    match state.images.executor().detect() {
        Ok(runtime) => tracing::info!(%runtime, "container runtime available"),
        Err(e) => tracing::warn!(error = %e, "no container runtime available yet; requests will fail until one is installed"),
    }

    let app = build_router(state);
    let listener = TcpListener::bind(config.server.bind).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        environment = %config.environment,
        "imagedash API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
