use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use ragchat_backend::core::config::{load_config, redact_sensitive_values};
use ragchat_backend::core::logging;
use ragchat_backend::server;
use ragchat_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("Failed to load configuration")?;
    logging::init(&config.logging);

    match serde_json::to_value(&config) {
        Ok(value) => tracing::info!("Effective config: {}", redact_sensitive_values(&value)),
        Err(err) => tracing::warn!("Failed to serialize config for logging: {}", err),
    }

    let bind_addr = config.server.addr.clone();
    let state = AppState::initialize(config).await?;

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    wait_for_signal(tokio::signal::ctrl_c()).await;
}

/// Resolves once `signal` fires. A listener that fails never resolves.
async fn wait_for_signal<F>(signal: F)
where
    F: std::future::Future<Output = std::io::Result<()>>,
{
    if let Err(err) = signal.await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_failed_listener_does_not_trigger_shutdown() {
        let failing = async { Err(std::io::Error::other("no signal handler")) };
        let waited =
            tokio::time::timeout(Duration::from_secs(3600), wait_for_signal(failing)).await;
        assert!(waited.is_err());
    }

    #[tokio::test]
    async fn test_signal_triggers_shutdown() {
        wait_for_signal(async { Ok(()) }).await;
    }
}
