//! mailwatch server binary.

use mailwatch::{api, domains, MailwatchConfig, MailwatchService};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = MailwatchConfig::from_env()?;
    let service = Arc::new(MailwatchService::new(config.clone())?);
    service.spawn_idle_sweeper();

    let router = api::build_router(Arc::clone(&service));
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(
        addr = %listener.local_addr()?,
        domains = domains::DOMAINS.len(),
        check_interval_secs = config.check_interval.as_secs(),
        "mailwatch listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    service.shutdown();
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}
