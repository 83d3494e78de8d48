use std::sync::Arc;

use etf_service::config::Config;
use etf_service::error::Result;
use etf_service::service::Service;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting ETF service...");

    let config = Config::from_env()?;
    tracing::info!(
        md = %config.md_addr(),
        clearing = %config.clearing_addr(),
        rest_port = config.rest_port,
        ws_port = config.ws_port,
        "configuration loaded"
    );

    let service = Arc::new(Service::new(config));

    let (shutdown_tx, _shutdown_rx) = tokio::sync::broadcast::channel::<()>(1);
    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Received shutdown signal (Ctrl+C)");
                let _ = signal_tx.send(());
            }
            Err(err) => {
                tracing::error!("Failed to listen for shutdown signal: {}", err);
            }
        }
    });

    service.run(shutdown_tx).await?;

    tracing::info!("Server stopped");
    Ok(())
}
