use crate::config::Config;
use crate::server::{HttpServer, SharedState};
use crate::telemetry::Metrics;

use car_price_model::OrtArtifactLoader;
use std::{error::Error, sync::Arc};
use tokio::{signal, sync::broadcast};

pub async fn start_app(config: Config) -> Result<(), Box<dyn Error>> {
    let loader = match OrtArtifactLoader::new(&config.model) {
        Ok(loader) => Arc::new(loader),
        Err(e) => {
            tracing::error!("Failed to initialize model loader: {}", e);
            return Err(Box::new(e));
        }
    };

    let metrics = Arc::new(Metrics::new()?);
    let app_state = SharedState::new(loader, metrics);

    let server = HttpServer::new(app_state, &config).await?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let server_shutdown_rx = shutdown_tx.subscribe();

    let server_handle = server.run(server_shutdown_rx).await?;

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown.");

    let _ = shutdown_tx.send(());
    match server_handle.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("Server stopped with an error: {}", e),
        Err(e) => tracing::error!("Server task failed: {}", e),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
