use crate::{config::Config, routes::api_routes, telemetry::Metrics};
use axum::{extract::DefaultBodyLimit, Router};
use axum_otel_metrics::HttpMetricsLayerBuilder;
use car_price_model::{ArtifactLoader, PredictionSession};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::{net::TcpListener, sync::broadcast::Receiver, task::JoinHandle};

#[derive(Clone)]
pub struct SharedState {
    pub session: Arc<Mutex<PredictionSession>>,
    pub loader: Arc<dyn ArtifactLoader>,
    pub metrics: Arc<Metrics>,
}

impl SharedState {
    pub fn new(loader: Arc<dyn ArtifactLoader>, metrics: Arc<Metrics>) -> Self {
        Self {
            session: Arc::new(Mutex::new(PredictionSession::new())),
            loader,
            metrics,
        }
    }
}

pub struct HttpServer {
    router: Router,
    listener: TcpListener,
}

impl HttpServer {
    pub async fn new(app_state: SharedState, config: &Config) -> anyhow::Result<Self> {
        let addr = config.server.get_address();
        let metrics_layer = HttpMetricsLayerBuilder::new().build();

        let router = Router::new()
            .merge(api_routes())
            .with_state(app_state)
            .layer(DefaultBodyLimit::max(config.upload.max_bytes))
            .layer(metrics_layer);

        let listener = TcpListener::bind(addr).await?;

        Ok(Self { router, listener })
    }

    pub async fn run(
        self,
        mut shutdown_rx: Receiver<()>,
    ) -> anyhow::Result<JoinHandle<anyhow::Result<()>>> {
        tracing::info!("Starting app on {}", self.listener.local_addr()?);

        let listener = self.listener;
        let router = self.router;
        let server_handle = tokio::spawn(async move {
            axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    shutdown_rx.recv().await.ok();
                })
                .await?;
            Ok(())
        });

        Ok(server_handle)
    }
}
