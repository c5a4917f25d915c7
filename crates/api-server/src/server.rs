//! API server — HTTP surface and Prometheus metrics exporter.

use crate::rest::{self, AppState};
use adpulse_analytics::{FilterSelection, RecordStore};
use adpulse_core::config::AppConfig;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// HTTP server exposing the dashboard's aggregation core.
pub struct ApiServer {
    config: AppConfig,
    store: Arc<RecordStore>,
}

impl ApiServer {
    pub fn new(config: AppConfig, store: Arc<RecordStore>) -> Self {
        Self { config, store }
    }

    /// Start the HTTP REST server. Blocks until shutdown.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let state = AppState {
            store: self.store.clone(),
            selection: Arc::new(parking_lot::RwLock::new(FilterSelection::default())),
            config: Arc::new(self.config.clone()),
            start_time: Instant::now(),
        };

        let app = Router::new()
            // Data and aggregation endpoints
            .route("/v1/records", post(rest::ingest))
            .route("/v1/rollup", get(rest::get_rollup))
            .route("/v1/filters", get(rest::get_filters))
            .route("/v1/filters/toggle", post(rest::toggle_filter))
            .route("/v1/filters/reset", post(rest::reset_filters))
            .route("/v1/comparison", post(rest::get_comparison))
            // Operational endpoints
            .route("/health", get(rest::health_check))
            .route("/ready", get(rest::readiness))
            .route("/live", get(rest::liveness))
            // Middleware
            .layer(CompressionLayer::new())
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let addr = SocketAddr::new(self.config.api.host.parse()?, self.config.api.http_port);

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the metrics exporter on a separate port.
    pub async fn start_metrics(&self) -> anyhow::Result<()> {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        let handle = builder
            .with_http_listener(SocketAddr::new(
                self.config.api.host.parse()?,
                self.config.metrics.port,
            ))
            .install_recorder()?;

        info!(port = self.config.metrics.port, "Metrics exporter started");

        // Keep the handle alive
        std::mem::forget(handle);
        Ok(())
    }
}
