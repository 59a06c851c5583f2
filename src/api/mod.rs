//! REST API over a loaded forecast.
//!
//! Provides two GET endpoints:
//! - `/forecast`: the loaded samples and interpolation mode
//! - `/optimize`: window search with optional `duration_minutes` and
//!   `step_minutes` query overrides

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use chrono::TimeDelta;
use tracing::info;

use crate::config::OptimizerConfig;
use crate::forecast::ForecastSeries;
use crate::optimizer::WindowOptimizer;

pub use types::{ErrorResponse, ForecastResponse, OptimizeQuery};

/// Immutable application state shared across all request handlers.
///
/// Constructed once after the forecast is loaded and wrapped in `Arc`; no
/// locks are needed since the series is read-only.
pub struct AppState {
    /// Forecast every query runs against.
    pub series: ForecastSeries,
    /// Search settings used when a query does not override them.
    pub optimizer: WindowOptimizer,
    /// Job duration used when a query does not override it.
    pub default_duration: TimeDelta,
}

impl AppState {
    pub fn new(series: ForecastSeries, cfg: &OptimizerConfig) -> Self {
        Self {
            series,
            optimizer: cfg.optimizer(),
            default_duration: cfg.duration(),
        }
    }
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/forecast", get(handlers::get_forecast))
        .route("/optimize", get(handlers::get_optimize))
        .with_state(state)
}

/// Binds to the given address and serves the API until the server stops.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app).await
}
