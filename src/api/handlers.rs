//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::TimeDelta;
use tracing::warn;

use super::AppState;
use super::types::{ErrorResponse, ForecastResponse, OptimizeQuery};
use crate::optimizer::WindowOptimizer;

/// Returns the loaded forecast.
///
/// `GET /forecast` → 200 + `ForecastResponse` JSON
pub async fn get_forecast(State(state): State<Arc<AppState>>) -> Json<ForecastResponse> {
    Json(ForecastResponse::from(&state.series))
}

/// Runs a window search against the loaded forecast.
///
/// `GET /optimize` → 200 + `OptimizationResult` JSON using configured defaults
/// `GET /optimize?duration_minutes=N&step_minutes=M` → overrides
/// `GET /optimize?duration_minutes=<longer than horizon>` → 400 + `ErrorResponse`
pub async fn get_optimize(
    State(state): State<Arc<AppState>>,
    Query(query): Query<OptimizeQuery>,
) -> impl IntoResponse {
    let duration = query
        .duration_minutes
        .map_or(state.default_duration, |m| TimeDelta::minutes(i64::from(m)));

    let mut optimizer = state.optimizer;
    if let Some(step) = query.step_minutes {
        optimizer = optimizer_with_step(optimizer, TimeDelta::minutes(i64::from(step)));
    }

    match optimizer.find_optimal_start(&state.series, duration) {
        Ok(result) => Ok(Json(result)),
        Err(e) => {
            warn!(error = %e, "rejected optimize query");
            Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

/// Copies `base` with a different candidate step, keeping its other settings.
fn optimizer_with_step(base: WindowOptimizer, step: TimeDelta) -> WindowOptimizer {
    let optimizer = WindowOptimizer::new(step).with_tie_epsilon(base.tie_epsilon());
    match base.max_window() {
        Some(limit) => optimizer.with_max_window(limit),
        None => optimizer,
    }
}
