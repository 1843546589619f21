use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domains::{AppError, Status};
use tracing::warn;

use crate::web::error::ApiError;
use crate::web::state::AppState;

pub async fn status(State(state): State<AppState>) -> Result<Json<Status>, ApiError> {
    Ok(Json(state.status.status().await?))
}

pub async fn clear(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.status.clear().await?;
    Ok(StatusCode::OK)
}

/// Prometheus text exposition.
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let body = state.metrics.render().map_err(|e| {
        warn!(error = %e, "metrics encoding failed");
        ApiError(AppError::Internal("metrics encoding failed".into()))
    })?;
    Ok(([(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")], body))
}
