use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;

use super::ApiError;
use super::ApiSuccess;
use super::MessageData;
use crate::inbound::http::router::AppState;

/// Store readiness as reported by `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthData {
    pub status: &'static str,
    pub database: &'static str,
}

pub async fn liveness() -> ApiSuccess<MessageData> {
    ApiSuccess::new(StatusCode::OK, MessageData::new("live"))
}

pub async fn health(State(state): State<AppState>) -> Result<ApiSuccess<HealthData>, ApiError> {
    state.health.check().await.map_err(|e| {
        tracing::error!(error = %e, "Health check failed");
        ApiError::ServiceUnavailable("database unavailable".to_string())
    })?;

    Ok(ApiSuccess::new(
        StatusCode::OK,
        HealthData {
            status: "up",
            database: "up",
        },
    ))
}
