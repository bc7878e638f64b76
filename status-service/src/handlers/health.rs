use crate::dtos::{HealthResponse, StatusResponse, UnhealthyResponse};
use crate::services::health::iso_timestamp;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;

/// Liveness: always 200, reports whether the database is currently connected.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let reporter = &state.reporter;

    Json(HealthResponse {
        status: "UP",
        timestamp: iso_timestamp(Utc::now()),
        environment: state.config.environment.clone(),
        uptime: reporter.uptime().as_secs_f64(),
        database: reporter.database().label(),
    })
}

/// Status with memory figures; degrades to 503 when sampling fails.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    match state.reporter.sample() {
        Ok(snapshot) => (StatusCode::OK, Json(StatusResponse::from(&snapshot))).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Status sampling failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(UnhealthyResponse {
                    status: "unhealthy",
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
