use crate::dtos::{NotFoundResponse, TestResponse};
use crate::startup::AppState;
use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::IntoResponse,
    Json,
};

pub async fn api_test(State(state): State<AppState>) -> impl IntoResponse {
    Json(TestResponse {
        message: "Backend is working!",
        environment: state.config.environment.clone(),
    })
}

pub async fn not_found(uri: Uri) -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(NotFoundResponse {
            success: false,
            message: "Route not found",
            path: uri.path().to_string(),
        }),
    )
}
