//! Health check endpoint

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub message: &'static str,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        message: "PDF Processing Service is running",
    })
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}
