//! Health check endpoint.

use axum::{extract::State, Json};
use chrono::Utc;
use serde::Serialize;

use crate::db::StoreHealth;
use crate::AppState;

/// Health check payload. Always 200; store trouble shows up in the embedded
/// database report, never as a failed health endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub database: StoreHealth,
    pub timestamp: String,
}

/// GET /api/health - Service and store health.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = state.data.health_check().await;

    Json(HealthResponse {
        status: "OK",
        message: "IoT dashboard backend running",
        database,
        timestamp: Utc::now().to_rfc3339(),
    })
}
