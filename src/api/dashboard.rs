//! Dashboard API endpoint.

use axum::extract::State;
use chrono::Utc;

use super::{ApiResponse, ApiResult};
use crate::dashboard::{build_dashboard, ThreadRngNoise};
use crate::db::Sourced;
use crate::models::DashboardData;
use crate::sample;
use crate::AppState;

/// GET /api/dashboard - Full dashboard snapshot, recomputed per request.
pub async fn get_dashboard(State(state): State<AppState>) -> ApiResult<DashboardData> {
    let Sourced {
        value: devices,
        source,
    } = state
        .data
        .read(
            |repo| async move { repo.list_devices().await },
            sample::sample_devices,
        )
        .await;

    let snapshot = build_dashboard(&devices, Utc::now(), &mut ThreadRngNoise);

    Ok(ApiResponse::new(snapshot)
        .with_message(format!("Dashboard loaded with {} devices", devices.len()))
        .with_source(source))
}
