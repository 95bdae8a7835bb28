//! Authentication API endpoints.

use axum::{extract::State, http::HeaderMap, Json};

use super::{ApiResponse, ApiResult};
use crate::auth;
use crate::db::Provenance;
use crate::errors::AppError;
use crate::models::{AuthSource, LoginRequest, LoginResponse};
use crate::AppState;

/// POST /api/auth/login - Authenticate a user.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let username = request.username.unwrap_or_default();
    let password = request.password.unwrap_or_default();

    if username.is_empty() || password.is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".to_string(),
        ));
    }
    if username.len() < 3 {
        return Err(AppError::Validation(
            "Username must be at least 3 characters".to_string(),
        ));
    }
    if password.len() < 6 {
        return Err(AppError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    let ip = client_ip(&headers);
    let outcome = auth::authenticate(&state.data, &username, &password, &ip).await?;

    let source = match outcome.auth_source {
        AuthSource::Database => Provenance::Database,
        AuthSource::Local => Provenance::Simulated,
    };

    Ok(ApiResponse::new(outcome)
        .with_message("Login successful")
        .with_source(source))
}

/// GET /api/auth/verify - Session verification placeholder.
pub async fn verify() -> ApiResult<()> {
    Ok(ApiResponse::new(()).with_message("Verification endpoint available"))
}

/// POST /api/auth/logout - Logout acknowledgement.
pub async fn logout() -> ApiResult<()> {
    Ok(ApiResponse::new(()).with_message("Logout successful"))
}

/// Best-effort client address for the audit log.
fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.split(',').next().unwrap_or(s).trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
