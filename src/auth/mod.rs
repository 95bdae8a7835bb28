//! Login authentication.
//!
//! Tries the store first, then falls back to the fixed local user table.
//! Password comparison is plaintext equality (a known gap inherited from the
//! deployed schema) but constant-time to mitigate timing attacks.

use subtle::ConstantTimeEq;

use crate::db::DataSource;
use crate::errors::AppError;
use crate::models::{AuthSource, LoginResponse, PublicUser};
use crate::sample::LOCAL_USERS;

/// Authenticate a username/password pair against the store, then the local
/// fallback table. Every attempt is appended to the audit log when the store
/// is available; audit failures never affect the outcome.
pub async fn authenticate(
    data: &DataSource,
    username: &str,
    password: &str,
    ip: &str,
) -> Result<LoginResponse, AppError> {
    let mut outcome: Option<LoginResponse> = None;

    if let Some(repo) = data.repository() {
        match repo.find_user(username).await {
            Ok(Some(user)) if constant_time_compare(&user.password, password) => {
                outcome = Some(LoginResponse {
                    user: PublicUser::from(&user),
                    auth_source: AuthSource::Database,
                });
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!("Store auth lookup failed, trying local users: {}", err);
            }
        }
    }

    if outcome.is_none() {
        outcome = LOCAL_USERS
            .iter()
            .find(|u| u.username == username && constant_time_compare(u.password, password))
            .map(|local| LoginResponse {
                user: PublicUser {
                    username: local.username.to_string(),
                    role: local.role,
                    email: local.email.to_string(),
                },
                auth_source: AuthSource::Local,
            });
    }

    record_attempt(data, username, outcome.is_some(), ip).await;

    outcome.ok_or_else(|| AppError::AuthFailed("Invalid credentials".to_string()))
}

/// Append to the login audit log. Write-only; failures are swallowed.
async fn record_attempt(data: &DataSource, username: &str, success: bool, ip: &str) {
    if let Some(repo) = data.repository() {
        if let Err(err) = repo.record_login_attempt(username, success, ip).await {
            tracing::warn!("Failed to record login attempt: {}", err);
        }
    }
}

/// Perform constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
