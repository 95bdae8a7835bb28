//! Data source selection and degradation policy.
//!
//! Every capability routes its store access through [`DataSource`] so the
//! three-way fallback (database / simulated / simulated_fallback) lives in
//! one place instead of being duplicated per endpoint.

use std::future::Future;

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;

use super::Repository;
use crate::errors::AppError;

/// Where the data in a response actually came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Authoritative store result
    Database,
    /// Sample data; the store was never available
    Simulated,
    /// Sample data; the store was available but the query failed
    SimulatedFallback,
}

/// A value paired with the provenance of the data source that produced it.
#[derive(Debug)]
pub struct Sourced<T> {
    pub value: T,
    pub source: Provenance,
}

/// Structured store health report. Health checks never fail; an unreachable
/// store degrades to an unhealthy result.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreHealth {
    pub status: String,
    pub connected: bool,
    pub message: String,
    pub timestamp: String,
}

impl StoreHealth {
    fn new(status: &str, connected: bool, message: impl Into<String>) -> Self {
        Self {
            status: status.to_string(),
            connected,
            message: message.into(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// Handle over an optional store, constructed once at process start and
/// injected into every capability through the application state.
#[derive(Clone)]
pub struct DataSource {
    repo: Option<Repository>,
}

impl DataSource {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            repo: Some(Repository::new(pool)),
        }
    }

    /// A data source with no store behind it. Reads serve sample data;
    /// destructive writes fail with StoreRequired.
    pub fn without_store() -> Self {
        Self { repo: None }
    }

    pub fn repository(&self) -> Option<&Repository> {
        self.repo.as_ref()
    }

    /// Access the store for a destructive write. There is no safe fallback
    /// for mutations, so absence surfaces as StoreRequired.
    pub fn store(&self) -> Result<&Repository, AppError> {
        self.repo.as_ref().ok_or_else(|| {
            AppError::StoreRequired(
                "Store unavailable; destructive operations are disabled".to_string(),
            )
        })
    }

    /// Run a read against the store, degrading to `fallback` when the store
    /// is absent or the query fails. Read-path store errors never propagate
    /// to the caller.
    pub async fn read<T, F, Fut>(&self, query: F, fallback: impl FnOnce() -> T) -> Sourced<T>
    where
        F: FnOnce(Repository) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let Some(repo) = &self.repo else {
            return Sourced {
                value: fallback(),
                source: Provenance::Simulated,
            };
        };

        match query(repo.clone()).await {
            Ok(value) => Sourced {
                value,
                source: Provenance::Database,
            },
            Err(err) => {
                tracing::warn!("Store read failed, serving sample data: {}", err);
                Sourced {
                    value: fallback(),
                    source: Provenance::SimulatedFallback,
                }
            }
        }
    }

    /// Probe store health. Always returns a structured result.
    pub async fn health_check(&self) -> StoreHealth {
        match &self.repo {
            None => StoreHealth::new("unavailable", false, "Store pool not initialized"),
            Some(repo) => match repo.ping().await {
                Ok(()) => StoreHealth::new("healthy", true, "Store responding"),
                Err(err) => StoreHealth::new("unhealthy", false, err.to_string()),
            },
        }
    }

    /// Release all pooled connections. Idempotent; a no-op without a store.
    pub async fn close(&self) {
        if let Some(repo) = &self.repo {
            repo.close().await;
        }
    }
}
