//! REST API module.
//!
//! Contains all API routes and handlers following the frontend contract.
//! The core never builds HTTP status codes itself: handlers return
//! [`ApiResult`] and the error type maps to status codes centrally.

mod auth;
mod dashboard;
mod devices;
mod health;

pub use auth::*;
pub use dashboard::*;
pub use devices::*;
pub use health::*;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;

use crate::db::Provenance;
use crate::errors::AppError;

/// Success response envelope. Every capability response carries a
/// `dataSource` tag so a client can distinguish authoritative data from
/// sample data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_source: Option<Provenance>,
    pub timestamp: String,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            count: None,
            message: None,
            data_source: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn with_source(mut self, source: Provenance) -> Self {
        self.data_source = Some(source);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<ApiResponse<T>, AppError>;
