//! HTTP error handling for the order service.
//!
//! Every failure leaving the HTTP layer is an [`ApiError`] carrying a stable
//! [`ErrorCode`]. Clients branch on the code; the message is for humans.
//!
//! # Status Codes
//!
//! | Code | HTTP | Usage |
//! |------|------|-------|
//! | `VALIDATION_ERROR` | 400 | Missing or malformed request fields |
//! | `ORDER_NOT_FOUND` | 404 | No order with the requested id |
//! | `DATA_CORRUPTION` | 500 | Stored order could not be decoded |
//! | `STORAGE_FAILURE` | 500 | Persistence layer failed |
//! | `INTERNAL_ERROR` | 500 | Anything else |

use std::collections::BTreeMap;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::orders::OrderError;

/// Message returned for storage failures. The real cause is only logged.
pub const STORAGE_FAILURE_MESSAGE: &str = "internal storage failure";

/// Error codes for the order service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Invalid request format or missing fields.
    ValidationError,
    /// Order not found.
    OrderNotFound,
    /// Stored order could not be decoded.
    DataCorruption,
    /// Persistence layer failed.
    StorageFailure,
    /// Internal server error.
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error.
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::ValidationError => StatusCode::BAD_REQUEST,
            Self::OrderNotFound => StatusCode::NOT_FOUND,
            Self::DataCorruption | Self::StorageFailure | Self::InternalError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Get the error reason string.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::DataCorruption => "DATA_CORRUPTION",
            Self::StorageFailure => "STORAGE_FAILURE",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason())
    }
}

/// An error returned by an HTTP handler.
#[derive(Debug, Error)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    details: BTreeMap<String, String>,
}

impl ApiError {
    /// Create a new API error.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    /// Add a detail entry.
    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Single-field validation error.
    #[must_use]
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::ValidationError, format!("{field}: {message}"))
            .with_detail(field, message)
    }

    /// Get the error code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        self.code
    }

    /// Get the message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the details.
    #[must_use]
    pub const fn details(&self) -> &BTreeMap<String, String> {
        &self.details
    }

    /// Convert to the response body.
    #[must_use]
    pub fn to_http_response(&self) -> HttpErrorResponse {
        HttpErrorResponse {
            code: self.code.reason().to_string(),
            message: self.message.clone(),
            details: self.details.clone(),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.reason(), self.message)
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Validation { violations } => {
                let message = format!(
                    "invalid order: {}",
                    violations
                        .iter()
                        .map(|v| v.field.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                violations
                    .into_iter()
                    .fold(Self::new(ErrorCode::ValidationError, message), |e, v| {
                        e.with_detail(v.field, v.message)
                    })
            }
            OrderError::NotFound { order_id } => Self::new(
                ErrorCode::OrderNotFound,
                format!("Order {order_id} not found"),
            )
            .with_detail("order_id", order_id.to_string()),
            OrderError::DataCorruption {
                order_id, field, ..
            } => Self::new(
                ErrorCode::DataCorruption,
                format!("Order {order_id} could not be read"),
            )
            .with_detail("order_id", order_id.to_string())
            .with_detail("field", field),
            OrderError::Storage { .. } => {
                Self::new(ErrorCode::StorageFailure, STORAGE_FAILURE_MESSAGE)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.http_status(), Json(self.to_http_response())).into_response()
    }
}

/// HTTP error response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpErrorResponse {
    /// Error code string.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Additional details, e.g. field name to violation message.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, String>,
}
