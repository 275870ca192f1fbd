//! Order errors.

use std::fmt;

use thiserror::Error;

use super::value_objects::OrderId;

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Field path, e.g. `name` or `items[2].qty`.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl FieldViolation {
    /// Create a new violation.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors that can occur while handling orders.
///
/// The four variants are the categories callers must be able to tell apart:
/// bad input, unknown order, undecodable stored record, failing store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    /// Malformed or missing input fields.
    #[error("invalid order: {}", join_violations(.violations))]
    Validation {
        /// Every offending field.
        violations: Vec<FieldViolation>,
    },

    /// The order does not exist.
    #[error("order not found: {order_id}")]
    NotFound {
        /// Order ID.
        order_id: OrderId,
    },

    /// A stored record could not be decoded.
    #[error("order {order_id} has corrupt {field}: {reason}")]
    DataCorruption {
        /// Order ID of the corrupt row.
        order_id: OrderId,
        /// Column that failed to decode.
        field: &'static str,
        /// Decoder message.
        reason: String,
    },

    /// The persistence layer failed.
    #[error("storage failure during {operation}: {message}")]
    Storage {
        /// Operation that was running (`create`, `list`, ...).
        operation: &'static str,
        /// Underlying error message. Logged, never returned to clients.
        message: String,
    },
}

impl OrderError {
    /// Storage error for the given operation.
    pub fn storage(operation: &'static str, err: impl fmt::Display) -> Self {
        Self::Storage {
            operation,
            message: err.to_string(),
        }
    }

    /// Names of the fields rejected by a validation error.
    #[must_use]
    pub fn violated_fields(&self) -> Vec<&str> {
        match self {
            Self::Validation { violations } => {
                violations.iter().map(|v| v.field.as_str()).collect()
            }
            _ => Vec::new(),
        }
    }
}
