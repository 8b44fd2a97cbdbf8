//! Domain error model.

use chrono::NaiveDate;
use thiserror::Error;

use crate::id::Sku;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business failures (validation,
/// stock conflicts, lifecycle violations). Store and feed failures belong to
/// the infrastructure layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input failed validation (empty cart, non-positive quantity, missing date).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Not enough projected stock for a cart line on the requested date.
    #[error("insufficient stock for {sku} on {date}: requested {requested}, available {available}")]
    StockConflict {
        sku: Sku,
        date: NaiveDate,
        requested: i64,
        available: i64,
    },

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested order or resource does not exist.
    #[error("not found")]
    NotFound,

    /// The requested transition conflicts with the current lifecycle state.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Whether the caller can reasonably retry with different input
    /// (e.g. pick another delivery date).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StockConflict { .. })
    }
}
