//! Infrastructure and engine error types.

use chrono::NaiveDate;
use thiserror::Error;

use larder_core::{DomainError, Sku};

/// Row store operation error.
///
/// These are infrastructure failures (transport, shape of the data) as opposed
/// to domain errors (validation, lifecycle).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("row store unavailable: {0}")]
    Unavailable(String),

    #[error("malformed sheet data: {0}")]
    Malformed(String),

    #[error("unknown sheet: {0}")]
    UnknownSheet(String),
}

/// Catalog or route feed failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FeedError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Error returned by the planner, the ledger and the order controller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("insufficient stock for {sku} on {date}: requested {requested}, available {available}")]
    StockConflict {
        sku: Sku,
        date: NaiveDate,
        requested: i64,
        available: i64,
    },

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("not found")]
    NotFound,

    #[error("order lapsed: {0}")]
    OrderLapsed(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl EngineError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StockConflict { .. })
    }
}

impl From<DomainError> for EngineError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => EngineError::Validation(msg),
            DomainError::InvalidId(msg) => EngineError::Validation(msg),
            DomainError::StockConflict {
                sku,
                date,
                requested,
                available,
            } => EngineError::StockConflict {
                sku,
                date,
                requested,
                available,
            },
            DomainError::NotFound => EngineError::NotFound,
            DomainError::Conflict(msg) => EngineError::OrderLapsed(msg),
            DomainError::InvariantViolation(msg) => EngineError::InvariantViolation(msg),
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(value: StoreError) -> Self {
        EngineError::UpstreamUnavailable(value.to_string())
    }
}

impl From<FeedError> for EngineError {
    fn from(value: FeedError) -> Self {
        EngineError::UpstreamUnavailable(value.to_string())
    }
}
