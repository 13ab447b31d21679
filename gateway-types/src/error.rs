//! Error types for the payment gateway.

use std::collections::BTreeMap;

use crate::domain::PaymentStatus;

/// Domain-level errors (business rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Failures talking to a remote provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Provider unreachable: {0}")]
    Network(String),

    #[error("Provider responded with status {status}")]
    Remote { status: u16 },

    #[error("Malformed provider response: {0}")]
    Decode(String),

    #[error("Could not encode provider request: {0}")]
    Encode(String),

    #[error("Request cancelled before the provider answered")]
    Cancelled,
}

/// Errors surfaced by the routing and orchestration core.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported provider: {0}")]
    UnsupportedProvider(String),

    #[error(transparent)]
    Store(#[from] RepoError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A callback arrived for a payment that is no longer `PENDING`.
    /// Expected on duplicate delivery; nothing is written.
    #[error("Payment is {0}, expected PENDING")]
    StaleTransition(PaymentStatus),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<DomainError> for GatewayError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::InvalidTransition { from, .. } => GatewayError::StaleTransition(from),
            other => GatewayError::Validation(other.to_string()),
        }
    }
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Field name to the list of messages for that field.
    #[error("Validation failed")]
    Validation(BTreeMap<String, Vec<String>>),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotFound(what) => AppError::NotFound(what),
            GatewayError::Store(RepoError::NotFound) => {
                AppError::NotFound("Resource not found".into())
            }
            GatewayError::StaleTransition(status) => {
                AppError::Conflict(format!("Payment already {}", status))
            }
            GatewayError::Validation(msg) => AppError::BadRequest(msg),
            GatewayError::Store(RepoError::Domain(e)) => AppError::BadRequest(e.to_string()),
            e @ (GatewayError::UnsupportedProvider(_)
            | GatewayError::Store(_)
            | GatewayError::Provider(_)) => AppError::Internal(e.to_string()),
        }
    }
}
