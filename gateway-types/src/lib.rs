//! # Gateway Types
//!
//! Domain types and port traits for the payment gateway.
//! This crate has ZERO external IO dependencies - only data structures,
//! business rules, and trait definitions.
//!
//! ## Architecture
//!
//! This crate represents the **innermost core** of the hexagonal architecture:
//! - `domain/` - Pure domain types (Amount, Payment, ProviderConfiguration)
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Domain, store, provider and application error types
//! - `context/` - Request-scoped correlation ID and deadline

pub mod context;
pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use context::RequestContext;
pub use domain::{
    Amount, CallbackOutcome, Country, Currency, Payment, PaymentDetails, PaymentId, PaymentStatus,
    PaymentType, Provider, ProviderConfiguration,
};
pub use dto::*;
pub use error::{AppError, DomainError, GatewayError, ProviderError, RepoError};
pub use ports::{
    AdapterFactory, PaymentRepository, PaymentUnitOfWork, ProviderAdapter,
    ProviderConfigRepository,
};
