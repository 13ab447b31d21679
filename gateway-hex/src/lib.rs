//! # Gateway Hex
//!
//! Payment orchestrator and HTTP adapter for the payment gateway.
//!
//! ## Architecture
//!
//! - `service/` - Payment orchestrator (create payment, apply callbacks)
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! The service is generic over the store, the routing table and the
//! adapter factory, allowing different implementations to be injected.

pub mod inbound;
pub mod openapi;
pub mod service;

#[cfg(test)]
mod service_tests;

pub use inbound::{AppState, HttpServer};
pub use service::PaymentService;
