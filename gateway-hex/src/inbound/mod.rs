//! HTTP Inbound Adapter
//!
//! Axum-based HTTP server that drives the payment orchestrator.

mod auth;
mod handlers;
mod server;

pub use auth::TokenDigest;
pub use handlers::AppState;
pub use server::HttpServer;
