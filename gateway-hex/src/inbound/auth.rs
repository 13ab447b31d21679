//! Shared-token authentication for the payment creation routes.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use gateway_types::ApiResponse;

/// Header carrying the caller's token.
pub const AUTH_HEADER: &str = "X-AUTH-TOKEN";

/// SHA-256 of the configured token.
///
/// Presented tokens are hashed before comparison so the compare runs over
/// fixed-length digests regardless of what the caller sent.
#[derive(Clone)]
pub struct TokenDigest([u8; 32]);

impl TokenDigest {
    pub fn new(token: &str) -> Self {
        Self(hash_token(token))
    }

    pub fn matches(&self, presented: &str) -> bool {
        if presented.is_empty() {
            return false;
        }
        hash_token(presented)[..].ct_eq(&self.0[..]).into()
    }
}

impl std::fmt::Debug for TokenDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("TokenDigest(..)")
    }
}

fn hash_token(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

/// Rejects the request with 401 unless `X-AUTH-TOKEN` matches.
pub async fn auth_middleware(
    State(digest): State<Arc<TokenDigest>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let presented = request
        .headers()
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if digest.matches(presented) {
        return next.run(request).await;
    }

    tracing::warn!(path = %request.uri().path(), "Rejected request with missing or invalid token");
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiResponse::error("Unauthorized")),
    )
        .into_response()
}
