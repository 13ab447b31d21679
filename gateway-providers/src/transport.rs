//! Shared HTTP plumbing for provider adapters.

use std::time::{Duration, Instant};

use gateway_types::{ProviderError, RequestContext};
use reqwest::header::CONTENT_TYPE;

use crate::credentials::Credentials;

/// Builds the client shared by every adapter instance.
///
/// `timeout` is the upper bound for any single provider call; a request
/// deadline shorter than that wins.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(timeout).build()
}

/// POSTs `body` to `url` with the provider auth headers and returns the
/// response body of a 2xx answer.
pub(crate) async fn post(
    client: &reqwest::Client,
    ctx: &RequestContext,
    provider: &'static str,
    url: &str,
    credentials: &Credentials,
    content_type: &'static str,
    body: String,
) -> Result<String, ProviderError> {
    if ctx.is_cancelled() {
        tracing::warn!(
            request_id = ctx.request_id(),
            provider,
            "Request cancelled or timed out before calling provider"
        );
        return Err(ProviderError::Cancelled);
    }

    tracing::debug!(request_id = ctx.request_id(), provider, %url, %body, "Calling provider");

    let mut request = client
        .post(url)
        .header(CONTENT_TYPE, content_type)
        .header("user_id", credentials.user_id.as_str())
        .header("user_secret", credentials.user_secret())
        .body(body);
    if let Some(left) = ctx.remaining() {
        request = request.timeout(left);
    }

    let started = Instant::now();
    let response = request
        .send()
        .await
        .map_err(|e| map_transport_error(ctx, provider, e))?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| map_transport_error(ctx, provider, e))?;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if !status.is_success() {
        tracing::warn!(
            request_id = ctx.request_id(),
            provider,
            status = status.as_u16(),
            elapsed_ms,
            body = %text,
            "Provider rejected request"
        );
        return Err(ProviderError::Remote {
            status: status.as_u16(),
        });
    }

    tracing::debug!(
        request_id = ctx.request_id(),
        provider,
        status = status.as_u16(),
        elapsed_ms,
        body = %text,
        "Provider responded"
    );
    Ok(text)
}

fn map_transport_error(ctx: &RequestContext, provider: &str, err: reqwest::Error) -> ProviderError {
    if err.is_timeout() && ctx.is_cancelled() {
        tracing::warn!(request_id = ctx.request_id(), provider, "Provider call hit the request deadline");
        return ProviderError::Cancelled;
    }
    if err.is_builder() {
        return ProviderError::Encode(err.to_string());
    }
    tracing::error!(request_id = ctx.request_id(), provider, error = %err, "Provider call failed");
    ProviderError::Network(err.to_string())
}

/// Rejects a decoded response that lacks either field.
pub(crate) fn require_details(
    provider: &str,
    url: String,
    external_id: String,
) -> Result<gateway_types::PaymentDetails, ProviderError> {
    if url.trim().is_empty() || external_id.trim().is_empty() {
        return Err(ProviderError::Decode(format!(
            "{} response is missing url or external id",
            provider
        )));
    }
    Ok(gateway_types::PaymentDetails {
        redirect_url: url,
        external_id,
    })
}
