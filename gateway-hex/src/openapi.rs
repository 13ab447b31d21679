//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use gateway_types::domain::{CallbackOutcome, PaymentStatus, PaymentType};
use gateway_types::dto::{
    ApiResponse, PaymentLandingResponse, PaymentRequest, PaymentUrlData,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

// Dummy functions to generate path documentation
// These are not the actual handlers, just for OpenAPI path generation

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = inline(serde_json::Value), example = json!({"status": "healthy"}))
    )
)]
async fn health() {}

/// Start a deposit
///
/// Routes the request to a provider for the currency and country and
/// returns the URL the user must visit to complete it.
#[utoipa::path(
    post,
    path = "/payment/deposit",
    tag = "payment",
    request_body = PaymentRequest,
    security(("auth_token" = [])),
    responses(
        (status = 200, description = "Deposit created", body = ApiResponse<PaymentUrlData>,
            example = json!({"status": "success", "message": "DEPOSIT successful", "data": {"url": "https://hsbc.example/pay/abc"}})),
        (status = 400, description = "Validation failed",
            example = json!({"status": "error", "message": "Validation failed", "errors": {"amount": ["must be greater than 1"]}})),
        (status = 401, description = "Missing or invalid X-AUTH-TOKEN"),
        (status = 500, description = "Failed to create payment")
    )
)]
async fn deposit() {}

/// Start a withdrawal
#[utoipa::path(
    post,
    path = "/payment/withdrawal",
    tag = "payment",
    request_body = PaymentRequest,
    security(("auth_token" = [])),
    responses(
        (status = 200, description = "Withdrawal created", body = ApiResponse<PaymentUrlData>),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Missing or invalid X-AUTH-TOKEN"),
        (status = 500, description = "Failed to create payment")
    )
)]
async fn withdrawal() {}

/// Provider success callback
#[utoipa::path(
    get,
    path = "/payment/callbacks/success/{external_id}",
    tag = "callbacks",
    params(
        ("external_id" = String, Path, description = "Provider reference; may instead be sent as `?id=` or `?externalId=` on `/payment/callbacks/success`")
    ),
    responses(
        (status = 302, description = "Redirects to `{APP_HOST}/payment?status=success&id={payment_id}`"),
        (status = 400, description = "external ID is required"),
        (status = 404, description = "No payment with this external ID"),
        (status = 409, description = "Payment is no longer pending"),
        (status = 500, description = "Failed to handle success callback")
    )
)]
async fn callback_success() {}

/// Provider failure callback
#[utoipa::path(
    get,
    path = "/payment/callbacks/failed/{external_id}",
    tag = "callbacks",
    params(
        ("external_id" = String, Path, description = "Provider reference; may instead be sent as `?id=` or `?externalId=` on `/payment/callbacks/failed`")
    ),
    responses(
        (status = 302, description = "Redirects to `{APP_HOST}/payment?status=failed&id={payment_id}`"),
        (status = 400, description = "external ID is required"),
        (status = 404, description = "No payment with this external ID"),
        (status = 409, description = "Payment is no longer pending"),
        (status = 500, description = "Failed to handle failed callback")
    )
)]
async fn callback_failed() {}

/// Landing page after a callback redirect
#[utoipa::path(
    get,
    path = "/payment/",
    tag = "payment",
    params(
        ("status" = Option<String>, Query, description = "`success` or `failed`"),
        ("id" = Option<String>, Query, description = "Payment ID")
    ),
    responses(
        (status = 200, description = "Echo of the query", body = PaymentLandingResponse)
    )
)]
async fn payment_landing() {}

/// OpenAPI documentation for the payment gateway.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Payment Gateway API",
        version = "1.0.0",
        description = "Routes deposits and withdrawals to banking providers by currency and country, and settles them from provider callbacks.\n\n## Authentication\n\nPayment creation requires the shared token in the `X-AUTH-TOKEN` header. Callbacks are unauthenticated.",
    ),
    paths(
        health,
        deposit,
        withdrawal,
        callback_success,
        callback_failed,
        payment_landing,
    ),
    components(
        schemas(
            PaymentRequest,
            PaymentUrlData,
            PaymentLandingResponse,
            PaymentType,
            PaymentStatus,
            CallbackOutcome,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "payment", description = "Deposit and withdrawal creation"),
        (name = "callbacks", description = "Provider result notifications"),
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for the shared-token header.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "auth_token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-AUTH-TOKEN"))),
            );
        }
    }
}
