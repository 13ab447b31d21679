//! HTTP request handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};

use gateway_types::{
    AdapterFactory, ApiResponse, AppError, CallbackOutcome, CallbackQuery, FieldErrors,
    PaymentLandingQuery, PaymentLandingResponse, PaymentRepository, PaymentRequest, PaymentType,
    PaymentUrlData, ProviderConfigRepository, RequestContext, payment_success_message,
};

use crate::PaymentService;

/// Application state shared across handlers.
pub struct AppState<R, C, F> {
    pub service: PaymentService<R, C, F>,
    /// Base of the redirect sent to the user after a callback
    pub app_host: String,
    /// Upper bound on a single request's provider round trip
    pub request_timeout: Duration,
}

impl<R, C, F> AppState<R, C, F> {
    pub fn new(
        service: PaymentService<R, C, F>,
        app_host: impl Into<String>,
        request_timeout: Duration,
    ) -> Self {
        let app_host = app_host.into().trim_end_matches('/').to_string();
        Self {
            service,
            app_host,
            request_timeout,
        }
    }
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ApiResponse::error(msg)),
            AppError::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                ApiResponse::error("Validation failed").with_errors(errors),
            ),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, ApiResponse::error("Unauthorized")),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiResponse::error(msg)),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, ApiResponse::error(msg)),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, ApiResponse::error(msg)),
        };

        (status, Json(body)).into_response()
    }
}

/// Correlation ID stamped by the request-id layer, or `-`.
fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}

fn request_context(headers: &HeaderMap, timeout: Duration) -> RequestContext {
    RequestContext::new()
        .with_request_id(request_id(headers))
        .with_timeout(timeout)
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Payment creation
// ─────────────────────────────────────────────────────────────────────────────

/// Start a deposit and return the provider URL.
#[tracing::instrument(skip(state, headers, payload), fields(request_id = %request_id(&headers)))]
pub async fn deposit<R, C, F>(
    State(state): State<Arc<AppState<R, C, F>>>,
    headers: HeaderMap,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    R: PaymentRepository,
    C: ProviderConfigRepository,
    F: AdapterFactory,
{
    create_payment(&state, &headers, payload, PaymentType::Deposit).await
}

/// Start a withdrawal and return the provider URL.
#[tracing::instrument(skip(state, headers, payload), fields(request_id = %request_id(&headers)))]
pub async fn withdrawal<R, C, F>(
    State(state): State<Arc<AppState<R, C, F>>>,
    headers: HeaderMap,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
    R: PaymentRepository,
    C: ProviderConfigRepository,
    F: AdapterFactory,
{
    create_payment(&state, &headers, payload, PaymentType::Withdrawal).await
}

async fn create_payment<R, C, F>(
    state: &AppState<R, C, F>,
    headers: &HeaderMap,
    payload: Result<Json<PaymentRequest>, JsonRejection>,
    payment_type: PaymentType,
) -> Result<Json<ApiResponse<PaymentUrlData>>, ApiError>
where
    R: PaymentRepository,
    C: ProviderConfigRepository,
    F: AdapterFactory,
{
    let Json(body) = payload.map_err(|rejection| {
        let mut errors = FieldErrors::new();
        errors.insert("validation".into(), vec![rejection.body_text()]);
        AppError::Validation(errors)
    })?;
    let req = body.validate().map_err(AppError::Validation)?;

    tracing::info!(
        user_id = req.user_id,
        amount = %req.amount,
        currency = %req.currency_code,
        country = %req.country_code,
        payment_type = %payment_type,
        "Received payment request"
    );

    let ctx = request_context(headers, state.request_timeout);
    let url = state
        .service
        .create_payment(&ctx, req, payment_type)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create payment");
            AppError::Internal("Failed to create payment".into())
        })?;

    Ok(Json(ApiResponse::success(
        payment_success_message(payment_type),
        PaymentUrlData { url },
    )))
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider callbacks
// ─────────────────────────────────────────────────────────────────────────────

/// Provider reports success, reference in the query.
#[tracing::instrument(skip(state, headers), fields(request_id = %request_id(&headers)))]
pub async fn callback_success<R, C, F>(
    State(state): State<Arc<AppState<R, C, F>>>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, ApiError>
where
    R: PaymentRepository,
    C: ProviderConfigRepository,
    F: AdapterFactory,
{
    handle_callback(&state, &headers, None, query, CallbackOutcome::Success).await
}

/// Provider reports success, reference in the path.
#[tracing::instrument(skip(state, headers), fields(request_id = %request_id(&headers)))]
pub async fn callback_success_by_path<R, C, F>(
    State(state): State<Arc<AppState<R, C, F>>>,
    headers: HeaderMap,
    Path(external_id): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, ApiError>
where
    R: PaymentRepository,
    C: ProviderConfigRepository,
    F: AdapterFactory,
{
    handle_callback(
        &state,
        &headers,
        Some(external_id),
        query,
        CallbackOutcome::Success,
    )
    .await
}

/// Provider reports failure, reference in the query.
#[tracing::instrument(skip(state, headers), fields(request_id = %request_id(&headers)))]
pub async fn callback_failed<R, C, F>(
    State(state): State<Arc<AppState<R, C, F>>>,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, ApiError>
where
    R: PaymentRepository,
    C: ProviderConfigRepository,
    F: AdapterFactory,
{
    handle_callback(&state, &headers, None, query, CallbackOutcome::Failed).await
}

/// Provider reports failure, reference in the path.
#[tracing::instrument(skip(state, headers), fields(request_id = %request_id(&headers)))]
pub async fn callback_failed_by_path<R, C, F>(
    State(state): State<Arc<AppState<R, C, F>>>,
    headers: HeaderMap,
    Path(external_id): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Result<Response, ApiError>
where
    R: PaymentRepository,
    C: ProviderConfigRepository,
    F: AdapterFactory,
{
    handle_callback(
        &state,
        &headers,
        Some(external_id),
        query,
        CallbackOutcome::Failed,
    )
    .await
}

/// Path segment first, then `?id=`, then `?externalId=`.
fn extract_external_id(path: Option<String>, query: CallbackQuery) -> Result<String, AppError> {
    [path, query.id, query.external_id]
        .into_iter()
        .flatten()
        .find(|id| !id.is_empty())
        .ok_or_else(|| AppError::BadRequest("external ID is required".into()))
}

async fn handle_callback<R, C, F>(
    state: &AppState<R, C, F>,
    headers: &HeaderMap,
    path: Option<String>,
    query: CallbackQuery,
    outcome: CallbackOutcome,
) -> Result<Response, ApiError>
where
    R: PaymentRepository,
    C: ProviderConfigRepository,
    F: AdapterFactory,
{
    let external_id = extract_external_id(path, query)?;
    let ctx = request_context(headers, state.request_timeout);

    let payment = state
        .service
        .handle_callback(&ctx, &external_id, outcome)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::Internal(_) => AppError::Internal(format!(
                "Failed to handle {} callback",
                outcome.redirect_tag()
            )),
            other => other,
        })?;

    let location = format!(
        "{}/payment?status={}&id={}",
        state.app_host,
        outcome.redirect_tag(),
        payment.id
    );
    tracing::info!(payment_id = %payment.id, %location, "Redirecting user");

    Ok((StatusCode::FOUND, [(header::LOCATION, location)]).into_response())
}

// ─────────────────────────────────────────────────────────────────────────────
// Landing page
// ─────────────────────────────────────────────────────────────────────────────

/// Target of the post-callback redirect; echoes its query.
pub async fn payment_landing(Query(query): Query<PaymentLandingQuery>) -> impl IntoResponse {
    Json(PaymentLandingResponse {
        status: query.status.unwrap_or_default(),
        id: query.id.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(id: Option<&str>, external_id: Option<&str>) -> CallbackQuery {
        CallbackQuery {
            id: id.map(String::from),
            external_id: external_id.map(String::from),
        }
    }

    #[test]
    fn test_path_segment_wins() {
        let id = extract_external_id(Some("p".into()), query(Some("q"), Some("e"))).unwrap();
        assert_eq!(id, "p");
    }

    #[test]
    fn test_falls_back_to_id_then_external_id() {
        assert_eq!(
            extract_external_id(None, query(Some("q"), Some("e"))).unwrap(),
            "q"
        );
        assert_eq!(
            extract_external_id(Some(String::new()), query(None, Some("e"))).unwrap(),
            "e"
        );
    }

    #[test]
    fn test_missing_external_id() {
        let err = extract_external_id(None, query(None, Some(""))).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "external ID is required"));
    }

    #[test]
    fn test_request_id_defaults_to_dash() {
        let headers = HeaderMap::new();
        assert_eq!(request_id(&headers), "-");
    }
}
