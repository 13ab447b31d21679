//! HTTP Server configuration and startup.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::Request,
    middleware,
    routing::{get, post},
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use gateway_types::{AdapterFactory, PaymentRepository, ProviderConfigRepository};

use super::auth::{TokenDigest, auth_middleware};
use super::handlers::{self, AppState};
use crate::openapi::ApiDoc;

/// HTTP Server for the payment gateway.
pub struct HttpServer<R, C, F> {
    state: Arc<AppState<R, C, F>>,
    token: Arc<TokenDigest>,
}

impl<R, C, F> HttpServer<R, C, F>
where
    R: PaymentRepository,
    C: ProviderConfigRepository,
    F: AdapterFactory,
{
    /// Creates a server guarding payment creation with `auth_token`.
    pub fn new(state: AppState<R, C, F>, auth_token: &str) -> Self {
        Self {
            state: Arc::new(state),
            token: Arc::new(TokenDigest::new(auth_token)),
        }
    }

    /// Builds the Axum router with all routes.
    pub fn router(&self) -> Router {
        // Build HTTP metrics layer (uses globally set MeterProvider)
        let metrics = axum_otel_metrics::HttpMetricsLayerBuilder::new().build();

        let protected = Router::new()
            .route("/payment/deposit", post(handlers::deposit::<R, C, F>))
            .route("/payment/withdrawal", post(handlers::withdrawal::<R, C, F>))
            .route_layer(middleware::from_fn_with_state(
                self.token.clone(),
                auth_middleware,
            ));

        Router::new()
            .route("/health", get(handlers::health))
            .route("/payment", get(handlers::payment_landing))
            .route("/payment/", get(handlers::payment_landing))
            .route(
                "/payment/callbacks/success",
                get(handlers::callback_success::<R, C, F>),
            )
            .route(
                "/payment/callbacks/success/{external_id}",
                get(handlers::callback_success_by_path::<R, C, F>),
            )
            .route(
                "/payment/callbacks/failed",
                get(handlers::callback_failed::<R, C, F>),
            )
            .route(
                "/payment/callbacks/failed/{external_id}",
                get(handlers::callback_failed_by_path::<R, C, F>),
            )
            .merge(protected)
            .with_state(self.state.clone())
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
            .layer(metrics)
            .layer(
                TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                    let request_id = req
                        .headers()
                        .get("x-request-id")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("-");
                    tracing::info_span!(
                        "http_request",
                        method = %req.method(),
                        uri = %req.uri(),
                        request_id = %request_id,
                    )
                }),
            )
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Runs the server on the given address with graceful shutdown.
    pub async fn run(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Server listening on {}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown...");
}
