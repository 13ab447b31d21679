//! Payment Orchestrator
//!
//! Runs the create-payment and callback workflows over the store and
//! provider ports. Contains NO infrastructure logic - pure orchestration.

use std::sync::Arc;
use std::time::Instant;

use gateway_providers::ProviderResolver;
use gateway_types::{
    AdapterFactory, CallbackOutcome, CreatePaymentRequest, GatewayError, Payment,
    PaymentRepository, PaymentStatus, PaymentType, PaymentUnitOfWork, ProviderAdapter,
    ProviderConfigRepository, RequestContext,
};

/// Application service for payment operations.
///
/// Generic over the store (`R`), the routing table (`C`) and the adapter
/// factory (`F`); all three are injected at compile time so tests can
/// swap in in-memory doubles.
pub struct PaymentService<R, C, F> {
    repo: Arc<R>,
    resolver: ProviderResolver<C>,
    factory: F,
}

impl<R, C, F> PaymentService<R, C, F>
where
    R: PaymentRepository,
    C: ProviderConfigRepository,
    F: AdapterFactory,
{
    pub fn new(repo: Arc<R>, resolver: ProviderResolver<C>, factory: F) -> Self {
        Self {
            repo,
            resolver,
            factory,
        }
    }

    /// Returns a reference to the underlying store.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Create payment
    // ─────────────────────────────────────────────────────────────────────────────

    /// Routes the request to a provider and returns the provider's redirect URL.
    ///
    /// The insert, the provider call and the `PENDING` update share one store
    /// transaction: any failure after the insert leaves no row behind.
    #[tracing::instrument(
        skip(self, ctx, req),
        fields(
            request_id = %ctx.request_id(),
            user_id = req.user_id,
            currency = %req.currency_code,
            country = %req.country_code,
        )
    )]
    pub async fn create_payment(
        &self,
        ctx: &RequestContext,
        req: CreatePaymentRequest,
        payment_type: PaymentType,
    ) -> Result<String, GatewayError> {
        let started = Instant::now();

        // The factory resolves through the same query, ordered by
        // (priority, id), so both lookups land on the same configuration row.
        let config = self
            .resolver
            .find_provider_config(ctx, &req.currency_code, &req.country_code)
            .await?;
        let adapter = self
            .factory
            .get_adapter(ctx, &req.currency_code, &req.country_code)
            .await?;

        let mut uow = self.repo.begin().await?;
        let outcome = run_create(
            ctx,
            uow.as_mut(),
            adapter.as_ref(),
            &req,
            payment_type,
            config.provider_id,
        )
        .await;

        match outcome {
            Ok((payment, url)) => {
                uow.commit().await?;
                tracing::info!(
                    payment_id = %payment.id,
                    provider = adapter.name(),
                    external_id = payment.external_id.as_deref().unwrap_or_default(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Payment created"
                );
                Ok(url)
            }
            Err(e) => {
                tracing::error!(provider = adapter.name(), error = %e, "Payment creation failed, rolling back");
                if let Err(rollback_err) = uow.rollback().await {
                    tracing::error!(error = %rollback_err, "Rollback failed");
                }
                Err(e)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Callbacks
    // ─────────────────────────────────────────────────────────────────────────────

    /// Applies a provider callback to the `PENDING` payment it refers to.
    ///
    /// A callback for a payment in any other status is rejected with
    /// [`GatewayError::StaleTransition`] and nothing is written.
    #[tracing::instrument(skip(self, ctx), fields(request_id = %ctx.request_id()))]
    pub async fn handle_callback(
        &self,
        ctx: &RequestContext,
        external_id: &str,
        outcome: CallbackOutcome,
    ) -> Result<Payment, GatewayError> {
        let mut uow = self.repo.begin().await?;

        match run_callback(uow.as_mut(), external_id, outcome).await {
            Ok(payment) => {
                uow.commit().await?;
                tracing::info!(payment_id = %payment.id, status = %payment.status, "Callback applied");
                Ok(payment)
            }
            Err(e) => {
                match &e {
                    GatewayError::StaleTransition(status) => {
                        tracing::info!(current = %status, "Ignoring callback for settled payment")
                    }
                    GatewayError::NotFound(_) => tracing::warn!("Callback for unknown payment"),
                    other => tracing::error!(error = %other, "Callback handling failed"),
                }
                if let Err(rollback_err) = uow.rollback().await {
                    tracing::error!(error = %rollback_err, "Rollback failed");
                }
                Err(e)
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────────

    /// Persists `payment`, refreshing its `updated_at` first.
    #[tracing::instrument(skip(self, ctx, payment), fields(request_id = %ctx.request_id(), payment_id = %payment.id))]
    pub async fn update_payment(
        &self,
        ctx: &RequestContext,
        payment: &mut Payment,
    ) -> Result<(), GatewayError> {
        payment.touch();
        self.repo.update_payment(payment).await.map_err(Into::into)
    }

    /// Looks a payment up by the provider's reference. No row is `Ok(None)`.
    #[tracing::instrument(skip(self, ctx), fields(request_id = %ctx.request_id()))]
    pub async fn find_payment_by_external_id(
        &self,
        ctx: &RequestContext,
        external_id: &str,
    ) -> Result<Option<Payment>, GatewayError> {
        self.repo
            .find_by_external_id(external_id)
            .await
            .map_err(Into::into)
    }
}

async fn run_create(
    ctx: &RequestContext,
    uow: &mut dyn PaymentUnitOfWork,
    adapter: &dyn ProviderAdapter,
    req: &CreatePaymentRequest,
    payment_type: PaymentType,
    provider_id: i64,
) -> Result<(Payment, String), GatewayError> {
    let mut payment = Payment::initialize(
        req.user_id,
        req.amount,
        payment_type,
        req.currency_code.clone(),
        provider_id,
    );
    uow.insert_payment(&payment).await?;
    tracing::debug!(payment_id = %payment.id, "Payment initialized");

    let details = adapter
        .get_details(
            ctx,
            req.amount,
            payment_type,
            &req.currency_code,
            &req.country_code,
        )
        .await?;

    payment.mark_pending(details.external_id)?;
    uow.update_payment(&payment).await?;

    Ok((payment, details.redirect_url))
}

async fn run_callback(
    uow: &mut dyn PaymentUnitOfWork,
    external_id: &str,
    outcome: CallbackOutcome,
) -> Result<Payment, GatewayError> {
    let mut payment = uow
        .find_by_external_id_for_update(external_id)
        .await?
        .ok_or_else(|| GatewayError::NotFound(format!("payment with external id {}", external_id)))?;

    if payment.status != PaymentStatus::Pending {
        return Err(GatewayError::StaleTransition(payment.status));
    }

    let from = payment.status;
    payment.apply_callback(outcome)?;

    // The guarded update loses if another callback settled the row first
    if !uow
        .transition_status(payment.id, from, payment.status)
        .await?
    {
        let current = uow
            .find_by_external_id_for_update(external_id)
            .await?
            .map(|p| p.status)
            .unwrap_or(from);
        return Err(GatewayError::StaleTransition(current));
    }

    Ok(payment)
}
