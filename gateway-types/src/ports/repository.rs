//! Repository port traits.
//!
//! Adapters (Postgres, SQLite, in-memory mocks) implement these.

use crate::domain::{Payment, PaymentId, PaymentStatus, Provider, ProviderConfiguration};
use crate::error::RepoError;

/// Store for Payment rows.
///
/// Writes that must be atomic go through a [`PaymentUnitOfWork`] obtained
/// from [`PaymentRepository::begin`].
#[async_trait::async_trait]
pub trait PaymentRepository: Send + Sync + 'static {
    /// Opens a unit of work bound to one store transaction.
    async fn begin(&self) -> Result<Box<dyn PaymentUnitOfWork>, RepoError>;

    // ─────────────────────────────────────────────────────────────────────────────
    // Non-transactional accessors
    // ─────────────────────────────────────────────────────────────────────────────

    /// Finds a payment by the provider's reference. An absent row is `Ok(None)`.
    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Payment>, RepoError>;

    /// Gets a payment by ID.
    async fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>, RepoError>;

    /// Overwrites the mutable fields of an existing payment.
    async fn update_payment(&self, payment: &Payment) -> Result<(), RepoError>;
}

/// One store transaction over Payment rows.
///
/// Dropping a unit of work without calling [`commit`](Self::commit) rolls it back.
#[async_trait::async_trait]
pub trait PaymentUnitOfWork: Send {
    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), RepoError>;

    async fn update_payment(&mut self, payment: &Payment) -> Result<(), RepoError>;

    /// Reads a payment and locks its row until the unit ends, where the store supports it.
    async fn find_by_external_id_for_update(
        &mut self,
        external_id: &str,
    ) -> Result<Option<Payment>, RepoError>;

    /// Moves `id` from `from` to `to` only if it is still in `from`.
    ///
    /// Returns `false` when another writer got there first.
    async fn transition_status(
        &mut self,
        id: PaymentId,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> Result<bool, RepoError>;

    async fn commit(self: Box<Self>) -> Result<(), RepoError>;

    async fn rollback(self: Box<Self>) -> Result<(), RepoError>;
}

/// Read-only access to provider routing data.
#[async_trait::async_trait]
pub trait ProviderConfigRepository: Send + Sync + 'static {
    /// Highest-priority configuration for the pair, ties broken by lowest ID.
    async fn find_provider_config(
        &self,
        currency_code: &str,
        country_code: &str,
    ) -> Result<Option<ProviderConfiguration>, RepoError>;

    async fn find_provider_by_name(&self, name: &str) -> Result<Option<Provider>, RepoError>;

    /// Distinct provider names referenced by any configuration.
    async fn list_provider_names(&self) -> Result<Vec<String>, RepoError>;
}
