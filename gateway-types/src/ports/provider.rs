//! Provider adapter ports.
//!
//! One adapter per banking partner; the factory picks one per request.

use crate::context::RequestContext;
use crate::domain::{Amount, PaymentDetails, PaymentType};
use crate::error::{GatewayError, ProviderError};

/// Translates a generic payment into one provider's wire format.
#[async_trait::async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Name this adapter is registered under, e.g. `HSBC`.
    fn name(&self) -> &'static str;

    /// Asks the provider for a redirect URL and its own reference.
    ///
    /// Issues at most one request and never retries. Must return
    /// [`ProviderError::Cancelled`] without dialing if `ctx` is already cancelled.
    async fn get_details(
        &self,
        ctx: &RequestContext,
        amount: Amount,
        payment_type: PaymentType,
        currency_code: &str,
        country_code: &str,
    ) -> Result<PaymentDetails, ProviderError>;
}

/// Resolves the provider for a (currency, country) pair and builds its adapter.
#[async_trait::async_trait]
pub trait AdapterFactory: Send + Sync + 'static {
    async fn get_adapter(
        &self,
        ctx: &RequestContext,
        currency_code: &str,
        country_code: &str,
    ) -> Result<Box<dyn ProviderAdapter>, GatewayError>;
}
