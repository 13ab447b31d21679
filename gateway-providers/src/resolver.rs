//! Provider Resolver: (currency, country) to the authoritative configuration.

use std::sync::Arc;

use gateway_types::{
    GatewayError, Provider, ProviderConfigRepository, ProviderConfiguration, RequestContext,
};

/// Read-only view over the routing tables.
pub struct ProviderResolver<C> {
    store: Arc<C>,
}

impl<C> Clone for ProviderResolver<C> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<C: ProviderConfigRepository> ProviderResolver<C> {
    pub fn new(store: Arc<C>) -> Self {
        Self { store }
    }

    /// Returns the lowest-priority configuration for the pair, lowest ID on ties.
    #[tracing::instrument(skip(self, ctx), fields(request_id = %ctx.request_id()))]
    pub async fn find_provider_config(
        &self,
        ctx: &RequestContext,
        currency_code: &str,
        country_code: &str,
    ) -> Result<ProviderConfiguration, GatewayError> {
        match self
            .store
            .find_provider_config(currency_code, country_code)
            .await
        {
            Ok(Some(config)) => {
                tracing::debug!(
                    provider = %config.provider_name,
                    priority = config.priority,
                    config_id = config.id,
                    "Resolved provider configuration"
                );
                Ok(config)
            }
            Ok(None) => {
                tracing::info!("No provider configured for currency/country");
                Err(GatewayError::NotFound(format!(
                    "no provider configuration for {}/{}",
                    currency_code, country_code
                )))
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load provider configuration");
                Err(GatewayError::Store(e))
            }
        }
    }

    #[tracing::instrument(skip(self, ctx), fields(request_id = %ctx.request_id()))]
    pub async fn find_provider_by_name(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> Result<Provider, GatewayError> {
        self.store
            .find_provider_by_name(name)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("provider {}", name)))
    }

    /// Every provider name the routing table references.
    pub async fn list_provider_names(&self) -> Result<Vec<String>, GatewayError> {
        Ok(self.store.list_provider_names().await?)
    }
}
