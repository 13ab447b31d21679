//! Adapter Factory: closed registry from provider name to adapter.

use std::fmt;

use gateway_types::{
    AdapterFactory, GatewayError, ProviderAdapter, ProviderConfigRepository,
    ProviderConfiguration, RequestContext,
};

use crate::adcb::AdcbAdapter;
use crate::credentials::ProviderCredentials;
use crate::hsbc::HsbcAdapter;
use crate::resolver::ProviderResolver;

/// Every provider the gateway has an adapter for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Hsbc,
    Adcb,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Hsbc, ProviderKind::Adcb];

    /// Matches the name stored in `payment_providers.name`. Case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Hsbc => "HSBC",
            ProviderKind::Adcb => "ADCB",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Builds a fresh adapter per call from the resolved configuration.
pub struct ProviderAdapterFactory<C> {
    resolver: ProviderResolver<C>,
    credentials: ProviderCredentials,
    client: reqwest::Client,
}

impl<C: ProviderConfigRepository> ProviderAdapterFactory<C> {
    pub fn new(
        resolver: ProviderResolver<C>,
        credentials: ProviderCredentials,
        client: reqwest::Client,
    ) -> Self {
        Self {
            resolver,
            credentials,
            client,
        }
    }

    /// Constructs the adapter for an already-resolved configuration.
    pub fn adapter_for(
        &self,
        config: &ProviderConfiguration,
    ) -> Result<Box<dyn ProviderAdapter>, GatewayError> {
        let kind = ProviderKind::from_name(&config.provider_name)
            .ok_or_else(|| GatewayError::UnsupportedProvider(config.provider_name.clone()))?;
        let credentials = self.credentials.for_kind(kind).clone();
        let client = self.client.clone();

        let adapter: Box<dyn ProviderAdapter> = match kind {
            ProviderKind::Hsbc => Box::new(HsbcAdapter::new(client, &config.base_url, credentials)),
            ProviderKind::Adcb => Box::new(AdcbAdapter::new(client, &config.base_url, credentials)),
        };
        Ok(adapter)
    }

    /// Provider names present in the routing table that have no adapter.
    pub async fn unsupported_providers(&self) -> Result<Vec<String>, GatewayError> {
        let names = self.resolver.list_provider_names().await?;
        Ok(names
            .into_iter()
            .filter(|name| ProviderKind::from_name(name).is_none())
            .collect())
    }
}

#[async_trait::async_trait]
impl<C: ProviderConfigRepository> AdapterFactory for ProviderAdapterFactory<C> {
    #[tracing::instrument(skip(self, ctx), fields(request_id = %ctx.request_id()))]
    async fn get_adapter(
        &self,
        ctx: &RequestContext,
        currency_code: &str,
        country_code: &str,
    ) -> Result<Box<dyn ProviderAdapter>, GatewayError> {
        let config = self
            .resolver
            .find_provider_config(ctx, currency_code, country_code)
            .await?;

        match self.adapter_for(&config) {
            Ok(adapter) => {
                tracing::debug!(provider = adapter.name(), base_url = %config.base_url, "Adapter selected");
                Ok(adapter)
            }
            Err(e) => {
                tracing::warn!(provider = %config.provider_name, "No adapter for configured provider");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::credentials::Credentials;
    use crate::test_support::{MemoryConfigStore, client, config, spawn_provider};
    use axum::http::StatusCode;
    use gateway_types::{Amount, PaymentType};

    fn factory(store: MemoryConfigStore) -> ProviderAdapterFactory<MemoryConfigStore> {
        ProviderAdapterFactory::new(
            ProviderResolver::new(Arc::new(store)),
            ProviderCredentials {
                hsbc: Credentials::new("h", "hs"),
                adcb: Credentials::new("a", "as"),
            },
            client(),
        )
    }

    #[test]
    fn test_kind_lookup_is_exact() {
        assert_eq!(ProviderKind::from_name("HSBC"), Some(ProviderKind::Hsbc));
        assert_eq!(ProviderKind::from_name("ADCB"), Some(ProviderKind::Adcb));
        assert_eq!(ProviderKind::from_name("hsbc"), None);
        assert_eq!(ProviderKind::from_name("CITI"), None);
    }

    #[tokio::test]
    async fn test_hsbc_adapter_speaks_json() {
        let (base, rec) = spawn_provider(
            "/hsbc/payment",
            StatusCode::OK,
            r#"{"url":"u","external_id":"e"}"#,
        )
        .await;
        let f = factory(MemoryConfigStore::default().with("USD", "US", config(1, "HSBC", &base, 1)));
        let ctx = RequestContext::new();

        let adapter = f.get_adapter(&ctx, "USD", "US").await.unwrap();
        assert_eq!(adapter.name(), "HSBC");
        adapter
            .get_details(&ctx, Amount::from_minor(4000).unwrap(), PaymentType::Deposit, "USD", "US")
            .await
            .unwrap();
        assert_eq!(rec.last_header("content-type").as_deref(), Some("application/json"));
    }

    #[tokio::test]
    async fn test_adcb_adapter_speaks_xml() {
        let (base, rec) = spawn_provider(
            "/adcb/payment",
            StatusCode::OK,
            "<PaymentResponse><URL>u</URL><ExternalID>e</ExternalID></PaymentResponse>",
        )
        .await;
        let f = factory(MemoryConfigStore::default().with("AED", "AE", config(1, "ADCB", &base, 1)));
        let ctx = RequestContext::new();

        let adapter = f.get_adapter(&ctx, "AED", "AE").await.unwrap();
        assert_eq!(adapter.name(), "ADCB");
        adapter
            .get_details(&ctx, Amount::from_minor(4000).unwrap(), PaymentType::Deposit, "AED", "AE")
            .await
            .unwrap();
        assert_eq!(rec.last_header("content-type").as_deref(), Some("application/xml"));
    }

    #[tokio::test]
    async fn test_unknown_provider_is_unsupported_without_network() {
        let (base, rec) = spawn_provider("/citi/payment", StatusCode::OK, "").await;
        let f = factory(MemoryConfigStore::default().with("GBP", "GB", config(3, "CITI", &base, 1)));

        let result = f.get_adapter(&RequestContext::new(), "GBP", "GB").await;
        assert!(matches!(result, Err(GatewayError::UnsupportedProvider(name)) if name == "CITI"));
        assert_eq!(rec.hits(), 0);
    }

    #[tokio::test]
    async fn test_unresolvable_pair_is_not_found() {
        let f = factory(MemoryConfigStore::default());
        let result = f.get_adapter(&RequestContext::new(), "USD", "US").await;
        assert!(matches!(result, Err(GatewayError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_unsupported_providers_listing() {
        let f = factory(
            MemoryConfigStore::default()
                .with("USD", "US", config(1, "HSBC", "http://h", 1))
                .with("GBP", "GB", config(2, "CITI", "http://c", 1)),
        );
        assert_eq!(f.unsupported_providers().await.unwrap(), vec!["CITI".to_string()]);
    }
}
