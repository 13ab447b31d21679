//! HSBC adapter: JSON over HTTP.

use gateway_types::{
    Amount, PaymentDetails, PaymentType, ProviderAdapter, ProviderError, RequestContext,
};
use serde::{Deserialize, Serialize};

use crate::credentials::Credentials;
use crate::transport;

const NAME: &str = "HSBC";

/// Request body. Field order is the wire order.
#[derive(Debug, Serialize)]
struct HsbcPaymentRequest<'a> {
    amount: Amount,
    country: &'a str,
    currency: &'a str,
    payment_type: PaymentType,
}

#[derive(Debug, Deserialize)]
struct HsbcPaymentResponse {
    #[serde(default)]
    url: String,
    #[serde(default)]
    external_id: String,
}

/// Posts `{amount, country, currency, payment_type}` to `{base_url}/hsbc/payment`.
pub struct HsbcAdapter {
    client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl HsbcAdapter {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/hsbc/payment", self.base_url)
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for HsbcAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    #[tracing::instrument(name = "hsbc.get_details", skip(self, ctx), fields(request_id = %ctx.request_id()))]
    async fn get_details(
        &self,
        ctx: &RequestContext,
        amount: Amount,
        payment_type: PaymentType,
        currency_code: &str,
        country_code: &str,
    ) -> Result<PaymentDetails, ProviderError> {
        let body = serde_json::to_string(&HsbcPaymentRequest {
            amount,
            country: country_code,
            currency: currency_code,
            payment_type,
        })
        .map_err(|e| ProviderError::Encode(e.to_string()))?;

        let raw = transport::post(
            &self.client,
            ctx,
            NAME,
            &self.endpoint(),
            &self.credentials,
            "application/json",
            body,
        )
        .await?;

        let response: HsbcPaymentResponse =
            serde_json::from_str(&raw).map_err(|e| ProviderError::Decode(e.to_string()))?;
        let details = transport::require_details(NAME, response.url, response.external_id)?;

        tracing::info!(external_id = %details.external_id, "HSBC returned payment details");
        Ok(details)
    }
}
