//! ADCB adapter: XML over HTTP.

use gateway_types::{
    Amount, PaymentDetails, PaymentType, ProviderAdapter, ProviderError, RequestContext,
};
use serde::{Deserialize, Serialize};

use crate::credentials::Credentials;
use crate::transport;

const NAME: &str = "ADCB";
const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

#[derive(Debug, Serialize)]
struct AdcbPaymentRequest<'a> {
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "PaymentType")]
    payment_type: &'static str,
    #[serde(rename = "Currency")]
    currency: &'a str,
    #[serde(rename = "Country")]
    country: &'a str,
}

#[derive(Debug, Deserialize)]
struct AdcbPaymentResponse {
    #[serde(rename = "URL", default)]
    url: String,
    #[serde(rename = "ExternalID", default)]
    external_id: String,
}

/// Posts a `<PaymentRequest>` document to `{base_url}/adcb/payment`.
pub struct AdcbAdapter {
    client: reqwest::Client,
    base_url: String,
    credentials: Credentials,
}

impl AdcbAdapter {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/adcb/payment", self.base_url)
    }

    fn encode(
        amount: Amount,
        payment_type: PaymentType,
        currency_code: &str,
        country_code: &str,
    ) -> Result<String, ProviderError> {
        let request = AdcbPaymentRequest {
            amount: amount.to_wire_string(),
            payment_type: payment_type.as_str(),
            currency: currency_code,
            country: country_code,
        };
        let xml = quick_xml::se::to_string_with_root("PaymentRequest", &request)
            .map_err(|e| ProviderError::Encode(e.to_string()))?;
        Ok(format!("{}\n{}", XML_DECLARATION, xml))
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for AdcbAdapter {
    fn name(&self) -> &'static str {
        NAME
    }

    #[tracing::instrument(name = "adcb.get_details", skip(self, ctx), fields(request_id = %ctx.request_id()))]
    async fn get_details(
        &self,
        ctx: &RequestContext,
        amount: Amount,
        payment_type: PaymentType,
        currency_code: &str,
        country_code: &str,
    ) -> Result<PaymentDetails, ProviderError> {
        let body = Self::encode(amount, payment_type, currency_code, country_code)?;

        let raw = transport::post(
            &self.client,
            ctx,
            NAME,
            &self.endpoint(),
            &self.credentials,
            "application/xml",
            body,
        )
        .await?;

        let response: AdcbPaymentResponse =
            quick_xml::de::from_str(&raw).map_err(|e| ProviderError::Decode(e.to_string()))?;
        let details = transport::require_details(NAME, response.url, response.external_id)?;

        tracing::info!(external_id = %details.external_id, "ADCB returned payment details");
        Ok(details)
    }
}
