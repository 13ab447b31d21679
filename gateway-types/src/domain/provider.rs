//! Provider routing reference data.
//!
//! These rows are administered outside the gateway; the core only reads them.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A named banking partner such as `HSBC` or `ADCB`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Provider {
    pub id: i64,
    #[schema(example = "HSBC")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Country {
    pub id: i64,
    pub name: String,
    /// ISO 3166-1 alpha-2
    #[schema(example = "US")]
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Currency {
    pub id: i64,
    pub name: String,
    /// ISO 4217
    #[schema(example = "USD")]
    pub code: String,
}

/// Priority-ordered binding of (country, currency) to a provider endpoint.
///
/// For one pair, the lowest `priority` wins and ties go to the lowest `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProviderConfiguration {
    pub id: i64,
    pub country_id: i64,
    pub currency_id: i64,
    pub provider_id: i64,
    /// Provider name, joined in for adapter dispatch
    #[schema(example = "HSBC")]
    pub provider_name: String,
    #[schema(example = "http://localhost:8081")]
    pub base_url: String,
    /// 1 is the most preferred
    pub priority: i32,
}

/// What a provider hands back for a new payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    /// Where the end user is sent to complete the payment
    pub redirect_url: String,
    /// Provider's own reference, echoed later in callbacks
    pub external_id: String,
}
