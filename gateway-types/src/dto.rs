//! Data Transfer Objects (DTOs) for requests and responses.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Amount, PaymentType};

/// Field name to the messages describing what is wrong with it.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

// ─────────────────────────────────────────────────────────────────────────────
// Payment DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Body of `POST /payment/deposit` and `POST /payment/withdrawal`.
///
/// Every field is optional on the wire so that a missing field is reported
/// alongside the others instead of failing the whole decode.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PaymentRequest {
    #[schema(example = 1)]
    pub user_id: Option<i64>,
    /// Major units, must be greater than 1
    #[schema(example = 40)]
    pub amount: Option<f64>,
    #[schema(example = "USD")]
    pub currency_code: Option<String>,
    #[schema(example = "US")]
    pub country_code: Option<String>,
}

impl PaymentRequest {
    /// Checks every field and collects all failures.
    pub fn validate(self) -> Result<CreatePaymentRequest, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut push = |field: &str, msg: &str| {
            errors
                .entry(field.to_string())
                .or_default()
                .push(msg.to_string());
        };

        let user_id = match self.user_id {
            Some(id) if id != 0 => Some(id),
            _ => {
                push("user_id", "is required");
                None
            }
        };

        let amount = match self.amount {
            None => {
                push("amount", "is required");
                None
            }
            // Compared after rounding to cents so 1.004 does not slip through.
            Some(a) => match Amount::from_major(a) {
                Ok(amount) if amount.exceeds_major(1) => Some(amount),
                Err(_) if !a.is_finite() || a > 1.0 => {
                    push("amount", "is invalid");
                    None
                }
                _ => {
                    push("amount", "must be greater than 1");
                    None
                }
            },
        };

        let currency_code = exact_len(self.currency_code, 3, "currency_code", &mut push);
        let country_code = exact_len(self.country_code, 2, "country_code", &mut push);

        match (user_id, amount, currency_code, country_code) {
            (Some(user_id), Some(amount), Some(currency_code), Some(country_code)) => {
                Ok(CreatePaymentRequest {
                    user_id,
                    amount,
                    currency_code,
                    country_code,
                })
            }
            _ => Err(errors),
        }
    }
}

fn exact_len(
    value: Option<String>,
    len: usize,
    field: &str,
    push: &mut impl FnMut(&str, &str),
) -> Option<String> {
    match value {
        None => {
            push(field, "is required");
            None
        }
        Some(v) if v.is_empty() => {
            push(field, "is required");
            None
        }
        Some(v) if v.chars().count() != len => {
            push(field, &format!("must be exactly {} characters", len));
            None
        }
        Some(v) => Some(v),
    }
}

/// A payment request that passed validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    pub user_id: i64,
    pub amount: Amount,
    pub currency_code: String,
    pub country_code: String,
}

/// `data` of a successful deposit or withdrawal.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentUrlData {
    /// Provider page the user must visit
    #[schema(example = "https://hsbc.example/pay/abc")]
    pub url: String,
}

/// Response envelope shared by every JSON endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// `success` or `error`
    #[schema(example = "success")]
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success".into(),
            message: message.into(),
            errors: None,
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".into(),
            message: message.into(),
            errors: None,
            data: None,
        }
    }

    pub fn with_errors(mut self, errors: FieldErrors) -> Self {
        self.errors = Some(errors);
        self
    }
}

/// Success message for a created payment, e.g. `DEPOSIT successful`.
pub fn payment_success_message(payment_type: PaymentType) -> String {
    format!("{} successful", payment_type)
}

// ─────────────────────────────────────────────────────────────────────────────
// Callback DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Alternate places a provider may put its reference on a callback URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CallbackQuery {
    pub id: Option<String>,
    #[serde(rename = "externalId")]
    pub external_id: Option<String>,
}

/// Query of the landing page the user is redirected to.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PaymentLandingQuery {
    #[schema(example = "success")]
    pub status: Option<String>,
    pub id: Option<String>,
}

/// Echo of the redirect target's query.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentLandingResponse {
    pub status: String,
    pub id: String,
}
