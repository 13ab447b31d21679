//! Payment domain model and its status lifecycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::amount::Amount;
use crate::error::DomainError;

/// Unique identifier for a Payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct PaymentId(Uuid);

impl PaymentId {
    /// Creates a new random PaymentId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a PaymentId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns the UUID value.
    pub fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for PaymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PaymentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Direction of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    /// Money coming in from the user's bank
    Deposit,
    /// Money leaving to the user's bank
    Withdrawal,
}

impl PaymentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Deposit => "DEPOSIT",
            PaymentType::Withdrawal => "WITHDRAWAL",
        }
    }
}

impl std::fmt::Display for PaymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DEPOSIT" => Ok(PaymentType::Deposit),
            "WITHDRAWAL" => Ok(PaymentType::Withdrawal),
            other => Err(DomainError::ValidationError(format!(
                "Unknown payment type: {}",
                other
            ))),
        }
    }
}

/// Lifecycle status of a payment.
///
/// `INITIALIZED -> PENDING -> {SUCCESS, FAILED}`. The last two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Initialized,
    Pending,
    Success,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Initialized => "INITIALIZED",
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Success => "SUCCESS",
            PaymentStatus::Failed => "FAILED",
        }
    }

    /// Returns true for statuses no transition may leave.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PaymentStatus::Success | PaymentStatus::Failed)
    }

    /// Returns true if moving from `self` to `next` is a legal step of the lifecycle.
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        matches!(
            (self, next),
            (PaymentStatus::Initialized, PaymentStatus::Pending)
                | (PaymentStatus::Pending, PaymentStatus::Success)
                | (PaymentStatus::Pending, PaymentStatus::Failed)
        )
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INITIALIZED" => Ok(PaymentStatus::Initialized),
            "PENDING" => Ok(PaymentStatus::Pending),
            "SUCCESS" => Ok(PaymentStatus::Success),
            "FAILED" => Ok(PaymentStatus::Failed),
            other => Err(DomainError::ValidationError(format!(
                "Unknown payment status: {}",
                other
            ))),
        }
    }
}

/// Result reported by a provider callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CallbackOutcome {
    Success,
    Failed,
}

impl CallbackOutcome {
    /// The terminal status this outcome moves a payment to.
    pub fn status(&self) -> PaymentStatus {
        match self {
            CallbackOutcome::Success => PaymentStatus::Success,
            CallbackOutcome::Failed => PaymentStatus::Failed,
        }
    }

    /// Lowercase tag used in the user-facing redirect (`success` / `failed`).
    pub fn redirect_tag(&self) -> &'static str {
        match self {
            CallbackOutcome::Success => "success",
            CallbackOutcome::Failed => "failed",
        }
    }
}

impl std::fmt::Display for CallbackOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.status().as_str())
    }
}

/// One deposit or withdrawal attempt routed through a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier
    pub id: PaymentId,
    pub amount: Amount,
    pub payment_type: PaymentType,
    pub status: PaymentStatus,
    /// ISO 4217 currency code
    pub currency_code: String,
    pub user_id: i64,
    /// Provider chosen by the routing table
    pub provider_id: i64,
    /// Provider's own reference; absent only while `INITIALIZED`
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Creates a new payment in `INITIALIZED` status.
    pub fn initialize(
        user_id: i64,
        amount: Amount,
        payment_type: PaymentType,
        currency_code: impl Into<String>,
        provider_id: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PaymentId::new(),
            amount,
            payment_type,
            status: PaymentStatus::Initialized,
            currency_code: currency_code.into(),
            user_id,
            provider_id,
            external_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstructs a payment from database fields.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: PaymentId,
        amount: Amount,
        payment_type: PaymentType,
        status: PaymentStatus,
        currency_code: String,
        user_id: i64,
        provider_id: i64,
        external_id: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            amount,
            payment_type,
            status,
            currency_code,
            user_id,
            provider_id,
            external_id,
            created_at,
            updated_at,
        }
    }

    /// Records the provider's reference and moves the payment to `PENDING`.
    ///
    /// The external ID and the status change land together, so a
    /// `PENDING` payment always carries a non-empty external ID.
    pub fn mark_pending(&mut self, external_id: impl Into<String>) -> Result<(), DomainError> {
        let external_id = external_id.into();
        if external_id.trim().is_empty() {
            return Err(DomainError::ValidationError(
                "External ID cannot be empty".into(),
            ));
        }
        self.transition(PaymentStatus::Pending)?;
        self.external_id = Some(external_id);
        Ok(())
    }

    /// Applies a provider callback. Only `PENDING` payments accept one.
    pub fn apply_callback(&mut self, outcome: CallbackOutcome) -> Result<(), DomainError> {
        self.transition(outcome.status())
    }

    /// Stamps `updated_at` with the current time.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    fn transition(&mut self, next: PaymentStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.touch();
        Ok(())
    }
}
