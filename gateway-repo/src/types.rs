//! Shared database types with feature-gated fields for SQLite and PostgreSQL.

use sqlx::FromRow;

use gateway_types::{
    Amount, Payment, PaymentId, PaymentStatus, PaymentType, Provider, ProviderConfiguration,
    RepoError,
};

// ─────────────────────────────────────────────────────────────────────────────
// Feature-gated imports
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(feature = "postgres")]
use chrono::{DateTime, Utc};
#[cfg(feature = "postgres")]
use uuid::Uuid;

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs (derive FromRow for automatic mapping)
// ─────────────────────────────────────────────────────────────────────────────

/// Payment row from database.
#[derive(FromRow)]
pub struct DbPayment {
    #[cfg(feature = "postgres")]
    pub id: Uuid,
    #[cfg(not(feature = "postgres"))]
    pub id: String,

    pub amount_minor: i64,
    pub payment_type: String,
    pub status: String,
    pub currency_code: String,
    pub user_id: i64,
    pub provider_id: i64,
    pub external_id: Option<String>,

    #[cfg(feature = "postgres")]
    pub created_at: DateTime<Utc>,
    #[cfg(not(feature = "postgres"))]
    pub created_at: String,

    #[cfg(feature = "postgres")]
    pub updated_at: DateTime<Utc>,
    #[cfg(not(feature = "postgres"))]
    pub updated_at: String,
}

impl DbPayment {
    pub fn into_domain(self) -> Result<Payment, RepoError> {
        let amount = Amount::from_minor(self.amount_minor)?;
        let payment_type: PaymentType = self.payment_type.parse()?;
        let status: PaymentStatus = self.status.parse()?;

        #[cfg(feature = "postgres")]
        let (id, created_at, updated_at) = (self.id, self.created_at, self.updated_at);

        #[cfg(not(feature = "postgres"))]
        let (id, created_at, updated_at) = {
            let uuid =
                uuid::Uuid::parse_str(&self.id).map_err(|e| RepoError::Database(e.to_string()))?;
            (uuid, parse_timestamp(&self.created_at)?, parse_timestamp(&self.updated_at)?)
        };

        Ok(Payment::from_parts(
            PaymentId::from_uuid(id),
            amount,
            payment_type,
            status,
            self.currency_code,
            self.user_id,
            self.provider_id,
            self.external_id,
            created_at,
            updated_at,
        ))
    }
}

#[cfg(not(feature = "postgres"))]
fn parse_timestamp(raw: &str) -> Result<chrono::DateTime<chrono::Utc>, RepoError> {
    Ok(chrono::DateTime::parse_from_rfc3339(raw)
        .map_err(|e| RepoError::Database(e.to_string()))?
        .with_timezone(&chrono::Utc))
}

/// Provider configuration joined with its provider name.
#[derive(FromRow)]
pub struct DbProviderConfiguration {
    pub id: i64,
    pub country_id: i64,
    pub currency_id: i64,
    pub provider_id: i64,
    pub provider_name: String,
    pub base_url: String,
    pub priority: i32,
}

impl DbProviderConfiguration {
    pub fn into_domain(self) -> ProviderConfiguration {
        ProviderConfiguration {
            id: self.id,
            country_id: self.country_id,
            currency_id: self.currency_id,
            provider_id: self.provider_id,
            provider_name: self.provider_name,
            base_url: self.base_url,
            priority: self.priority,
        }
    }
}

/// Provider row from database.
#[derive(FromRow)]
pub struct DbProvider {
    pub id: i64,
    pub name: String,
}

impl DbProvider {
    pub fn into_domain(self) -> Provider {
        Provider {
            id: self.id,
            name: self.name,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared SQL
// ─────────────────────────────────────────────────────────────────────────────

/// Column list matching [`DbPayment`].
pub const PAYMENT_COLUMNS: &str = "id, amount_minor, payment_type, status, currency_code, \
     user_id, provider_id, external_id, created_at, updated_at";

/// Routing query body; callers append their own placeholders.
pub const PROVIDER_CONFIG_SELECT: &str = "SELECT pc.id, pc.country_id, pc.currency_id, \
     pc.provider_id, pp.name AS provider_name, pc.base_url, pc.priority \
     FROM provider_configurations pc \
     JOIN currencies cu ON cu.id = pc.currency_id \
     JOIN countries co ON co.id = pc.country_id \
     JOIN payment_providers pp ON pp.id = pc.provider_id";
