//! SQLite repository adapter.
#![allow(clippy::collapsible_if)]

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};

use gateway_types::{
    Payment, PaymentId, PaymentRepository, PaymentStatus, PaymentUnitOfWork, Provider,
    ProviderConfigRepository, ProviderConfiguration, RepoError,
};

use crate::types::{
    DbPayment, DbProvider, DbProviderConfiguration, PAYMENT_COLUMNS, PROVIDER_CONFIG_SELECT,
};

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
///
/// SQLite has no row locks; the compare-and-set in
/// [`PaymentUnitOfWork::transition_status`] carries the callback guard.
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

        // Ensure on-disk SQLite target directory exists
        if !in_memory {
            if let Some(path) = database_url.strip_prefix("sqlite://") {
                let path = path.split('?').next().unwrap_or(path);
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        // Every in-memory connection is its own database, so pin exactly one for the pool's life.
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new().connect_with(options).await?
        };

        let repo = Self { pool };
        repo.create_schema().await?;
        Ok(repo)
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the database schema (for testing with existing pool).
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        let ddl = include_str!("../migrations/0001_create_routing_tables.sql");
        sqlx::query(ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        let ddl_payments = include_str!("../migrations/0002_create_payments.sql");
        sqlx::query(ddl_payments)
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(())
    }
}

fn db_err(e: sqlx::Error) -> RepoError {
    RepoError::Database(e.to_string())
}

fn write_err(e: sqlx::Error) -> RepoError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepoError::Conflict(db.message().to_string())
        }
        _ => RepoError::Database(e.to_string()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Payment store
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl PaymentRepository for SqliteRepo {
    async fn begin(&self) -> Result<Box<dyn PaymentUnitOfWork>, RepoError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;
        Ok(Box::new(SqliteUnitOfWork { tx }))
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Payment>, RepoError> {
        let row: Option<DbPayment> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE external_id = ?",
            PAYMENT_COLUMNS
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(DbPayment::into_domain).transpose()
    }

    async fn get_payment(&self, id: PaymentId) -> Result<Option<Payment>, RepoError> {
        let row: Option<DbPayment> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE id = ?",
            PAYMENT_COLUMNS
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(DbPayment::into_domain).transpose()
    }

    async fn update_payment(&self, payment: &Payment) -> Result<(), RepoError> {
        let result = update_query(payment)
            .execute(&self.pool)
            .await
            .map_err(write_err)?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

fn update_query(payment: &Payment) -> sqlx::query::Query<'_, Sqlite, SqliteArguments<'_>> {
    sqlx::query(
        r#"UPDATE payments
           SET amount_minor = ?, payment_type = ?, status = ?, currency_code = ?,
               user_id = ?, provider_id = ?, external_id = ?, updated_at = ?
           WHERE id = ?"#,
    )
    .bind(payment.amount.minor_units())
    .bind(payment.payment_type.as_str())
    .bind(payment.status.as_str())
    .bind(&payment.currency_code)
    .bind(payment.user_id)
    .bind(payment.provider_id)
    .bind(&payment.external_id)
    .bind(payment.updated_at.to_rfc3339())
    .bind(payment.id.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Unit of work
// ─────────────────────────────────────────────────────────────────────────────

/// One SQLite transaction. Dropped without commit, sqlx rolls it back.
pub struct SqliteUnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl PaymentUnitOfWork for SqliteUnitOfWork {
    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO payments
               (id, amount_minor, payment_type, status, currency_code, user_id, provider_id,
                external_id, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(payment.id.to_string())
        .bind(payment.amount.minor_units())
        .bind(payment.payment_type.as_str())
        .bind(payment.status.as_str())
        .bind(&payment.currency_code)
        .bind(payment.user_id)
        .bind(payment.provider_id)
        .bind(&payment.external_id)
        .bind(payment.created_at.to_rfc3339())
        .bind(payment.updated_at.to_rfc3339())
        .execute(&mut *self.tx)
        .await
        .map_err(write_err)?;
        Ok(())
    }

    async fn update_payment(&mut self, payment: &Payment) -> Result<(), RepoError> {
        let result = update_query(payment)
            .execute(&mut *self.tx)
            .await
            .map_err(write_err)?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn find_by_external_id_for_update(
        &mut self,
        external_id: &str,
    ) -> Result<Option<Payment>, RepoError> {
        let row: Option<DbPayment> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE external_id = ?",
            PAYMENT_COLUMNS
        ))
        .bind(external_id)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_err)?;

        row.map(DbPayment::into_domain).transpose()
    }

    async fn transition_status(
        &mut self,
        id: PaymentId,
        from: PaymentStatus,
        to: PaymentStatus,
    ) -> Result<bool, RepoError> {
        let result =
            sqlx::query(r#"UPDATE payments SET status = ?, updated_at = ? WHERE id = ? AND status = ?"#)
                .bind(to.as_str())
                .bind(chrono::Utc::now().to_rfc3339())
                .bind(id.to_string())
                .bind(from.as_str())
                .execute(&mut *self.tx)
                .await
                .map_err(db_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn commit(self: Box<Self>) -> Result<(), RepoError> {
        self.tx
            .commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))
    }

    async fn rollback(self: Box<Self>) -> Result<(), RepoError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider routing
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl ProviderConfigRepository for SqliteRepo {
    async fn find_provider_config(
        &self,
        currency_code: &str,
        country_code: &str,
    ) -> Result<Option<ProviderConfiguration>, RepoError> {
        let row: Option<DbProviderConfiguration> = sqlx::query_as(&format!(
            "{} WHERE cu.code = ? AND co.code = ? ORDER BY pc.priority ASC, pc.id ASC LIMIT 1",
            PROVIDER_CONFIG_SELECT
        ))
        .bind(currency_code)
        .bind(country_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(DbProviderConfiguration::into_domain))
    }

    async fn find_provider_by_name(&self, name: &str) -> Result<Option<Provider>, RepoError> {
        let row: Option<DbProvider> =
            sqlx::query_as(r#"SELECT id, name FROM payment_providers WHERE name = ?"#)
                .bind(name)
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;

        Ok(row.map(DbProvider::into_domain))
    }

    async fn list_provider_names(&self) -> Result<Vec<String>, RepoError> {
        sqlx::query_scalar(
            r#"SELECT DISTINCT pp.name
               FROM provider_configurations pc
               JOIN payment_providers pp ON pp.id = pc.provider_id
               ORDER BY pp.name"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)
    }
}
