//! PostgreSQL repository adapter.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use gateway_types::{
    Payment, PaymentId, PaymentRepository, PaymentStatus, PaymentUnitOfWork, Provider,
    ProviderConfigRepository, ProviderConfiguration, RepoError,
};

use crate::types::{
    DbPayment, DbProvider, DbProviderConfiguration, PAYMENT_COLUMNS, PROVIDER_CONFIG_SELECT,
};

// ─────────────────────────────────────────────────────────────────────────────
// PostgreSQL Repository
// ─────────────────────────────────────────────────────────────────────────────

/// PostgreSQL repository with row-level locking.
pub struct PostgresRepo {
    pool: PgPool,
}

/// Executes SQL statements from a migration file, splitting by semicolons.
async fn execute_migration(pool: &PgPool, sql: &str, name: &str) -> Result<(), anyhow::Error> {
    for statement in sql.split(';') {
        let stmt = statement.trim();
        if !stmt.is_empty() {
            sqlx::query(stmt)
                .execute(pool)
                .await
                .map_err(|e| anyhow::anyhow!("Migration {} failed: {}", name, e))?;
        }
    }
    Ok(())
}

/// Runs all database migrations.
async fn run_migrations(pool: &PgPool) -> Result<(), anyhow::Error> {
    execute_migration(
        pool,
        include_str!("../migrations/0001_create_routing_tables_pg.sql"),
        "0001",
    )
    .await?;

    execute_migration(
        pool,
        include_str!("../migrations/0002_create_payments_pg.sql"),
        "0002",
    )
    .await?;

    Ok(())
}

impl PostgresRepo {
    /// Creates a new PostgreSQL repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
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
impl PaymentRepository for PostgresRepo {
    async fn begin(&self) -> Result<Box<dyn PaymentUnitOfWork>, RepoError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;
        Ok(Box::new(PostgresUnitOfWork { tx }))
    }

    async fn find_by_external_id(&self, external_id: &str) -> Result<Option<Payment>, RepoError> {
        let row: Option<DbPayment> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE external_id = $1",
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
            "SELECT {} FROM payments WHERE id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(id.into_uuid())
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

fn update_query(
    payment: &Payment,
) -> sqlx::query::Query<'_, Postgres, sqlx::postgres::PgArguments> {
    sqlx::query(
        r#"UPDATE payments
           SET amount_minor = $2, payment_type = $3, status = $4, currency_code = $5,
               user_id = $6, provider_id = $7, external_id = $8, updated_at = $9
           WHERE id = $1"#,
    )
    .bind(payment.id.into_uuid())
    .bind(payment.amount.minor_units())
    .bind(payment.payment_type.as_str())
    .bind(payment.status.as_str())
    .bind(&payment.currency_code)
    .bind(payment.user_id)
    .bind(payment.provider_id)
    .bind(&payment.external_id)
    .bind(payment.updated_at)
}

// ─────────────────────────────────────────────────────────────────────────────
// Unit of work
// ─────────────────────────────────────────────────────────────────────────────

/// One PostgreSQL transaction. Dropped without commit, sqlx rolls it back.
pub struct PostgresUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl PaymentUnitOfWork for PostgresUnitOfWork {
    async fn insert_payment(&mut self, payment: &Payment) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO payments
               (id, amount_minor, payment_type, status, currency_code, user_id, provider_id,
                external_id, created_at, updated_at)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"#,
        )
        .bind(payment.id.into_uuid())
        .bind(payment.amount.minor_units())
        .bind(payment.payment_type.as_str())
        .bind(payment.status.as_str())
        .bind(&payment.currency_code)
        .bind(payment.user_id)
        .bind(payment.provider_id)
        .bind(&payment.external_id)
        .bind(payment.created_at)
        .bind(payment.updated_at)
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
        // Lock the row so concurrent callbacks for the same payment serialize here
        let row: Option<DbPayment> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE external_id = $1 FOR UPDATE",
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
        let result = sqlx::query(
            r#"UPDATE payments SET status = $3, updated_at = NOW() WHERE id = $1 AND status = $2"#,
        )
        .bind(id.into_uuid())
        .bind(from.as_str())
        .bind(to.as_str())
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
impl ProviderConfigRepository for PostgresRepo {
    async fn find_provider_config(
        &self,
        currency_code: &str,
        country_code: &str,
    ) -> Result<Option<ProviderConfiguration>, RepoError> {
        let row: Option<DbProviderConfiguration> = sqlx::query_as(&format!(
            "{} WHERE cu.code = $1 AND co.code = $2 ORDER BY pc.priority ASC, pc.id ASC LIMIT 1",
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
            sqlx::query_as(r#"SELECT id, name FROM payment_providers WHERE name = $1"#)
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
