//! PostgreSQL transaction store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::StreamExt;
use purchases_common::{NewTransaction, Transaction, TransactionId};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, instrument};

use crate::error::{StoreError, StoreResult};
use crate::store::{TransactionStore, TransactionStream};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS purchase_transactions (
    id BIGSERIAL PRIMARY KEY,
    description VARCHAR(50) NOT NULL,
    amount NUMERIC NOT NULL CHECK (amount >= 0),
    record_date DATE NOT NULL
)";

const INSERT: &str = "INSERT INTO purchase_transactions (description, amount, record_date)
    VALUES ($1, $2, $3)
    RETURNING id, description, amount, record_date";

const SELECT_ONE: &str =
    "SELECT id, description, amount, record_date FROM purchase_transactions WHERE id = $1";

const SELECT_ALL: &str =
    "SELECT id, description, amount, record_date FROM purchase_transactions ORDER BY id";

#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: i64,
    description: String,
    amount: Decimal,
    record_date: NaiveDate,
}

impl From<TransactionRow> for Transaction {
    fn from(row: TransactionRow) -> Self {
        Transaction {
            id: TransactionId::new(row.id),
            description: row.description,
            amount: row.amount,
            record_date: row.record_date,
        }
    }
}

/// Store backed by a PostgreSQL table.
#[derive(Debug, Clone)]
pub struct PgTransactionStore {
    pool: PgPool,
}

impl PgTransactionStore {
    /// Wrap an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    ///
    /// Connections are established on first use; `acquire_timeout` bounds
    /// how long a query waits for one.
    pub fn connect_lazy(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_lazy(database_url)?;

        Ok(Self::new(pool))
    }

    /// Create the transactions table if it does not exist.
    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        info!("Transaction schema ready");
        Ok(())
    }

    /// Close the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl TransactionStore for PgTransactionStore {
    fn name(&self) -> &str {
        "POSTGRES"
    }

    async fn insert(&self, transaction: NewTransaction) -> StoreResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(INSERT)
            .bind(transaction.description())
            .bind(transaction.amount())
            .bind(transaction.record_date())
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn get(&self, id: TransactionId) -> StoreResult<Option<Transaction>> {
        let row = sqlx::query_as::<_, TransactionRow>(SELECT_ONE)
            .bind(id.value())
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Transaction::from))
    }

    fn all(&self) -> TransactionStream<'_> {
        sqlx::query_as::<_, TransactionRow>(SELECT_ALL)
            .fetch(&self.pool)
            .map(|row| row.map(Transaction::from).map_err(StoreError::from))
            .boxed()
    }
}
