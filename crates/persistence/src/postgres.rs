//! PostgreSQL record store.
//!
//! One table per collection:
//!
//! ```sql
//! CREATE TABLE status (
//!     id     BIGSERIAL PRIMARY KEY,
//!     ts     TIMESTAMPTZ NOT NULL,
//!     fields JSONB NOT NULL
//! );
//! ```
//!
//! `ts` carries the decoded event timestamp and is indexed for the retention
//! sweep. All other event fields live in `fields`.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use status_core::config::is_valid_collection_name;
use status_core::StatusRecord;
use tracing::{debug, info, instrument};

use crate::error::PersistenceError;
use crate::filter::{Comparison, RecordFilter};
use crate::store::RecordStore;

pub struct PgStore {
    pool: PgPool,
    table: String,
}

impl PgStore {
    /// Connect a pool and make sure the collection table exists.
    #[instrument(skip_all, fields(collection = %collection))]
    pub async fn connect(
        url: &str,
        collection: &str,
        max_connections: u32,
    ) -> Result<Self, PersistenceError> {
        if !is_valid_collection_name(collection) {
            return Err(PersistenceError::InvalidCollection(collection.to_string()));
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        info!(max_connections, "PostgreSQL connected");

        Self::from_pool(pool, collection).await
    }

    /// Use an existing pool.
    pub async fn from_pool(pool: PgPool, collection: &str) -> Result<Self, PersistenceError> {
        if !is_valid_collection_name(collection) {
            return Err(PersistenceError::InvalidCollection(collection.to_string()));
        }
        let store = Self {
            pool,
            table: collection.to_string(),
        };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), PersistenceError> {
        for statement in schema_sql(&self.table) {
            sqlx::query(&statement).execute(&self.pool).await?;
        }
        debug!(table = %self.table, "schema ready");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn insert(&self, record: StatusRecord) -> Result<(), PersistenceError> {
        sqlx::query(&insert_sql(&self.table))
            .bind(record.ts)
            .bind(Value::Object(record.fields))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_many(&self, filter: &RecordFilter) -> Result<u64, PersistenceError> {
        filter.ensure_timestamp_field()?;
        let result = sqlx::query(&delete_sql(&self.table, filter.op))
            .bind(filter.value)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }

    fn collection(&self) -> &str {
        &self.table
    }
}

// Table names are validated identifiers, so interpolating them is safe.

fn schema_sql(table: &str) -> [String; 2] {
    [
        format!(
            "CREATE TABLE IF NOT EXISTS {table} (\
             id BIGSERIAL PRIMARY KEY, \
             ts TIMESTAMPTZ NOT NULL, \
             fields JSONB NOT NULL DEFAULT '{{}}'::jsonb)"
        ),
        format!("CREATE INDEX IF NOT EXISTS {table}_ts_idx ON {table} (ts)"),
    ]
}

fn insert_sql(table: &str) -> String {
    format!("INSERT INTO {table} (ts, fields) VALUES ($1, $2)")
}

fn delete_sql(table: &str, op: Comparison) -> String {
    format!("DELETE FROM {table} WHERE ts {} $1", op.sql_operator())
}
