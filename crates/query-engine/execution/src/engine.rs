//! The relational engine seam and its PostgreSQL implementation.

use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use query_engine_metadata::metadata::SchemaDescription;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{info_span, Instrument};

use crate::catalog;
use crate::error::Error;
use crate::execution;

/// One result row, keyed by column name in select-list order.
pub type Row = IndexMap<String, serde_json::Value>;

/// The tabular outcome of running a statement.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ExecutionResult {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl ExecutionResult {
    /// Build a result from positional rows. Every row must have one value
    /// per column. Repeated column names (`SELECT 1, 1`) are made unique by
    /// suffixing `_2`, `_3`, ... so that no value is lost when rows are keyed
    /// by name.
    pub fn from_rows(
        columns: Vec<String>,
        rows: Vec<Vec<serde_json::Value>>,
    ) -> Result<Self, Error> {
        let columns = unique_column_names(columns);
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(index, values)| {
                if values.len() == columns.len() {
                    Ok(columns.iter().cloned().zip(values).collect())
                } else {
                    Err(Error::RowArity {
                        row: index,
                        found: values.len(),
                        expected: columns.len(),
                    })
                }
            })
            .collect::<Result<Vec<Row>, Error>>()?;
        Ok(ExecutionResult { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn unique_column_names(columns: Vec<String>) -> Vec<String> {
    let mut seen: IndexMap<String, usize> = IndexMap::new();
    let mut unique = Vec::with_capacity(columns.len());
    for column in columns {
        let mut candidate = column.clone();
        let mut occurrence = 1;
        while seen.contains_key(&candidate) {
            occurrence += 1;
            candidate = format!("{column}_{occurrence}");
        }
        seen.insert(candidate.clone(), occurrence);
        unique.push(candidate);
    }
    unique
}

/// Something that can run SQL text and describe its own catalog.
#[async_trait]
pub trait RelationalEngine: Send + Sync {
    /// Run one statement and collect every row it returns.
    async fn execute(&self, sql: &str) -> Result<ExecutionResult, Error>;

    /// Describe the tables and columns of a database schema.
    async fn catalog(&self, schema_name: &str) -> Result<SchemaDescription, Error>;

    /// Check that the database can be reached.
    async fn health_check(&self) -> Result<(), Error>;
}

/// A [`RelationalEngine`] backed by a PostgreSQL connection pool.
///
/// Every call acquires its own connection and returns it to the pool when the
/// call finishes, whether it succeeded or not.
#[derive(Debug, Clone)]
pub struct PostgresEngine {
    pool: PgPool,
}

impl PostgresEngine {
    pub fn new(pool: PgPool) -> Self {
        PostgresEngine { pool }
    }

    async fn acquire(&self) -> Result<sqlx::pool::PoolConnection<sqlx::Postgres>, Error> {
        self.pool
            .acquire()
            .instrument(info_span!("Acquire connection"))
            .await
            .map_err(|error| Error::Connection(error.to_string()))
    }
}

#[async_trait]
impl RelationalEngine for PostgresEngine {
    async fn execute(&self, sql: &str) -> Result<ExecutionResult, Error> {
        let mut connection = self.acquire().await?;
        execution::execute(&mut connection, sql).await
    }

    async fn catalog(&self, schema_name: &str) -> Result<SchemaDescription, Error> {
        let mut connection = self.acquire().await?;
        catalog::introspect(&mut connection, schema_name)
            .await
            .map_err(Error::into_catalog)
    }

    async fn health_check(&self) -> Result<(), Error> {
        let mut connection = self.acquire().await?;
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&mut *connection)
            .instrument(info_span!("Health check"))
            .await?;
        Ok(())
    }
}

/// Create a connection pool, failing if no connection can be established.
pub async fn create_pool(
    connection_uri: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(connection_uri)
        .instrument(info_span!("Create connection pool"))
        .await
}
