//! Supply the tables a question may be answered from.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{info_span, Instrument};

use nl_sql_configuration::SchemaSettings;
use query_engine_execution::RelationalEngine;
use query_engine_metadata::metadata::SchemaDescription;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("the schema catalog could not be read: {0}")]
    Unavailable(String),
    #[error("schema {0:?} has no tables that may be queried")]
    NoTables(String),
}

/// A source of [`SchemaDescription`]s.
#[async_trait]
pub trait SchemaProvider: Send + Sync {
    async fn schema(&self) -> Result<SchemaDescription, Error>;

    /// `static` or `dynamic`, for logs.
    fn strategy(&self) -> &'static str;
}

/// Always returns the same, hand-written description.
#[derive(Debug, Clone)]
pub struct StaticSchemaProvider {
    schema: SchemaDescription,
}

impl StaticSchemaProvider {
    pub fn new(schema: SchemaDescription) -> Self {
        StaticSchemaProvider { schema }
    }
}

#[async_trait]
impl SchemaProvider for StaticSchemaProvider {
    async fn schema(&self) -> Result<SchemaDescription, Error> {
        Ok(self.schema.clone())
    }

    fn strategy(&self) -> &'static str {
        "static"
    }
}

#[derive(Debug, Clone)]
struct CachedSchema {
    fetched_at: Instant,
    schema: SchemaDescription,
}

/// Reads the description from the database catalog.
///
/// A failed or empty read fails the request; an older description is never
/// used in its place. With a refresh interval, a successful read is reused
/// until it is older than the interval.
pub struct DynamicSchemaProvider {
    engine: Arc<dyn RelationalEngine>,
    schema_name: String,
    tables: BTreeSet<String>,
    refresh: Option<Duration>,
    cache: Mutex<Option<CachedSchema>>,
}

impl DynamicSchemaProvider {
    pub fn new(
        engine: Arc<dyn RelationalEngine>,
        schema_name: impl Into<String>,
        tables: BTreeSet<String>,
        refresh: Option<Duration>,
    ) -> Self {
        DynamicSchemaProvider {
            engine,
            schema_name: schema_name.into(),
            tables,
            refresh,
            cache: Mutex::new(None),
        }
    }

    fn cached(&self) -> Option<SchemaDescription> {
        let refresh = self.refresh?;
        let mut cache = self.cache.lock();
        match cache.as_ref() {
            Some(cached) if cached.fetched_at.elapsed() < refresh => Some(cached.schema.clone()),
            Some(_) => {
                *cache = None;
                None
            }
            None => None,
        }
    }

    async fn fetch(&self) -> Result<SchemaDescription, Error> {
        let mut schema = self
            .engine
            .catalog(&self.schema_name)
            .await
            .map_err(|error| Error::Unavailable(error.to_string()))?;

        if !self.tables.is_empty() {
            schema.retain_tables(&self.tables);
        }
        if schema.is_empty() {
            return Err(Error::NoTables(self.schema_name.clone()));
        }
        Ok(schema)
    }
}

#[async_trait]
impl SchemaProvider for DynamicSchemaProvider {
    async fn schema(&self) -> Result<SchemaDescription, Error> {
        if let Some(schema) = self.cached() {
            tracing::debug!(schema = self.schema_name, "Using cached catalog");
            return Ok(schema);
        }

        let schema = self
            .fetch()
            .instrument(info_span!("Read catalog", schema = self.schema_name))
            .await?;

        tracing::info!(
            schema = self.schema_name,
            tables = schema.len(),
            columns = schema.column_count(),
            "Read catalog"
        );

        if self.refresh.is_some() {
            *self.cache.lock() = Some(CachedSchema {
                fetched_at: Instant::now(),
                schema: schema.clone(),
            });
        }
        Ok(schema)
    }

    fn strategy(&self) -> &'static str {
        "dynamic"
    }
}

/// Build the provider selected by the configuration.
pub fn create_schema_provider(
    settings: &SchemaSettings,
    engine: Arc<dyn RelationalEngine>,
) -> Arc<dyn SchemaProvider> {
    match settings {
        SchemaSettings::Static(schema) => Arc::new(StaticSchemaProvider::new(schema.clone())),
        SchemaSettings::Dynamic {
            schema_name,
            tables,
            refresh,
        } => Arc::new(DynamicSchemaProvider::new(
            engine,
            schema_name.clone(),
            tables.clone(),
            *refresh,
        )),
    }
}
