//! A relational engine that answers from a fixed table of statements.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use query_engine_execution::{Error, ExecutionResult, RelationalEngine};
use query_engine_metadata::metadata::SchemaDescription;

/// Statements not in the table fail the way a database rejects an unknown
/// relation.
#[derive(Debug, Default)]
pub struct InMemoryEngine {
    results: HashMap<String, Result<ExecutionResult, Error>>,
    catalog: Option<Result<SchemaDescription, Error>>,
    executed: Mutex<Vec<String>>,
    catalog_reads: AtomicUsize,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_result(mut self, sql: &str, result: ExecutionResult) -> Self {
        self.results.insert(sql.to_string(), Ok(result));
        self
    }

    #[must_use]
    pub fn with_error(mut self, sql: &str, error: Error) -> Self {
        self.results.insert(sql.to_string(), Err(error));
        self
    }

    #[must_use]
    pub fn with_catalog(mut self, schema: SchemaDescription) -> Self {
        self.catalog = Some(Ok(schema));
        self
    }

    #[must_use]
    pub fn with_catalog_error(mut self, error: Error) -> Self {
        self.catalog = Some(Err(error));
        self
    }

    /// Every statement passed to `execute`, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().clone()
    }

    pub fn catalog_reads(&self) -> usize {
        self.catalog_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RelationalEngine for InMemoryEngine {
    async fn execute(&self, sql: &str) -> Result<ExecutionResult, Error> {
        self.executed.lock().push(sql.to_string());
        self.results.get(sql).cloned().unwrap_or_else(|| {
            Err(Error::Statement(format!(
                "relation referenced by {sql:?} does not exist"
            )))
        })
    }

    async fn catalog(&self, _schema_name: &str) -> Result<SchemaDescription, Error> {
        self.catalog_reads.fetch_add(1, Ordering::SeqCst);
        self.catalog
            .clone()
            .unwrap_or_else(|| Ok(SchemaDescription::empty()))
    }

    async fn health_check(&self) -> Result<(), Error> {
        Ok(())
    }
}

/// A single row holding `COUNT(*)`.
pub fn count_result(count: i64) -> ExecutionResult {
    ExecutionResult::from_rows(
        vec!["count".to_string()],
        vec![vec![serde_json::Value::from(count)]],
    )
    .expect("one value per column")
}
