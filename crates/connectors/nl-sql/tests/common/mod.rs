//! Common functions used across test cases.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;

use nl_sql::observability::Recorder;
use nl_sql::pipeline::Pipeline;
use nl_sql::schema::{SchemaProvider, StaticSchemaProvider};
use nl_sql::state::State;
use query_engine_completion::CompletionCapability;
use query_engine_execution::metrics::Metrics;
use query_engine_execution::RelationalEngine;
use query_engine_metadata::metadata::SchemaDescription;
use tests_common::completion::ScriptedCompletion;
use tests_common::engine::InMemoryEngine;

pub const COUNT_ORDERS_QUESTION: &str = "How many orders are there?";
pub const COUNT_ORDERS_COMPLETION: &str = "```sql\nSELECT COUNT(*) FROM ORDERS;\n```";
pub const COUNT_ORDERS_SQL: &str = "SELECT COUNT(*) FROM ORDERS";

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

/// A pipeline wired to test doubles, with handles on the doubles.
pub struct Harness {
    pub pipeline: Pipeline,
    pub completion: Arc<ScriptedCompletion>,
    pub engine: Arc<InMemoryEngine>,
}

pub fn harness(
    schema: SchemaDescription,
    completion: ScriptedCompletion,
    engine: InMemoryEngine,
) -> Harness {
    let provider: Arc<dyn SchemaProvider> = Arc::new(StaticSchemaProvider::new(schema));
    harness_with_provider(provider, completion, engine)
}

pub fn harness_with_provider(
    provider: Arc<dyn SchemaProvider>,
    completion: ScriptedCompletion,
    engine: InMemoryEngine,
) -> Harness {
    tests_common::init_logging();

    let completion = Arc::new(completion);
    let engine = Arc::new(engine);
    let completion_capability: Arc<dyn CompletionCapability> = completion.clone();
    let relational_engine: Arc<dyn RelationalEngine> = engine.clone();

    let pipeline = Pipeline::new(
        provider,
        completion_capability,
        relational_engine,
        Arc::new(Recorder::new(100)),
    )
    .with_fixed_date(today());

    Harness {
        pipeline,
        completion,
        engine,
    }
}

/// Server state around a pipeline, with metrics on a fresh registry.
pub fn create_state(pipeline: Pipeline) -> State {
    let mut registry = prometheus::Registry::new();
    let metrics = Metrics::initialize(&mut registry).unwrap();
    State {
        pipeline: Arc::new(pipeline.with_metrics(metrics.clone())),
        metrics,
        metrics_registry: registry,
        pool: None,
    }
}

/// A router answering `ORDERS` count questions.
pub fn create_router() -> axum::Router {
    let Harness { pipeline, .. } = harness(
        tests_common::schemas::orders_schema(),
        ScriptedCompletion::returning(COUNT_ORDERS_COMPLETION),
        InMemoryEngine::new().with_result(
            COUNT_ORDERS_SQL,
            tests_common::engine::count_result(42),
        ),
    );
    nl_sql::routes::create_router(create_state(pipeline))
}
