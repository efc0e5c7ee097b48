//! Transient state used by the service.
//!
//! This is initialized on startup.

use std::path::Path;
use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;
use tracing::{info_span, Instrument};

use nl_sql_configuration::{
    make_runtime_configuration, parse_configuration, CompletionSettings, Configuration,
    ConfigurationError, Environment, ParseConfigurationError,
};
use query_engine_completion::http::HttpCompletionClient;
use query_engine_completion::sql_function::SqlFunctionCompletion;
use query_engine_completion::CompletionCapability;
use query_engine_execution::metrics;
use query_engine_execution::{create_pool, PostgresEngine, RelationalEngine};
use query_engine_translation::translation::PromptSettings;

use crate::error::{ErrorCategory, ErrorKind};
use crate::observability::Recorder;
use crate::pipeline::Pipeline;
use crate::schema::create_schema_provider;

/// State for the service.
#[derive(Clone)]
pub struct State {
    pub pipeline: Arc<Pipeline>,
    pub metrics: metrics::Metrics,
    pub metrics_registry: prometheus::Registry,
    /// Present when the engine is backed by a real pool, for the pool gauges.
    pub pool: Option<PgPool>,
}

impl State {
    pub fn recorder(&self) -> &Arc<Recorder> {
        self.pipeline.recorder()
    }

    pub fn engine(&self) -> &Arc<dyn RelationalEngine> {
        self.pipeline.engine()
    }
}

/// Read the configuration directory and validate it against `environment`.
///
/// Nothing is connected to until this succeeds.
pub async fn load_configuration(
    configuration_dir: impl AsRef<Path>,
    environment: impl Environment,
) -> Result<Configuration, InitializationError> {
    let parsed = parse_configuration(configuration_dir).await?;
    let configuration = make_runtime_configuration(parsed, environment)?;
    Ok(configuration)
}

/// Create a connection pool and wrap it, with everything else a question
/// needs, inside a State.
pub async fn create_state(
    configuration: &Configuration,
    metrics_registry: prometheus::Registry,
) -> Result<State, InitializationError> {
    let mut registry = metrics_registry;
    let metrics = async {
        let metrics_inner = metrics::Metrics::initialize(&mut registry)
            .map_err(InitializationError::MetricsError)?;
        Ok::<_, InitializationError>(metrics_inner)
    }
    .instrument(info_span!("Setup metrics"))
    .await?;

    let pool = create_pool(
        &configuration.connection_uri,
        configuration.pool_settings.max_connections,
        configuration.pool_timeout(),
    )
    .await
    .map_err(InitializationError::UnableToCreatePool)?;

    metrics.update_pool_metrics(&pool);

    let engine: Arc<dyn RelationalEngine> = Arc::new(PostgresEngine::new(pool.clone()));

    let completion: Arc<dyn CompletionCapability> = match &configuration.completion {
        CompletionSettings::Http { endpoint, api_key } => {
            Arc::new(HttpCompletionClient::new(endpoint.clone(), api_key.clone()))
        }
        CompletionSettings::SqlFunction { function } => {
            Arc::new(SqlFunctionCompletion::new(pool.clone(), function))
        }
    };

    let schema_provider = create_schema_provider(&configuration.schema, engine.clone());
    let recorder = Arc::new(Recorder::new(configuration.trace_capacity));

    let pipeline = Pipeline::new(schema_provider, completion, engine, recorder)
        .with_model(configuration.model.clone())
        .with_prompt_settings(PromptSettings {
            dialect: configuration.prompt.dialect.clone(),
            max_schema_chars: configuration.prompt.max_schema_chars,
        })
        .with_metrics(metrics.clone());

    tracing::info!(
        model = configuration.model,
        trace_capacity = configuration.trace_capacity,
        "Pipeline ready"
    );

    Ok(State {
        pipeline: Arc::new(pipeline),
        metrics,
        metrics_registry: registry,
        pool: Some(pool),
    })
}

/// State initialization error.
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("unable to initialize connection pool: {0}")]
    UnableToCreatePool(sqlx::Error),
    #[error("error initializing metrics: {0}")]
    MetricsError(prometheus::Error),
    #[error("{0}")]
    ParseConfigurationError(#[from] ParseConfigurationError),
    #[error("{0}")]
    ConfigurationError(#[from] ConfigurationError),
}

impl InitializationError {
    /// The pipeline error kind, for failures caused by the configuration.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            InitializationError::ParseConfigurationError(_)
            | InitializationError::ConfigurationError(_) => Some(ErrorKind::ConfigurationError),
            InitializationError::UnableToCreatePool(_) | InitializationError::MetricsError(_) => {
                None
            }
        }
    }

    pub fn category(&self) -> Option<ErrorCategory> {
        self.kind().map(ErrorKind::category)
    }
}
