//! The validated configuration the pipeline runs with.

use std::collections::BTreeSet;
use std::time::Duration;

use once_cell::sync::Lazy;
use query_engine_metadata::metadata::SchemaDescription;
use regex::Regex;
use url::Url;

use crate::environment::Environment;
use crate::error::ConfigurationError;
use crate::values::PoolSettings;
use crate::version1::{CompletionProvider, ParsedConfiguration, SchemaStrategy};

static FUNCTION_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*(?:\.[A-Za-z_][A-Za-z0-9_$]*){0,2}$")
        .expect("function name pattern is valid")
});

/// The 'Configuration' type collects all the information necessary to serve queries at runtime.
///
/// Values of this type are only produced by [`make_runtime_configuration`], so
/// holding one means every secret was resolved and every setting checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Configuration {
    pub connection_uri: String,
    pub pool_settings: PoolSettings,
    pub completion: CompletionSettings,
    pub model: String,
    pub schema: SchemaSettings,
    pub prompt: PromptOptions,
    pub trace_capacity: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionSettings {
    Http {
        endpoint: Url,
        api_key: Option<String>,
    },
    SqlFunction {
        function: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSettings {
    Static(SchemaDescription),
    Dynamic {
        schema_name: String,
        /// Empty means every table in the schema.
        tables: BTreeSet<String>,
        refresh: Option<Duration>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOptions {
    pub dialect: String,
    pub max_schema_chars: usize,
}

impl Configuration {
    pub fn pool_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_settings.pool_timeout)
    }
}

/// Resolve secrets and check every setting.
pub fn make_runtime_configuration(
    parsed: ParsedConfiguration,
    environment: impl Environment,
) -> Result<Configuration, ConfigurationError> {
    let connection_uri = parsed
        .connection_uri
        .resolve(&environment)
        .map_err(|source| ConfigurationError::MissingEnvironmentVariable {
            setting: "connectionUri",
            source,
        })?;
    validate_connection_uri(&connection_uri)?;

    if parsed.pool_settings.max_connections == 0 {
        return Err(ConfigurationError::EmptyPool);
    }

    let completion = match parsed.completion {
        CompletionProvider::Http(http) => {
            let endpoint = Url::parse(&http.endpoint)
                .map_err(|error| ConfigurationError::InvalidEndpoint(error.to_string()))?;
            if !matches!(endpoint.scheme(), "http" | "https") {
                return Err(ConfigurationError::InvalidEndpoint(format!(
                    "unsupported scheme {:?}",
                    endpoint.scheme()
                )));
            }
            let api_key = http
                .api_key
                .map(|key| key.resolve(&environment))
                .transpose()
                .map_err(|source| ConfigurationError::MissingEnvironmentVariable {
                    setting: "completion.apiKey",
                    source,
                })?;
            CompletionSettings::Http { endpoint, api_key }
        }
        CompletionProvider::SqlFunction(sql_function) => {
            if !FUNCTION_NAME.is_match(&sql_function.function) {
                return Err(ConfigurationError::InvalidFunctionName(
                    sql_function.function,
                ));
            }
            CompletionSettings::SqlFunction {
                function: sql_function.function,
            }
        }
    };

    let model = parsed.model.trim().to_string();
    if model.is_empty() {
        return Err(ConfigurationError::EmptyModel);
    }

    let schema = match parsed.schema {
        SchemaStrategy::Static(schema) if schema.tables.is_empty() => {
            return Err(ConfigurationError::EmptyStaticSchema);
        }
        SchemaStrategy::Static(schema) => SchemaSettings::Static(schema.tables),
        SchemaStrategy::Dynamic(dynamic) => {
            if dynamic.schema_name.trim().is_empty() {
                return Err(ConfigurationError::EmptySchemaName);
            }
            SchemaSettings::Dynamic {
                schema_name: dynamic.schema_name,
                tables: dynamic.tables.into_iter().collect(),
                refresh: dynamic
                    .refresh_seconds
                    .filter(|seconds| *seconds > 0)
                    .map(Duration::from_secs),
            }
        }
    };

    if parsed.prompt.dialect.trim().is_empty() {
        return Err(ConfigurationError::EmptyDialect);
    }
    if parsed.prompt.max_schema_chars == 0 {
        return Err(ConfigurationError::ZeroSchemaLimit);
    }
    if parsed.traces.capacity == 0 {
        return Err(ConfigurationError::ZeroTraceCapacity);
    }

    Ok(Configuration {
        connection_uri,
        pool_settings: parsed.pool_settings,
        completion,
        model,
        schema,
        prompt: PromptOptions {
            dialect: parsed.prompt.dialect,
            max_schema_chars: parsed.prompt.max_schema_chars,
        },
        trace_capacity: parsed.traces.capacity,
    })
}

fn validate_connection_uri(connection_uri: &str) -> Result<(), ConfigurationError> {
    let url = Url::parse(connection_uri)
        .map_err(|error| ConfigurationError::InvalidConnectionUri(error.to_string()))?;
    if matches!(url.scheme(), "postgres" | "postgresql") {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidConnectionUri(format!(
            "unsupported scheme {:?}, expected postgresql",
            url.scheme()
        )))
    }
}
