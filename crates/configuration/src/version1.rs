//! Version 1 of the configuration file format.

use std::path::Path;

use query_engine_metadata::metadata::SchemaDescription;
use schemars::{schema::RootSchema, JsonSchema};
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{ParseConfigurationError, WriteParsedConfigurationError};
use crate::values::{PoolSettings, Secret};

const CURRENT_VERSION: u32 = 1;
pub const CONFIGURATION_FILENAME: &str = "configuration.json";
const CONFIGURATION_JSONSCHEMA_FILENAME: &str = "schema.json";

pub const DEFAULT_CONNECTION_URI_VARIABLE: &str = "NL_SQL_DATABASE_URL";
pub const DEFAULT_API_KEY_VARIABLE: &str = "NL_SQL_COMPLETION_API_KEY";
pub const DEFAULT_COMPLETION_ENDPOINT: &str = "https://api.mistral.ai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "mistral-large";
pub const DEFAULT_SCHEMA_NAME: &str = "public";
pub const DEFAULT_DIALECT: &str = "PostgreSQL";
pub const DEFAULT_MAX_SCHEMA_CHARS: usize = 16_000;
pub const DEFAULT_TRACE_CAPACITY: usize = 100;

/// The configuration file as written by the user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParsedConfiguration {
    /// Which version of the configuration format are we using
    pub version: u32,
    /// Connection string for a Postgres-compatible database
    pub connection_uri: Secret,
    #[serde(skip_serializing_if = "PoolSettings::is_default")]
    #[serde(default)]
    pub pool_settings: PoolSettings,
    /// How SQL is generated from a prompt
    pub completion: CompletionProvider,
    /// Model identifier passed to the completion capability
    #[serde(default = "model_default")]
    pub model: String,
    /// Where the tables shown to the model come from
    pub schema: SchemaStrategy,
    #[serde(default)]
    pub prompt: PromptSection,
    #[serde(default)]
    pub traces: TracesSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(tag = "provider", rename_all = "camelCase")]
pub enum CompletionProvider {
    /// An OpenAI-compatible chat completions endpoint.
    Http(HttpCompletion),
    /// A SQL function inside the database, called as `function(model, prompt)`.
    SqlFunction(SqlFunctionCompletion),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct HttpCompletion {
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<Secret>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SqlFunctionCompletion {
    /// Possibly schema-qualified, e.g. `ai.complete`.
    pub function: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(tag = "strategy", rename_all = "camelCase")]
pub enum SchemaStrategy {
    /// A fixed, hand-written description.
    Static(StaticSchema),
    /// Read from the database catalog.
    Dynamic(DynamicSchema),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct StaticSchema {
    pub tables: SchemaDescription,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DynamicSchema {
    #[serde(default = "schema_name_default")]
    pub schema_name: String,
    /// Only these tables are described. Empty means every table.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<String>,
    /// Reuse a catalog read for this many seconds. Absent means read it on
    /// every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PromptSection {
    #[serde(default = "dialect_default")]
    pub dialect: String,
    /// Larger rendered schemas are rejected rather than truncated.
    #[serde(default = "max_schema_chars_default")]
    pub max_schema_chars: usize,
}

impl Default for PromptSection {
    fn default() -> Self {
        PromptSection {
            dialect: dialect_default(),
            max_schema_chars: max_schema_chars_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TracesSection {
    /// How many traces are retained. Older ones are evicted first.
    #[serde(default = "capacity_default")]
    pub capacity: usize,
}

impl Default for TracesSection {
    fn default() -> Self {
        TracesSection {
            capacity: capacity_default(),
        }
    }
}

fn model_default() -> String {
    DEFAULT_MODEL.to_string()
}
fn schema_name_default() -> String {
    DEFAULT_SCHEMA_NAME.to_string()
}
fn dialect_default() -> String {
    DEFAULT_DIALECT.to_string()
}
fn max_schema_chars_default() -> usize {
    DEFAULT_MAX_SCHEMA_CHARS
}
fn capacity_default() -> usize {
    DEFAULT_TRACE_CAPACITY
}

impl ParsedConfiguration {
    /// A starting point: secrets from the environment, the dynamic schema
    /// strategy over `public`.
    pub fn initial() -> Self {
        ParsedConfiguration {
            version: CURRENT_VERSION,
            connection_uri: Secret::from_environment(DEFAULT_CONNECTION_URI_VARIABLE),
            pool_settings: PoolSettings::default(),
            completion: CompletionProvider::Http(HttpCompletion {
                endpoint: DEFAULT_COMPLETION_ENDPOINT.to_string(),
                api_key: Some(Secret::from_environment(DEFAULT_API_KEY_VARIABLE)),
            }),
            model: model_default(),
            schema: SchemaStrategy::Dynamic(DynamicSchema {
                schema_name: schema_name_default(),
                tables: Vec::new(),
                refresh_seconds: None,
            }),
            prompt: PromptSection::default(),
            traces: TracesSection::default(),
        }
    }

    /// Replace the schema section with a fixed description.
    #[must_use]
    pub fn with_static_schema(self, tables: SchemaDescription) -> Self {
        ParsedConfiguration {
            schema: SchemaStrategy::Static(StaticSchema { tables }),
            ..self
        }
    }
}

#[derive(Deserialize)]
struct VersionTag {
    version: u32,
}

/// Parse the configuration format from a directory.
pub async fn parse_configuration(
    configuration_dir: impl AsRef<Path>,
) -> Result<ParsedConfiguration, ParseConfigurationError> {
    let configuration_file = configuration_dir.as_ref().join(CONFIGURATION_FILENAME);

    let configuration_file_contents =
        fs::read_to_string(&configuration_file)
            .await
            .map_err(|err| {
                ParseConfigurationError::IoErrorButStringified(format!(
                    "{}: {}",
                    &configuration_file.display(),
                    err
                ))
            })?;

    let parse_error = |error: serde_json::Error| ParseConfigurationError::ParseError {
        file_path: configuration_file.clone(),
        line: error.line(),
        column: error.column(),
        message: error.to_string(),
    };

    let VersionTag { version } =
        serde_json::from_str(&configuration_file_contents).map_err(parse_error)?;
    if version != CURRENT_VERSION {
        return Err(ParseConfigurationError::UnsupportedVersion {
            file_path: configuration_file.clone(),
            version,
        });
    }

    serde_json::from_str(&configuration_file_contents).map_err(parse_error)
}

/// Write the parsed configuration and its JSON Schema into a directory on disk.
pub async fn write_parsed_configuration(
    parsed_config: &ParsedConfiguration,
    out_dir: impl AsRef<Path>,
) -> Result<(), WriteParsedConfigurationError> {
    let configuration_file = out_dir.as_ref().to_owned().join(CONFIGURATION_FILENAME);
    fs::create_dir_all(out_dir.as_ref()).await?;

    // create the configuration file
    fs::write(
        configuration_file,
        serde_json::to_string_pretty(parsed_config)? + "\n",
    )
    .await?;

    // create the jsonschema file
    let configuration_jsonschema_file_path = out_dir
        .as_ref()
        .to_owned()
        .join(CONFIGURATION_JSONSCHEMA_FILENAME);

    fs::write(
        &configuration_jsonschema_file_path,
        serde_json::to_string_pretty(&configuration_schema())? + "\n",
    )
    .await?;

    Ok(())
}

/// The JSON Schema of the configuration file.
pub fn configuration_schema() -> RootSchema {
    schemars::schema_for!(ParsedConfiguration)
}
