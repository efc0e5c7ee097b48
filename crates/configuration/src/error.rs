//! Errors that can be thrown when reading, writing or validating configuration.

use std::path::PathBuf;

use thiserror::Error;

use crate::environment;

/// The configuration file could not be read.
#[derive(Debug, Error)]
pub enum ParseConfigurationError {
    #[error("parse error on {file_path}:{line}:{column}: {message}")]
    ParseError {
        file_path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },
    #[error("{file_path}: unsupported configuration version {version}, expected 1")]
    UnsupportedVersion { file_path: PathBuf, version: u32 },
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("I/O error: {0}")]
    IoErrorButStringified(String),
}

/// The configuration could not be written.
#[derive(Debug, Error)]
pub enum WriteParsedConfigurationError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// A parsed configuration that cannot be used to run the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("{setting}: {source}")]
    MissingEnvironmentVariable {
        setting: &'static str,
        source: environment::Error,
    },
    #[error("connectionUri: {0}")]
    InvalidConnectionUri(String),
    #[error("poolSettings.maxConnections must be at least 1")]
    EmptyPool,
    #[error("completion.endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("completion.function: {0:?} is not a valid function name")]
    InvalidFunctionName(String),
    #[error("model must not be empty")]
    EmptyModel,
    #[error("schema.tables must describe at least one table")]
    EmptyStaticSchema,
    #[error("schema.schemaName must not be empty")]
    EmptySchemaName,
    #[error("prompt.dialect must not be empty")]
    EmptyDialect,
    #[error("prompt.maxSchemaChars must be at least 1")]
    ZeroSchemaLimit,
    #[error("traces.capacity must be at least 1")]
    ZeroTraceCapacity,
}
