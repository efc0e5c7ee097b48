//! The closed set of ways a question can fail, and the error returned to callers.

use std::fmt;

use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use query_engine_completion as completion;
use query_engine_execution as execution;
use query_engine_translation::translation;

use crate::observability::Trace;
use crate::pipeline::PipelineState;
use crate::schema;

/// What went wrong. Each kind is raised by exactly one component.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Sequence,
)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    EmptyInput,
    SchemaUnavailable,
    SchemaTooLarge,
    CompletionEmpty,
    CompletionError,
    SanitizerEmpty,
    ExecutionError,
    ConfigurationError,
}

/// How an error is presented to the person asking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Sequence)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorCategory {
    Configuration,
    Generation,
    Execution,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::EmptyInput => "empty-input",
            ErrorKind::SchemaUnavailable => "schema-unavailable",
            ErrorKind::SchemaTooLarge => "schema-too-large",
            ErrorKind::CompletionEmpty => "completion-empty",
            ErrorKind::CompletionError => "completion-error",
            ErrorKind::SanitizerEmpty => "sanitizer-empty",
            ErrorKind::ExecutionError => "execution-error",
            ErrorKind::ConfigurationError => "configuration-error",
        }
    }

    pub fn category(self) -> ErrorCategory {
        match self {
            ErrorKind::ConfigurationError => ErrorCategory::Configuration,
            ErrorKind::EmptyInput
            | ErrorKind::SchemaUnavailable
            | ErrorKind::SchemaTooLarge
            | ErrorKind::CompletionEmpty
            | ErrorKind::CompletionError
            | ErrorKind::SanitizerEmpty => ErrorCategory::Generation,
            ErrorKind::ExecutionError => ErrorCategory::Execution,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::Generation => "generation",
            ErrorCategory::Execution => "execution",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A failure raised by one of the components the pipeline drives.
#[derive(Debug, Error)]
pub enum StageError {
    #[error(transparent)]
    Translation(#[from] translation::Error),
    #[error(transparent)]
    Schema(#[from] schema::Error),
    #[error(transparent)]
    Completion(#[from] completion::Error),
    #[error(transparent)]
    Execution(#[from] execution::Error),
}

impl StageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StageError::Translation(translation::Error::EmptyInput) => ErrorKind::EmptyInput,
            StageError::Translation(translation::Error::EmptySchema) | StageError::Schema(_) => {
                ErrorKind::SchemaUnavailable
            }
            StageError::Translation(translation::Error::SchemaTooLarge { .. }) => {
                ErrorKind::SchemaTooLarge
            }
            StageError::Translation(translation::Error::SanitizerEmpty) => {
                ErrorKind::SanitizerEmpty
            }
            StageError::Completion(completion::Error::Empty) => ErrorKind::CompletionEmpty,
            StageError::Completion(completion::Error::Transport(_)) => ErrorKind::CompletionError,
            StageError::Execution(_) => ErrorKind::ExecutionError,
        }
    }
}

/// The structured error returned instead of a payload.
#[derive(Debug, Clone, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{kind}: {message}")]
pub struct PipelineError {
    pub kind: ErrorKind,
    pub category: ErrorCategory,
    pub message: String,
    /// The state the pipeline was in when the component failed.
    pub failed_in: PipelineState,
    /// The statement that was rejected, for execution errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    pub trace: Trace,
}
