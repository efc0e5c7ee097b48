//! Errors raised while obtaining a completion.

use thiserror::Error;

/// A failure reaching or talking to the completion capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        TransportError {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        TransportError::new(error.to_string())
    }
}

impl From<sqlx::Error> for TransportError {
    fn from(error: sqlx::Error) -> Self {
        TransportError::new(error.to_string())
    }
}

/// Completion errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("the completion capability returned an empty response")]
    Empty,
    #[error("the completion capability failed: {0}")]
    Transport(#[from] TransportError),
}
