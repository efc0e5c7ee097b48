//! Errors for query translation.

use thiserror::Error;

/// A type for translation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("the question is empty")]
    EmptyInput,
    #[error("no tables are available to ground the prompt")]
    EmptySchema,
    #[error("the schema description is {size} characters long, exceeding the limit of {limit}")]
    SchemaTooLarge { size: usize, limit: usize },
    #[error("the completion did not contain a SQL statement once formatting was removed")]
    SanitizerEmpty,
}
