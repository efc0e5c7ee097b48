//! Statement execution and catalog introspection against PostgreSQL.

pub mod catalog;
pub mod engine;
pub mod error;
pub mod execution;
pub mod metrics;

pub use engine::{create_pool, ExecutionResult, PostgresEngine, RelationalEngine, Row};
pub use error::Error;
