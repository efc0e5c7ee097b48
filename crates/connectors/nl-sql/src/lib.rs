pub mod error;
pub mod health;
pub mod observability;
pub mod pipeline;
pub mod routes;
pub mod schema;
pub mod state;

pub use error::{ErrorCategory, ErrorKind, PipelineError};
pub use observability::{Outcome, Recorder, Summary, Trace, TraceId};
pub use pipeline::{Pipeline, PipelineState, ResponsePayload};
