mod error;
mod get_health;
mod get_metrics;
mod get_trace;
mod get_trace_ids;
mod get_trace_summary;
mod get_traces;
mod post_query;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::State;

pub use error::ServerError;
pub use get_health::get_health;
pub use get_metrics::get_metrics;
pub use get_trace::get_trace;
pub use get_trace_ids::get_trace_ids;
pub use get_trace_summary::get_trace_summary;
pub use get_traces::{get_traces, TracesParams, DEFAULT_TRACE_LIMIT};
pub use post_query::{post_query, QueryRequest};

pub fn create_router(state: State) -> Router {
    Router::new()
        .route("/query", post(post_query))
        .route("/traces", get(get_traces))
        .route("/traces/ids", get(get_trace_ids))
        .route("/traces/summary", get(get_trace_summary))
        .route("/traces/:trace_id", get(get_trace))
        .route("/health", get(get_health))
        .route("/metrics", get(get_metrics))
        .with_state(state)
}
