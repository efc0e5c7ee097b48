use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::observability::Trace;
use crate::state;

pub const DEFAULT_TRACE_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct TracesParams {
    pub limit: Option<usize>,
}

/// Recent traces, newest first.
pub async fn get_traces(
    State(state): State<state::State>,
    Query(params): Query<TracesParams>,
) -> Json<Vec<Trace>> {
    Json(
        state
            .recorder()
            .recent(params.limit.unwrap_or(DEFAULT_TRACE_LIMIT)),
    )
}
