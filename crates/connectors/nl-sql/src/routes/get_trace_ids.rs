use axum::{extract::State, Json};

use crate::observability::TraceId;
use crate::state;

/// Every retained trace identifier, oldest first.
pub async fn get_trace_ids(State(state): State<state::State>) -> Json<Vec<TraceId>> {
    Json(state.recorder().trace_ids())
}
