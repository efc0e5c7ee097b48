use axum::{
    extract::{Path, State},
    Json,
};

use crate::observability::Trace;
use crate::routes::ServerError;
use crate::state;

pub async fn get_trace(
    State(state): State<state::State>,
    Path(trace_id): Path<String>,
) -> Result<Json<Trace>, ServerError> {
    state
        .recorder()
        .get(&trace_id)
        .map(Json)
        .ok_or(ServerError::TraceNotFound(trace_id))
}
