use axum::{extract::State, Json};

use crate::observability::Summary;
use crate::state;

pub async fn get_trace_summary(State(state): State<state::State>) -> Json<Summary> {
    Json(state.recorder().summary())
}
