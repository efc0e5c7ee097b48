use axum::{extract::State, Json};
use serde::Deserialize;

use crate::pipeline::ResponsePayload;
use crate::routes::ServerError;
use crate::state;

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
}

pub async fn post_query(
    State(state): State<state::State>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<ResponsePayload>, ServerError> {
    let payload = state.pipeline.run(&request.question).await?;
    Ok(Json(payload))
}
