use axum::{extract::State, http::StatusCode};

use crate::health;
use crate::routes::ServerError;
use crate::state;

pub async fn get_health(State(state): State<state::State>) -> Result<StatusCode, ServerError> {
    health::health_check(state.engine().as_ref())
        .await
        .map(|()| StatusCode::NO_CONTENT)
        .map_err(|error| ServerError::Unhealthy(error.to_string()))
}
