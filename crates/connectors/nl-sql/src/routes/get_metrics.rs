use axum::{
    extract::State,
    http::header::CONTENT_TYPE,
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, TextEncoder};

use crate::routes::ServerError;
use crate::state;

/// Prometheus text exposition of every registered metric.
pub async fn get_metrics(State(state): State<state::State>) -> Result<Response, ServerError> {
    if let Some(pool) = &state.pool {
        state.metrics.update_pool_metrics(pool);
    }

    let encoder = TextEncoder::new();
    let mut buffer = String::new();
    encoder
        .encode_utf8(&state.metrics_registry.gather(), &mut buffer)
        .map_err(|error| ServerError::Internal(error.to_string()))?;

    Ok(([(CONTENT_TYPE, encoder.format_type().to_string())], buffer).into_response())
}
