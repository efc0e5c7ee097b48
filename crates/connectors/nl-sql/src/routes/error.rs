use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::{ErrorCategory, ErrorKind, PipelineError};

pub enum ServerError {
    Pipeline(PipelineError),
    TraceNotFound(String),
    Unhealthy(String),
    Internal(String),
}

#[derive(Serialize)]
struct JsonErrorResponse {
    message: String,
}

/// The status a failed question is reported with.
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match (kind, kind.category()) {
        (ErrorKind::EmptyInput, _) => StatusCode::BAD_REQUEST,
        (_, ErrorCategory::Generation) => StatusCode::BAD_GATEWAY,
        (_, ErrorCategory::Execution) => StatusCode::UNPROCESSABLE_ENTITY,
        (_, ErrorCategory::Configuration) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ServerError::Pipeline(error) => {
                return (status_for(error.kind), Json(error)).into_response();
            }
            ServerError::TraceNotFound(trace_id) => (
                StatusCode::NOT_FOUND,
                format!("no trace with id {trace_id:?} is retained"),
            ),
            ServerError::Unhealthy(message) => (StatusCode::SERVICE_UNAVAILABLE, message),
            ServerError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        (status, Json(JsonErrorResponse { message })).into_response()
    }
}

impl From<PipelineError> for ServerError {
    fn from(value: PipelineError) -> Self {
        ServerError::Pipeline(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_categories() {
        assert_eq!(status_for(ErrorKind::EmptyInput), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::CompletionEmpty), StatusCode::BAD_GATEWAY);
        assert_eq!(status_for(ErrorKind::SchemaUnavailable), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(ErrorKind::ExecutionError),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(ErrorKind::ConfigurationError),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
