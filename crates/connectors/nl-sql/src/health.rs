//! Health check for the service.

use query_engine_execution::{Error, RelationalEngine};

/// Check that the database can be reached.
pub async fn health_check(engine: &dyn RelationalEngine) -> Result<(), Error> {
    engine.health_check().await.map_err(|err| {
        tracing::error!(
            meta.signal_type = "log",
            event.domain = "nl-sql",
            event.name = "Health check error",
            name = "Health check error",
            body = %err,
            error = true,
        );
        err
    })
}
