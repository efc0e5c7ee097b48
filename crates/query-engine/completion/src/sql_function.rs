//! Completion performed inside the relational engine by a SQL function, in
//! the style of `SNOWFLAKE.CORTEX.COMPLETE(model, prompt)`.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::capability::CompletionCapability;
use crate::error::TransportError;

/// Completion through `SELECT <function>(model, prompt)`.
#[derive(Debug, Clone)]
pub struct SqlFunctionCompletion {
    pool: PgPool,
    statement: String,
}

impl SqlFunctionCompletion {
    /// `function` must already be validated as a (possibly qualified)
    /// identifier; it is spliced into the statement text.
    pub fn new(pool: PgPool, function: &str) -> Self {
        SqlFunctionCompletion {
            pool,
            statement: completion_statement(function),
        }
    }
}

/// The statement invoking the completion function, with the model and the
/// prompt bound as parameters.
pub fn completion_statement(function: &str) -> String {
    format!("SELECT {function}($1, $2) AS generated_sql")
}

#[async_trait]
impl CompletionCapability for SqlFunctionCompletion {
    async fn complete(&self, model: &str, prompt: &str) -> Result<Option<String>, TransportError> {
        // The connection is held for this call only and returned to the pool on drop.
        let mut connection = self.pool.acquire().await?;

        let generated: Option<Option<String>> = sqlx::query_scalar(&self.statement)
            .bind(model)
            .bind(prompt)
            .fetch_optional(&mut *connection)
            .await?;

        Ok(generated.flatten())
    }

    fn name(&self) -> &'static str {
        "sql-function"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_prompt_is_bound_not_spliced() {
        assert_eq!(
            completion_statement("snowflake.cortex.complete"),
            "SELECT snowflake.cortex.complete($1, $2) AS generated_sql"
        );
    }
}
