//! Run a single statement on a connection and materialize its rows.

use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{Column, Executor, PgConnection, Row, Statement, TypeInfo};
use tracing::{info_span, Instrument};

use crate::engine::ExecutionResult;
use crate::error::Error;

/// Execute `sql` verbatim and collect every row.
pub async fn execute(connection: &mut PgConnection, sql: &str) -> Result<ExecutionResult, Error> {
    // Preparing reports the column names even when the statement returns no rows.
    let statement = (&mut *connection)
        .prepare(sql)
        .instrument(info_span!("Describe statement"))
        .await?;
    let columns: Vec<String> = statement
        .columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect();

    // An unparameterised statement goes over the simple query protocol, so
    // every value comes back in its text form.
    let rows: Vec<PgRow> = (&mut *connection)
        .fetch_all(sql)
        .instrument(info_span!("Fetch rows"))
        .await?;

    let values = rows
        .iter()
        .map(|row| (0..row.len()).map(|index| decode_value(row, index)).collect())
        .collect::<Result<Vec<Vec<Value>>, Error>>()?;

    tracing::info!(columns = columns.len(), rows = values.len(), "Statement executed");

    ExecutionResult::from_rows(columns, values)
}

/// Convert one column of a row into JSON, choosing the representation by the
/// column's declared type. Anything not recognised is returned as text.
fn decode_value(row: &PgRow, index: usize) -> Result<Value, Error> {
    let type_name = row.column(index).type_info().name().to_ascii_uppercase();
    let value = match type_name.as_str() {
        "BOOL" => row.try_get::<Option<bool>, _>(index)?.map(Value::Bool),
        "INT2" => row.try_get::<Option<i16>, _>(index)?.map(Value::from),
        "INT4" => row.try_get::<Option<i32>, _>(index)?.map(Value::from),
        "INT8" => row.try_get::<Option<i64>, _>(index)?.map(Value::from),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)?
            .map(|float| float_value(f64::from(float))),
        "FLOAT8" => row.try_get::<Option<f64>, _>(index)?.map(float_value),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(index)?,
        "NUMERIC" => text(row, index)?.map(|text| numeric_value(&text)),
        _ => text(row, index)?.map(Value::String),
    };
    Ok(value.unwrap_or(Value::Null))
}

fn text(row: &PgRow, index: usize) -> Result<Option<String>, Error> {
    Ok(row.try_get_unchecked::<Option<String>, _>(index)?)
}

/// Non-finite floats have no JSON number form.
fn float_value(float: f64) -> Value {
    serde_json::Number::from_f64(float).map_or_else(|| Value::String(float.to_string()), Value::Number)
}

/// Numerics become JSON numbers when they parse as one ("NaN" stays text).
pub fn numeric_value(text: &str) -> Value {
    serde_json::from_str::<serde_json::Number>(text)
        .map_or_else(|_| Value::String(text.to_string()), Value::Number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numerics_become_numbers() {
        assert_eq!(numeric_value("42"), json!(42));
        assert_eq!(numeric_value("-0.5"), json!(-0.5));
        assert_eq!(numeric_value("NaN"), json!("NaN"));
    }

    #[test]
    fn non_finite_floats_are_text() {
        assert_eq!(float_value(1.5), json!(1.5));
        assert_eq!(float_value(f64::INFINITY), json!("inf"));
    }
}
