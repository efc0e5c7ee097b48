//! Read table and column definitions from `information_schema`.

use query_engine_metadata::metadata::{ColumnInfo, SchemaDescription, TableInfo};
use sqlx::PgConnection;
use tracing::{info_span, Instrument};

use crate::error::Error;

/// Identifier domains are cast to text since they are not plain `name`/`varchar`.
pub const CATALOG_QUERY: &str = "\
SELECT c.table_name::text, c.column_name::text, c.data_type::text \
FROM information_schema.columns c \
WHERE c.table_schema = $1 \
ORDER BY c.table_name, c.ordinal_position";

/// Describe every table of `schema_name` visible to the current role.
pub async fn introspect(
    connection: &mut PgConnection,
    schema_name: &str,
) -> Result<SchemaDescription, Error> {
    let rows: Vec<(String, String, String)> = sqlx::query_as(CATALOG_QUERY)
        .bind(schema_name)
        .fetch_all(connection)
        .instrument(info_span!("Introspect catalog", schema = schema_name))
        .await?;

    Ok(group_columns(schema_name, rows))
}

/// Fold `(table, column, type)` rows into a description. Column order follows
/// row order.
pub fn group_columns(
    schema_name: &str,
    rows: impl IntoIterator<Item = (String, String, String)>,
) -> SchemaDescription {
    let mut schema = SchemaDescription::empty();
    for (table_name, column_name, data_type) in rows {
        schema
            .0
            .entry(table_name)
            .or_insert_with(|| TableInfo {
                schema_name: Some(schema_name.to_string()),
                ..TableInfo::default()
            })
            .columns
            .push(ColumnInfo::new(column_name, data_type));
    }
    schema
}
