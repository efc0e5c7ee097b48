//! Fixture schemas.

use query_engine_metadata::metadata::{ColumnInfo, SchemaDescription, TableInfo};

/// `ORDERS` with its key and totals.
pub fn orders_schema() -> SchemaDescription {
    [(
        "ORDERS".to_string(),
        TableInfo::new(vec![
            ColumnInfo::new("O_ORDERKEY", "NUMBER"),
            ColumnInfo::new("O_CUSTKEY", "NUMBER"),
            ColumnInfo::new("O_TOTALPRICE", "NUMBER(12,2)"),
            ColumnInfo::new("O_ORDERDATE", "DATE"),
        ]),
    )]
    .into_iter()
    .collect()
}

/// Device readings, for temporal and threshold questions.
pub fn telemetry_schema() -> SchemaDescription {
    [(
        "iot_telemetry_data".to_string(),
        TableInfo {
            schema_name: Some("public".to_string()),
            ..TableInfo::new(vec![
                ColumnInfo::new("device", "text"),
                ColumnInfo::new("humidity", "double precision"),
                ColumnInfo::new("temp", "double precision"),
                ColumnInfo::new("ts", "timestamp with time zone"),
            ])
        },
    )]
    .into_iter()
    .collect()
}
