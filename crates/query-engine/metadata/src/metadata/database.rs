//! Metadata information regarding the database tables and their columns.

use std::collections::{BTreeMap, BTreeSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Mapping from a table name to its information.
///
/// This is the set of tables the executor is permitted to query, and the
/// only schema context the prompt is grounded on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct SchemaDescription(pub BTreeMap<String, TableInfo>);

impl SchemaDescription {
    pub fn empty() -> Self {
        SchemaDescription(BTreeMap::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of tables described.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn table(&self, name: &str) -> Option<&TableInfo> {
        self.0.get(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = (&String, &TableInfo)> {
        self.0.iter()
    }

    /// Add a table, replacing any previous definition under the same name.
    pub fn insert(&mut self, name: impl Into<String>, table: TableInfo) {
        self.0.insert(name.into(), table);
    }

    /// Keep only the named tables. Names are compared case-insensitively,
    /// since catalogs differ in how they fold identifiers.
    pub fn retain_tables(&mut self, allowed: &BTreeSet<String>) {
        let allowed: BTreeSet<String> = allowed.iter().map(|name| name.to_lowercase()).collect();
        self.0
            .retain(|name, _| allowed.contains(&name.to_lowercase()));
    }

    /// Total number of columns across every table.
    pub fn column_count(&self) -> usize {
        self.0.values().map(|table| table.columns.len()).sum()
    }
}

impl FromIterator<(String, TableInfo)> for SchemaDescription {
    fn from_iter<I: IntoIterator<Item = (String, TableInfo)>>(iter: I) -> Self {
        SchemaDescription(iter.into_iter().collect())
    }
}

/// Information about a database table (or any other kind of relation).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    /// Columns in declaration order.
    pub columns: Vec<ColumnInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TableInfo {
    pub fn new(columns: Vec<ColumnInfo>) -> Self {
        TableInfo {
            schema_name: None,
            columns,
            description: None,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|column| column.name == name)
    }
}

/// Information about a database column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnInfo {
    pub name: String,
    /// The type as declared in the catalog, e.g. `NUMBER` or `timestamp with time zone`.
    pub r#type: String,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, r#type: impl Into<String>) -> Self {
        ColumnInfo {
            name: name.into(),
            r#type: r#type.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn telemetry() -> TableInfo {
        TableInfo::new(vec![
            ColumnInfo::new("DEVICE", "TEXT"),
            ColumnInfo::new("HUMIDITY", "FLOAT"),
            ColumnInfo::new("TS", "TIMESTAMP_NTZ"),
        ])
    }

    #[test]
    fn columns_keep_declaration_order() {
        let json = serde_json::to_value(telemetry()).unwrap();
        let parsed: TableInfo = serde_json::from_value(json).unwrap();
        let names: Vec<&str> = parsed.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["DEVICE", "HUMIDITY", "TS"]);
    }

    #[test]
    fn retain_tables_ignores_case() {
        let mut schema: SchemaDescription = [
            ("IOT_TELEMETRY_DATA".to_string(), telemetry()),
            ("AUDIT_LOG".to_string(), TableInfo::default()),
        ]
        .into_iter()
        .collect();

        schema.retain_tables(&BTreeSet::from(["iot_telemetry_data".to_string()]));

        assert_eq!(schema.len(), 1);
        assert!(schema.table("IOT_TELEMETRY_DATA").is_some());
        assert_eq!(schema.column_count(), 3);
    }
}
