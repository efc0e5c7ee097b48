//! Build the instruction sent to the completion capability.

use std::fmt::Write;

use query_engine_metadata::metadata::SchemaDescription;

use super::enhancer::EnhancedQuery;
use super::error::Error;

pub const DEFAULT_DIALECT: &str = "PostgreSQL";
pub const DEFAULT_MAX_SCHEMA_CHARS: usize = 16_000;

/// Knobs that shape the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSettings {
    /// The SQL dialect the model should write.
    pub dialect: String,
    /// The largest rendered schema section accepted. Larger schemas are an
    /// error rather than being truncated.
    pub max_schema_chars: usize,
}

impl Default for PromptSettings {
    fn default() -> Self {
        PromptSettings {
            dialect: DEFAULT_DIALECT.to_string(),
            max_schema_chars: DEFAULT_MAX_SCHEMA_CHARS,
        }
    }
}

/// A complete instruction string for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    /// Wrap prompt text that was assembled elsewhere.
    pub fn new(text: impl Into<String>) -> Self {
        Prompt(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Prompt {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Render the schema as one `table: column (type), column (type)` line per table.
pub fn render_schema(schema: &SchemaDescription) -> String {
    let mut rendered = String::new();
    for (table_name, table) in schema.tables() {
        if !rendered.is_empty() {
            rendered.push('\n');
        }
        match &table.schema_name {
            Some(schema_name) => {
                let _ = write!(rendered, "{schema_name}.{table_name}:");
            }
            None => {
                let _ = write!(rendered, "{table_name}:");
            }
        }
        if table.columns.is_empty() {
            rendered.push_str(" (columns unknown)");
        }
        for (index, column) in table.columns.iter().enumerate() {
            let separator = if index == 0 { " " } else { ", " };
            let _ = write!(rendered, "{separator}{} ({})", column.name, column.r#type);
        }
    }
    rendered
}

/// Combine the role statement, schema and enhanced question into a prompt.
pub fn build_prompt(
    enhanced: &EnhancedQuery,
    schema: &SchemaDescription,
    settings: &PromptSettings,
) -> Result<Prompt, Error> {
    if schema.is_empty() {
        return Err(Error::EmptySchema);
    }

    let schema_section = render_schema(schema);
    let size = schema_section.chars().count();
    if size > settings.max_schema_chars {
        return Err(Error::SchemaTooLarge {
            size,
            limit: settings.max_schema_chars,
        });
    }

    tracing::debug!(
        tables = schema.len(),
        schema_chars = size,
        "Rendered schema for prompt"
    );

    let dialect = &settings.dialect;
    Ok(Prompt(format!(
        "You are a SQL expert for {dialect}. Translate the user's question into a single {dialect} query.\n\
         \n\
         AVAILABLE TABLES AND COLUMNS (use these exact names):\n\
         {schema_section}\n\
         \n\
         RULES:\n\
         1. Use only the tables and columns listed above; no other tables or columns exist.\n\
         2. Qualify column names with their table when more than one table is involved.\n\
         3. Write exactly one statement.\n\
         \n\
         USER QUESTION: {question}\n\
         \n\
         Respond with the SQL statement alone: no explanations, no comments, no markdown code fences.",
        question = enhanced.as_str(),
    )))
}
