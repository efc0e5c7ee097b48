//! Strip formatting artifacts from a completion to obtain a runnable statement.
//!
//! This is string surgery, not parsing: the result is not checked for syntax
//! and multiple statements are not detected.

use serde::Serialize;

use super::error::Error;

const FENCE: &str = "```";

/// Statement keywords that may directly follow an opening fence and must not
/// be mistaken for a language tag.
const STATEMENT_KEYWORDS: &[&str] = &[
    "SELECT", "WITH", "INSERT", "UPDATE", "DELETE", "SHOW", "DESCRIBE", "EXPLAIN", "VALUES",
    "TABLE",
];

/// Unprocessed text returned by the completion capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCompletion(String);

impl RawCompletion {
    pub fn new(text: impl Into<String>) -> Self {
        RawCompletion(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Text believed to be a single executable statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SanitizedSql(String);

impl SanitizedSql {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for SanitizedSql {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Remove code fences and trailing statement terminators.
///
/// Sanitizing already sanitized text returns it unchanged.
pub fn sanitize(raw: &str) -> Result<SanitizedSql, Error> {
    let cleaned = clean(raw);
    if cleaned.is_empty() {
        Err(Error::SanitizerEmpty)
    } else {
        Ok(SanitizedSql(cleaned))
    }
}

fn clean(raw: &str) -> String {
    let unfenced = remove_fences(raw);

    let mut statement = unfenced.trim();
    while let Some(rest) = statement.strip_suffix(';') {
        statement = rest.trim_end();
    }
    statement.to_string()
}

/// Remove every fence, and the language tag of any fence that carries one,
/// wherever it appears: models sometimes lead with prose or keep the whole
/// fenced block on one line.
fn remove_fences(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(index) = rest.find(FENCE) {
        cleaned.push_str(&rest[..index]);
        rest = strip_language_tag(&rest[index + FENCE.len()..]);
    }
    cleaned.push_str(rest);
    cleaned
}

/// Drop the `sql` in "```sql" when the fence is followed by a language tag.
fn strip_language_tag(after_fence: &str) -> &str {
    let end = after_fence
        .find(char::is_whitespace)
        .unwrap_or(after_fence.len());
    let (tag, rest) = after_fence.split_at(end);
    if is_language_tag(tag) {
        rest
    } else {
        after_fence
    }
}

fn is_language_tag(candidate: &str) -> bool {
    candidate.is_empty()
        || (candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+'))
            && !STATEMENT_KEYWORDS
                .iter()
                .any(|keyword| keyword.eq_ignore_ascii_case(candidate)))
}
