//! The raw question as typed by the user.

use super::error::Error;

/// A question that is known to contain more than whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question(String);

impl Question {
    /// Accept a raw question, rejecting blank input before anything downstream runs.
    pub fn new(raw: impl Into<String>) -> Result<Self, Error> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            Err(Error::EmptyInput)
        } else {
            Ok(Question(raw))
        }
    }

    /// The original text, untouched.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
