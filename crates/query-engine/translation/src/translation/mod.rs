//! Translate a question into a prompt, and a completion into SQL.

pub mod enhancer;
pub mod error;
pub mod prompt;
pub mod question;
pub mod sanitizer;
pub mod temporal;

pub use enhancer::{enhance, EnhancedQuery};
pub use error::Error;
pub use prompt::{build_prompt, Prompt, PromptSettings};
pub use question::Question;
pub use sanitizer::{sanitize, RawCompletion, SanitizedSql};
