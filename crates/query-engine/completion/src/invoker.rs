//! Call the completion capability and insist on a usable answer.

use query_engine_translation::translation::{Prompt, RawCompletion};

use crate::capability::CompletionCapability;
use crate::error::Error;

/// Send the prompt to the capability once.
///
/// A missing or blank answer is an error; it must never reach the sanitizer
/// as if it were SQL.
pub async fn invoke(
    capability: &dyn CompletionCapability,
    model: &str,
    prompt: &Prompt,
) -> Result<RawCompletion, Error> {
    tracing::debug!(
        capability = capability.name(),
        model,
        prompt_chars = prompt.as_str().len(),
        "Requesting completion"
    );

    match capability.complete(model, prompt.as_str()).await? {
        Some(text) if !text.trim().is_empty() => Ok(RawCompletion::new(text)),
        _ => Err(Error::Empty),
    }
}
