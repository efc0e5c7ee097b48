//! The seam between the pipeline and whatever hosts the language model.

use async_trait::async_trait;

use crate::error::TransportError;

/// A hosted service that turns a prompt into generated text.
#[async_trait]
pub trait CompletionCapability: Send + Sync {
    /// Ask `model` to complete `prompt`.
    ///
    /// `Ok(None)` means the service answered without any text.
    async fn complete(&self, model: &str, prompt: &str) -> Result<Option<String>, TransportError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}
