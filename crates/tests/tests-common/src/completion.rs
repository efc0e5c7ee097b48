//! A completion capability that replays scripted answers.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use query_engine_completion::{CompletionCapability, TransportError};

/// Answers each call with the next scripted response. Once the script runs
/// out, the last response is repeated.
#[derive(Debug)]
pub struct ScriptedCompletion {
    script: Mutex<VecDeque<Result<Option<String>, TransportError>>>,
    last: Mutex<Option<Result<Option<String>, TransportError>>>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedCompletion {
    pub fn new(script: Vec<Result<Option<String>, TransportError>>) -> Self {
        ScriptedCompletion {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with `text`.
    pub fn returning(text: &str) -> Self {
        Self::new(vec![Ok(Some(text.to_string()))])
    }

    /// Always answer with nothing.
    pub fn empty() -> Self {
        Self::new(vec![Ok(None)])
    }

    /// Always fail at the transport level.
    pub fn failing(message: &str) -> Self {
        Self::new(vec![Err(TransportError::new(message))])
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// `(model, prompt)` of every call so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl CompletionCapability for ScriptedCompletion {
    async fn complete(&self, model: &str, prompt: &str) -> Result<Option<String>, TransportError> {
        self.calls
            .lock()
            .push((model.to_string(), prompt.to_string()));

        let next = self.script.lock().pop_front();
        let mut last = self.last.lock();
        if let Some(next) = next {
            *last = Some(next);
        }
        last.clone().unwrap_or(Ok(None))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
