//! Completion over HTTP, speaking the widely supported chat-completions format.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::capability::CompletionCapability;
use crate::error::TransportError;

/// How much of an error body is kept for diagnostics.
const ERROR_BODY_LIMIT: usize = 500;

/// A client for an OpenAI-compatible `chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    client: reqwest::Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl HttpCompletionClient {
    pub fn new(endpoint: Url, api_key: Option<String>) -> Self {
        HttpCompletionClient {
            client: reqwest::Client::new(),
            endpoint,
            api_key,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[async_trait]
impl CompletionCapability for HttpCompletionClient {
    async fn complete(&self, model: &str, prompt: &str) -> Result<Option<String>, TransportError> {
        let body = ChatCompletionRequest {
            model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.0,
        };

        let mut request = self.client.post(self.endpoint.clone()).json(&body);
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(TransportError::new(format!(
                "completion endpoint responded with {status}: {body}"
            )));
        }

        let completion: ChatCompletionResponse = response.json().await?;

        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
