use serde_json::Value;
use std::fmt;
use tracing::debug;

use super::{ensure_success, UpstreamError};
use crate::types::{ChatCompletionRequest, ChatMessage};

pub const SYSTEM_PROMPT: &str = "You are a helpful search assistant. Answer concisely in a clear, \
educational tone. Refuse to provide harmful, dangerous, or illegal instructions.";
pub const TEMPERATURE: f32 = 0.3;
pub const MAX_TOKENS: u32 = 512;

/// Client for Groq's OpenAI-compatible chat completion endpoint.
#[derive(Clone)]
pub struct GroqClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

// The API key stays out of logs.
impl fmt::Debug for GroqClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroqClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GroqClient {
    pub fn new(http: reqwest::Client, base_url: String, api_key: String, model: String) -> Self {
        Self {
            http,
            base_url,
            api_key,
            model,
        }
    }

    /// Ask the model about `query`. `Ok(None)` means the call went through
    /// but the payload had no usable `choices[0].message.content`.
    pub async fn complete(&self, query: &str) -> Result<Option<String>, UpstreamError> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("Groq URL: {}", url);

        let body = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: query,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let bytes = ensure_success(resp).await?.bytes().await?;

        Ok(serde_json::from_slice::<Value>(&bytes)
            .ok()
            .as_ref()
            .and_then(first_choice_content))
    }
}

fn first_choice_content(payload: &Value) -> Option<String> {
    payload
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
