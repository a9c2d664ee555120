use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// Which upstream a search is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Ai,
    Web,
}

impl Mode {
    /// Parse the `mode` field of a request body. Anything other than the
    /// exact strings `"ai"` and `"web"` is rejected.
    pub fn from_value(value: Option<&Value>) -> Option<Mode> {
        match value.and_then(|v| v.as_str()) {
            Some("ai") => Some(Mode::Ai),
            Some("web") => Some(Mode::Web),
            _ => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Ai => f.write_str("ai"),
            Mode::Web => f.write_str("web"),
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SearchResponse {
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<Value>>,
}

impl SearchResponse {
    pub fn answer(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            results: None,
        }
    }

    pub fn with_empty_results(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            results: Some(Vec::new()),
        }
    }
}

impl From<SearchResponse> for Value {
    fn from(response: SearchResponse) -> Self {
        let mut body = Map::new();
        body.insert("answer".to_string(), Value::String(response.answer));
        if let Some(results) = response.results {
            body.insert("results".to_string(), Value::Array(results));
        }
        Value::Object(body)
    }
}

// Groq (OpenAI-compatible) chat completion request
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

// Tavily search request
#[derive(Debug, Serialize)]
pub struct TavilySearchRequest<'a> {
    pub query: &'a str,
    pub search_depth: &'a str,
    pub include_answer: bool,
    pub max_results: u32,
}
