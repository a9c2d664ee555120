//! Routes a query to Groq or Tavily after charging the client's quota.
//!
//! Every business result, including quota exhaustion and upstream failures,
//! comes back as an [`Outcome`] and is rendered with a 200 status. Only the
//! HTTP layer produces error statuses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::quota::{QuotaLimits, QuotaTracker};
use crate::types::{Mode, SearchResponse};
use crate::upstream::{GroqClient, TavilyClient, UpstreamError};

pub const AI_LIMIT_MESSAGE: &str =
    "You have reached the free AI limit for today. Please try again tomorrow or use Web Summary mode.";
pub const WEB_LIMIT_MESSAGE: &str =
    "You have reached the free Web Summary limit for today. Please try again tomorrow.";
pub const NO_MODEL_RESPONSE_MESSAGE: &str = "AI error: No response from Groq model.";
pub const AI_UPSTREAM_ERROR_MESSAGE: &str = "AI error: Unexpected server error while calling Groq.";
pub const WEB_UPSTREAM_ERROR_MESSAGE: &str = "Web summary error: Unexpected server error.";
pub const INVALID_MODE_MESSAGE: &str = "Invalid mode. Use 'ai' or 'web'.";

/// Why a mock answer was served instead of a live one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackCause {
    MissingCredential,
    Unreachable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Answer(String),
    /// Tavily payload, returned untouched.
    Passthrough(Value),
    LimitReached(Mode),
    Mock {
        mode: Mode,
        query: String,
        cause: FallbackCause,
    },
    NoModelResponse,
    UpstreamError(Mode),
    InvalidMode,
}

pub fn mock_ai_answer(query: &str) -> String {
    format!(
        "[Mock AI answer] You asked: \"{}\". GROQ_API_KEY is not configured or Groq is unreachable, so this is a placeholder answer.",
        query
    )
}

pub fn mock_web_summary(query: &str) -> String {
    format!(
        "[Mock web summary] Results for \"{}\" are unavailable because TAVILY_API_KEY is not configured or Tavily is unreachable.",
        query
    )
}

impl Outcome {
    /// Render to the JSON body callers depend on.
    pub fn into_body(self) -> Value {
        let response = match self {
            Outcome::Passthrough(payload) => return payload,
            Outcome::Answer(text) => SearchResponse::answer(text),
            Outcome::LimitReached(Mode::Ai) => SearchResponse::answer(AI_LIMIT_MESSAGE),
            Outcome::LimitReached(Mode::Web) => SearchResponse::with_empty_results(WEB_LIMIT_MESSAGE),
            Outcome::Mock { mode: Mode::Ai, query, .. } => SearchResponse::answer(mock_ai_answer(&query)),
            Outcome::Mock { mode: Mode::Web, query, .. } => {
                SearchResponse::with_empty_results(mock_web_summary(&query))
            }
            Outcome::NoModelResponse => SearchResponse::answer(NO_MODEL_RESPONSE_MESSAGE),
            Outcome::UpstreamError(Mode::Ai) => SearchResponse::answer(AI_UPSTREAM_ERROR_MESSAGE),
            Outcome::UpstreamError(Mode::Web) => {
                SearchResponse::with_empty_results(WEB_UPSTREAM_ERROR_MESSAGE)
            }
            Outcome::InvalidMode => SearchResponse::answer(INVALID_MODE_MESSAGE),
        };
        response.into()
    }
}

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self.into_body())).into_response()
    }
}

#[derive(Debug)]
pub struct Relay {
    quota: QuotaTracker,
    groq: Option<GroqClient>,
    tavily: Option<TavilyClient>,
}

impl Relay {
    pub fn new(quota: QuotaTracker, groq: Option<GroqClient>, tavily: Option<TavilyClient>) -> Self {
        Self { quota, groq, tavily }
    }

    /// Build the relay from startup config. A missing credential leaves the
    /// matching upstream unset, which puts that mode in mock mode.
    pub fn from_config(config: &Config, http: reqwest::Client) -> Self {
        let groq = config.groq_api_key.clone().map(|key| {
            GroqClient::new(
                http.clone(),
                config.groq_url.clone(),
                key,
                config.groq_model.clone(),
            )
        });
        let tavily = config
            .tavily_api_key
            .clone()
            .map(|key| TavilyClient::new(http.clone(), config.tavily_url.clone(), key));
        let quota = QuotaTracker::new(QuotaLimits {
            ai_per_window: config.ai_daily_limit,
            web_per_window: config.web_daily_limit,
        });
        Self::new(quota, groq, tavily)
    }

    pub fn quota(&self) -> &QuotaTracker {
        &self.quota
    }

    pub async fn handle(&self, query: &str, mode: Option<Mode>, client_id: &str) -> Outcome {
        self.quota.reset_if_expired();

        let Some(mode) = mode else {
            return Outcome::InvalidMode;
        };

        match self.quota.try_consume(client_id, mode) {
            Ok(record) => info!(
                "Client {} used {} request ({} ai / {} web)",
                client_id, mode, record.ai_count, record.web_count
            ),
            Err(e) => {
                info!("Client {} hit limit: {}", client_id, e);
                return Outcome::LimitReached(mode);
            }
        }

        match mode {
            Mode::Ai => self.ask_ai(query).await,
            Mode::Web => self.search_web(query).await,
        }
    }

    async fn ask_ai(&self, query: &str) -> Outcome {
        let Some(groq) = &self.groq else {
            return mock(Mode::Ai, query, FallbackCause::MissingCredential);
        };
        match groq.complete(query).await {
            Ok(Some(answer)) => Outcome::Answer(answer),
            Ok(None) => {
                warn!("Groq returned no choices");
                Outcome::NoModelResponse
            }
            Err(e) => upstream_failure(Mode::Ai, query, e),
        }
    }

    async fn search_web(&self, query: &str) -> Outcome {
        let Some(tavily) = &self.tavily else {
            return mock(Mode::Web, query, FallbackCause::MissingCredential);
        };
        match tavily.search(query).await {
            Ok(payload) => Outcome::Passthrough(payload),
            Err(e) => upstream_failure(Mode::Web, query, e),
        }
    }
}

fn mock(mode: Mode, query: &str, cause: FallbackCause) -> Outcome {
    Outcome::Mock {
        mode,
        query: query.to_string(),
        cause,
    }
}

fn upstream_failure(mode: Mode, query: &str, err: UpstreamError) -> Outcome {
    if err.is_unreachable() {
        warn!("{} upstream unreachable, serving mock: {}", mode, err);
        mock(mode, query, FallbackCause::Unreachable)
    } else {
        error!("{} upstream error: {}", mode, err);
        Outcome::UpstreamError(mode)
    }
}
