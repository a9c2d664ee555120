use serde_json::Value;
use std::fmt;
use tracing::{debug, info};

use super::{ensure_success, UpstreamError};
use crate::types::TavilySearchRequest;

pub const SEARCH_DEPTH: &str = "advanced";
pub const MAX_RESULTS: u32 = 8;

/// Client for the Tavily search API.
#[derive(Clone)]
pub struct TavilyClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl fmt::Debug for TavilyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TavilyClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl TavilyClient {
    pub fn new(http: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    /// Run a search with a synthesized answer. The payload is returned as-is.
    pub async fn search(&self, query: &str) -> Result<Value, UpstreamError> {
        info!("Searching for: {}", query);
        let url = format!("{}/search", self.base_url);
        debug!("Search URL: {}", url);

        let body = TavilySearchRequest {
            query,
            search_depth: SEARCH_DEPTH,
            include_answer: true,
            max_results: MAX_RESULTS,
        };

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;
        let bytes = ensure_success(resp).await?.bytes().await?;
        let payload: Value = serde_json::from_slice(&bytes)?;

        if let Some(results) = payload.get("results").and_then(Value::as_array) {
            info!("Tavily returned {} results", results.len());
        }
        Ok(payload)
    }
}
