pub mod groq;
pub mod tavily;

pub use groq::GroqClient;
pub use tavily::TavilyClient;

use reqwest::StatusCode;
use std::error::Error as StdError;
use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Name resolution failed, the connection was refused, or the call timed out.
    /// TLS and proxy failures are not in this group.
    #[error("upstream unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),
    #[error("upstream returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("upstream request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("upstream returned an unreadable payload: {0}")]
    Decode(#[from] serde_json::Error),
}

impl UpstreamError {
    pub fn is_unreachable(&self) -> bool {
        matches!(self, UpstreamError::Unreachable(_))
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || is_reachability_failure(&err) {
            UpstreamError::Unreachable(err)
        } else {
            UpstreamError::Request(err)
        }
    }
}

/// Walk the source chain for a refused or timed-out socket, or a failed
/// hostname lookup (including the temporary "try again" resolver failure).
fn is_reachability_failure(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionRefused | io::ErrorKind::TimedOut
            ) {
                return true;
            }
        }
        let message = e.to_string();
        if message.starts_with("dns error") || message.contains("failed to lookup address") {
            return true;
        }
        current = e.source();
    }
    false
}

/// Turn a non-2xx response into [`UpstreamError::Status`].
async fn ensure_success(resp: reqwest::Response) -> Result<reqwest::Response, UpstreamError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(UpstreamError::Status { status, body })
}
