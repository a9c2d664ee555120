use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

use crate::quota::{MAX_AI_PER_DAY, MAX_WEB_PER_DAY};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_GROQ_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_TAVILY_URL: &str = "https://api.tavily.com";
pub const DEFAULT_STATIC_DIR: &str = "public";

/// Settings read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub groq_api_key: Option<String>,
    pub groq_url: String,
    pub groq_model: String,
    pub tavily_api_key: Option<String>,
    pub tavily_url: String,
    pub static_dir: String,
    pub ai_daily_limit: u32,
    pub web_daily_limit: u32,
    pub upstream_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            groq_api_key: None,
            groq_url: DEFAULT_GROQ_URL.to_string(),
            groq_model: DEFAULT_GROQ_MODEL.to_string(),
            tavily_api_key: None,
            tavily_url: DEFAULT_TAVILY_URL.to_string(),
            static_dir: DEFAULT_STATIC_DIR.to_string(),
            ai_daily_limit: MAX_AI_PER_DAY,
            web_daily_limit: MAX_WEB_PER_DAY,
            upstream_timeout: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Empty values are treated
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Config::default();

        Self {
            port: parse_or(get("PORT"), "PORT", defaults.port),
            groq_api_key: get("GROQ_API_KEY"),
            groq_url: get("GROQ_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.groq_url),
            groq_model: get("GROQ_MODEL").unwrap_or(defaults.groq_model),
            tavily_api_key: get("TAVILY_API_KEY"),
            tavily_url: get("TAVILY_API_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or(defaults.tavily_url),
            static_dir: get("STATIC_DIR").unwrap_or(defaults.static_dir),
            ai_daily_limit: parse_or(get("AI_DAILY_LIMIT"), "AI_DAILY_LIMIT", defaults.ai_daily_limit),
            web_daily_limit: parse_or(get("WEB_DAILY_LIMIT"), "WEB_DAILY_LIMIT", defaults.web_daily_limit),
            upstream_timeout: get("UPSTREAM_TIMEOUT_SECS")
                .and_then(|v| match v.parse::<u64>() {
                    Ok(secs) => Some(Duration::from_secs(secs)),
                    Err(_) => {
                        warn!("Ignoring invalid UPSTREAM_TIMEOUT_SECS value: {}", v);
                        None
                    }
                }),
        }
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &str, default: T) -> T {
    match raw {
        Some(v) => v.parse().unwrap_or_else(|_| {
            warn!("Invalid value for {}: {}, using default", key, v);
            default
        }),
        None => default,
    }
}
