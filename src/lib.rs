pub mod client_id;
pub mod config;
pub mod error;
pub mod quota;
pub mod relay;
pub mod routes;
pub mod types;
pub mod upstream;

use config::Config;
use relay::Relay;

pub use routes::router;
pub use types::*;

#[derive(Debug)]
pub struct AppState {
    pub relay: Relay,
    pub static_dir: String,
}

impl AppState {
    pub fn new(relay: Relay, static_dir: impl Into<String>) -> Self {
        Self {
            relay,
            static_dir: static_dir.into(),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.upstream_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        Ok(Self::new(
            Relay::from_config(config, http_client),
            config.static_dir.clone(),
        ))
    }
}
