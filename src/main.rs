use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

use query_relay::{config::Config, router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();

    info!("Starting query relay");
    if config.groq_api_key.is_none() {
        warn!("GROQ_API_KEY not set, AI mode will return mock answers");
    } else {
        info!("Groq model: {}", config.groq_model);
    }
    if config.tavily_api_key.is_none() {
        warn!("TAVILY_API_KEY not set, web mode will return mock summaries");
    }
    info!(
        "Daily limits: {} ai / {} web per client",
        config.ai_daily_limit, config.web_daily_limit
    );

    let state = Arc::new(AppState::from_config(&config)?);
    let app = router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Query relay listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
