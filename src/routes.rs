use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::HeaderMap,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::client_id::client_id;
use crate::error::{handle_panic, ApiError};
use crate::relay::Outcome;
use crate::types::Mode;
use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let assets = ServeDir::new(&state.static_dir);

    let routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/search", post(search_handler))
        .fallback_service(assets);

    with_layers(routes).with_state(state)
}

/// Panic safety net, CORS and request tracing, applied to every route
/// registered on `routes`.
pub fn with_layers<S>(routes: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    routes
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> Json<Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "query-relay",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

pub async fn search_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Outcome, ApiError> {
    let Json(body) = payload.map_err(|e| {
        warn!("Rejected search body: {}", e);
        ApiError::InvalidBody(e.body_text())
    })?;

    let query = body
        .get("query")
        .and_then(Value::as_str)
        .filter(|q| !q.is_empty())
        .ok_or(ApiError::MissingQuery)?;
    let mode = Mode::from_value(body.get("mode"));
    let client = client_id(&headers, peer.map(|ConnectInfo(addr)| addr));

    info!("Search request from {} (mode: {:?})", client, mode);
    Ok(state.relay.handle(query, mode, &client).await)
}
