use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{Request, StatusCode},
    routing::get,
    Router,
};
use query_relay::{
    quota::{QuotaTracker, MAX_AI_PER_DAY},
    relay::{Relay, AI_LIMIT_MESSAGE, INVALID_MODE_MESSAGE},
    router,
    routes::with_layers,
    AppState,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceExt;

fn offline_state() -> Arc<AppState> {
    Arc::new(AppState::new(
        Relay::new(QuotaTracker::default(), None, None),
        "public",
    ))
}

fn search(body: Value, forwarded_for: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/search")
        .header("content-type", "application/json");
    if let Some(value) = forwarded_for {
        builder = builder.header("x-forwarded-for", value);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn twenty_ai_requests_then_limit() {
    let state = offline_state();
    let app = router(state.clone());

    for i in 1..=MAX_AI_PER_DAY {
        let (status, body) = send(
            &app,
            search(json!({ "query": "explain ownership", "mode": "ai" }), Some("198.51.100.1")),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "request {i}");
        let answer = body["answer"].as_str().unwrap();
        assert!(answer.contains("explain ownership"), "request {i}: {answer}");
        assert!(answer.contains("GROQ_API_KEY"));
    }

    let (status, body) = send(
        &app,
        search(json!({ "query": "explain ownership", "mode": "ai" }), Some("198.51.100.1")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "answer": AI_LIMIT_MESSAGE }));

    let record = state.relay.quota().record("198.51.100.1").unwrap();
    assert_eq!(record.ai_count, MAX_AI_PER_DAY);
}

#[tokio::test]
async fn forwarded_for_first_entry_owns_the_usage() {
    let state = offline_state();
    let app = router(state.clone());

    send(
        &app,
        search(json!({ "query": "q", "mode": "web" }), Some("203.0.113.5, 10.0.0.1")),
    )
    .await;

    let quota = state.relay.quota();
    assert_eq!(quota.record("203.0.113.5").map(|r| r.web_count), Some(1));
    assert_eq!(quota.record("10.0.0.1"), None);
}

#[tokio::test]
async fn peer_address_is_used_without_forwarded_for() {
    let state = offline_state();
    let app = router(state.clone());

    let mut req = search(json!({ "query": "q", "mode": "ai" }), None);
    let peer: SocketAddr = "192.0.2.44:61000".parse().unwrap();
    req.extensions_mut().insert(ConnectInfo(peer));
    send(&app, req).await;

    assert_eq!(
        state.relay.quota().record("192.0.2.44").map(|r| r.ai_count),
        Some(1)
    );
}

#[tokio::test]
async fn web_mock_returns_empty_results() {
    let app = router(offline_state());
    let (status, body) = send(&app, search(json!({ "query": "weather in oslo", "mode": "web" }), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], json!([]));
    assert!(body["answer"].as_str().unwrap().contains("weather in oslo"));
}

#[tokio::test]
async fn bad_queries_are_rejected_without_side_effects() {
    let state = offline_state();
    let app = router(state.clone());

    for body in [
        json!({ "mode": "ai" }),
        json!({ "query": 42, "mode": "ai" }),
        json!({ "query": null, "mode": "web" }),
        json!({ "query": "", "mode": "web" }),
    ] {
        let (status, resp) = send(&app, search(body.clone(), None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body: {body}");
        assert!(resp["answer"].is_string());
    }
    assert_eq!(state.relay.quota().client_count(), 0);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let state = offline_state();
    let app = router(state.clone());

    let req = Request::builder()
        .method("POST")
        .uri("/api/search")
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["answer"].is_string());
    assert_eq!(state.relay.quota().client_count(), 0);
}

#[tokio::test]
async fn unknown_or_missing_mode_is_in_band() {
    let state = offline_state();
    let app = router(state.clone());

    for body in [json!({ "query": "q", "mode": "other" }), json!({ "query": "q" })] {
        let (status, resp) = send(&app, search(body, Some("203.0.113.9"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(resp, json!({ "answer": INVALID_MODE_MESSAGE }));
    }
    assert_eq!(state.relay.quota().record("203.0.113.9"), None);
}

#[tokio::test]
async fn health_reports_healthy() {
    let app = router(offline_state());
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "query-relay");
}

async fn explode() -> &'static str {
    panic!("handler blew up")
}

#[tokio::test]
async fn panicking_handler_is_caught_by_the_layer_stack() {
    let app = with_layers(Router::new().route("/explode", get(explode)));
    let req = Request::builder().uri("/explode").body(Body::empty()).unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "answer": "Server crashed internally." }));
}

#[tokio::test]
async fn search_routes_keep_cors_from_the_layer_stack() {
    let app = router(offline_state());
    let mut req = search(json!({ "query": "q", "mode": "other" }), None);
    req.headers_mut()
        .insert("origin", "https://example.com".parse().unwrap());
    let response = app.oneshot(req).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}

#[test]
fn app_state_is_debuggable_without_credentials() {
    let config = query_relay::config::Config {
        groq_api_key: Some("gsk-secret".to_string()),
        tavily_api_key: Some("tvly-secret".to_string()),
        ..Default::default()
    };
    let state = AppState::from_config(&config).unwrap();
    let rendered = format!("{:?}", state);
    assert!(rendered.contains("QuotaTracker"));
    assert!(!rendered.contains("gsk-secret"));
    assert!(!rendered.contains("tvly-secret"));
}
