//! Audit sink delivery tests
//!
//! The HTTP sink is exercised against a throwaway axum listener that records
//! what it receives.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::post,
    Router,
};
use snip::audit::{AuditHub, AuditSink, FileSink, HttpSink};
use snip::models::{AuditAction, AuditEvent};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct Received {
    requests: Mutex<Vec<(Option<String>, String)>>,
}

async fn record(
    State(received): State<Arc<Received>>,
    headers: HeaderMap,
    body: String,
) -> StatusCode {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    received.requests.lock().unwrap().push((content_type, body));
    StatusCode::OK
}

/// Start a receiver and return its endpoint URL
async fn spawn_receiver(status_route: bool) -> (String, Arc<Received>) {
    let received = Arc::new(Received::default());
    let mut router = Router::new().route("/audit", post(record));
    if status_route {
        router = router.route("/broken", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
    }
    let router = router.with_state(Arc::clone(&received));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{}", addr), received)
}

fn log_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "snip-audit-it-{}-{}.log",
        name,
        std::process::id()
    ))
}

/// An endpoint nothing listens on
async fn closed_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/audit", addr)
}

#[tokio::test]
async fn test_http_sink_posts_json() {
    let (base, received) = spawn_receiver(false).await;
    let sink = HttpSink::new(format!("{}/audit", base)).unwrap();

    let event = AuditEvent {
        ts: 1700000000,
        action: AuditAction::Follow,
        user_id: "user1".to_string(),
        url: "https://example.com".to_string(),
    };
    sink.update(&event).await;

    let requests = received.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0.as_deref(), Some("application/json"));

    let body: serde_json::Value = serde_json::from_str(&requests[0].1).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "ts": 1700000000,
            "action": "follow",
            "user_id": "user1",
            "url": "https://example.com"
        })
    );
}

#[tokio::test]
async fn test_http_sink_tolerates_error_status() {
    let (base, received) = spawn_receiver(true).await;
    let sink = HttpSink::new(format!("{}/broken", base)).unwrap();

    sink.update(&AuditEvent::now(AuditAction::Shorten, "u", "https://example.com"))
        .await;

    assert!(received.requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failing_sink_does_not_stop_later_sinks() {
    let path = log_path("after-failure");
    let _ = std::fs::remove_file(&path);

    let mut hub = AuditHub::new();
    hub.register(Arc::new(HttpSink::new(closed_endpoint().await).unwrap()));
    hub.register(Arc::new(FileSink::new(path.clone())));

    let event = AuditEvent::now(AuditAction::Shorten, "user1", "https://example.com");
    hub.notify(&event).await;

    let raw = std::fs::read_to_string(&path).unwrap();
    let written: AuditEvent = serde_json::from_str(raw.trim()).unwrap();
    assert_eq!(written, event);

    std::fs::remove_file(&path).unwrap();
}

#[tokio::test]
async fn test_hub_delivers_to_http_and_file() {
    let (base, received) = spawn_receiver(false).await;
    let path = log_path("both");
    let _ = std::fs::remove_file(&path);

    let mut hub = AuditHub::new();
    hub.register(Arc::new(HttpSink::new(format!("{}/audit", base)).unwrap()));
    hub.register(Arc::new(FileSink::new(path.clone())));

    for i in 0..3 {
        hub.notify(&AuditEvent::now(
            AuditAction::Shorten,
            "user1",
            format!("https://example.com/{}", i),
        ))
        .await;
    }

    assert_eq!(received.requests.lock().unwrap().len(), 3);
    let raw = std::fs::read_to_string(&path).unwrap();
    assert_eq!(raw.lines().count(), 3);

    std::fs::remove_file(&path).unwrap();
}
