use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Multipart, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use upstream::{CircuitBreaker, CircuitState, ClientOptions, RetryPolicy, Upload, UpstreamClient, UpstreamError};

#[derive(Clone, Default)]
struct Hits(Arc<AtomicU32>);

async fn ocr(Query(q): Query<std::collections::HashMap<String, String>>, mut mp: Multipart) -> Json<Value> {
    let mut size = 0usize;
    let mut field_name = String::new();
    while let Ok(Some(field)) = mp.next_field().await {
        field_name = field.name().unwrap_or_default().to_string();
        size += field.bytes().await.map(|b| b.len()).unwrap_or(0);
    }
    Json(json!({
        "success": true,
        "text": "CITY MART\nMilk 3.49\nTOTAL 3.49",
        "lang": q.get("lang").cloned().unwrap_or_default(),
        "field": field_name,
        "bytes": size,
    }))
}

async fn flaky(State(hits): State<Hits>) -> Result<Json<Value>, StatusCode> {
    if hits.0.fetch_add(1, Ordering::SeqCst) < 2 {
        Err(StatusCode::SERVICE_UNAVAILABLE)
    } else {
        Ok(Json(json!({"ok": true})))
    }
}

async fn down(State(hits): State<Hits>) -> StatusCode {
    hits.0.fetch_add(1, Ordering::SeqCst);
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn spawn_mock() -> (SocketAddr, Hits, Hits) {
    let flaky_hits = Hits::default();
    let down_hits = Hits::default();
    let app = Router::new()
        .route("/ocr", post(ocr))
        .route("/flaky", get(flaky).with_state(flaky_hits.clone()))
        .route("/down", get(down).with_state(down_hits.clone()))
        .route("/missing", get(|| async { StatusCode::NOT_FOUND }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, flaky_hits, down_hits)
}

fn fast_options(max_attempts: u32, breaker: CircuitBreaker) -> ClientOptions {
    ClientOptions {
        api_key: Some("secret".into()),
        connect_timeout: Duration::from_secs(2),
        timeout: Duration::from_secs(5),
        retry: RetryPolicy::new(max_attempts, Duration::from_millis(1), Duration::from_millis(5), true),
        breaker,
    }
}

#[tokio::test]
async fn multipart_upload_reaches_service() {
    let (addr, _, _) = spawn_mock().await;
    let client = UpstreamClient::new("ocr", format!("http://{addr}/"), ClientOptions::default()).unwrap();
    let upload = Upload {
        field: "file".into(),
        filename: "receipt.png".into(),
        content_type: Some("image/png".into()),
        bytes: vec![0u8; 64],
    };
    let v = client.post_multipart("/ocr", &[("lang", "eng")], upload).await.unwrap();
    assert_eq!(v["field"], "file");
    assert_eq!(v["bytes"], 64);
    assert_eq!(v["lang"], "eng");
}

#[tokio::test]
async fn transient_503_is_retried() {
    let (addr, flaky_hits, _) = spawn_mock().await;
    let breaker = CircuitBreaker::new(10, Duration::from_secs(30), 1, true);
    let client = UpstreamClient::new("lookup", format!("http://{addr}"), fast_options(3, breaker)).unwrap();
    let v = client.get_json(&format!("http://{addr}/flaky")).await.unwrap();
    assert_eq!(v["ok"], true);
    assert_eq!(flaky_hits.0.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn not_found_is_reported_without_retry() {
    let (addr, _, _) = spawn_mock().await;
    let client = UpstreamClient::new("lookup", format!("http://{addr}"), fast_options(3, CircuitBreaker::new(1, Duration::from_secs(30), 1, true))).unwrap();
    let err = client.get_json(&format!("http://{addr}/missing")).await.unwrap_err();
    assert!(err.is_not_found());
    // a 404 must not trip the breaker
    assert_eq!(client.breaker().state().await, CircuitState::Closed);
}

#[tokio::test]
async fn breaker_opens_and_fails_fast() {
    let (addr, _, down_hits) = spawn_mock().await;
    let breaker = CircuitBreaker::new(2, Duration::from_secs(60), 1, true);
    let client = UpstreamClient::new("ocr", format!("http://{addr}"), fast_options(1, breaker)).unwrap();
    let url = format!("http://{addr}/down");

    for _ in 0..2 {
        let err = client.get_json(&url).await.unwrap_err();
        assert!(matches!(err, UpstreamError::Status { status: 500, .. }));
    }
    let err = client.get_json(&url).await.unwrap_err();
    assert!(matches!(err, UpstreamError::CircuitOpen("ocr")));
    assert_eq!(down_hits.0.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unreachable_host_is_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = UpstreamClient::new("ocr", format!("http://{addr}"), fast_options(2, CircuitBreaker::new(5, Duration::from_secs(30), 1, true))).unwrap();
    let err = client.get_json(&format!("http://{addr}/ocr")).await.unwrap_err();
    assert!(matches!(err, UpstreamError::Transport(_)));
}
