use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use ragate::core::config::Settings;
use ragate::core::errors::ApiError;
use ragate::llm::{ChatMessage, Completer, Embedder, Fetcher};
use ragate::server::router::router;
use ragate::state::AppState;

const TOKEN: &str = "test-admin-token";
const BOUNDARY: &str = "ragate-test-boundary";
const NOTES: &str = "Refunds: 5 days! Shipping is free.";

/// Maps text onto three axes by keyword, so similarity is predictable.
struct KeywordEmbedder;

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
        Ok(texts
            .iter()
            .map(|text| {
                let text = text.to_lowercase();
                if text.contains("refund") {
                    vec![1.0, 0.0, 0.0]
                } else if text.contains("shipping") {
                    vec![0.8, 0.6, 0.0]
                } else {
                    vec![0.0, 0.0, 1.0]
                }
            })
            .collect())
    }
}

#[derive(Default)]
struct RecordingCompleter {
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

#[async_trait]
impl Completer for RecordingCompleter {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, ApiError> {
        self.calls.lock().expect("lock").push(messages);
        Ok("Refunds are processed within 5 days [[1]].".to_string())
    }
}

struct StaticFetcher {
    pages: HashMap<String, String>,
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, ApiError> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ApiError::Upstream(format!("fetch {} failed with HTTP 404", url)))
    }
}

struct Harness {
    app: Router,
    completer: Arc<RecordingCompleter>,
    _dir: tempfile::TempDir,
}

fn harness(pages: &[(&str, &str)]) -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    let settings = Settings {
        data_dir: dir.path().to_path_buf(),
        admin_token: TOKEN.to_string(),
        chunk_size: 20,
        chunk_overlap: 5,
        ..Settings::default()
    };
    let completer = Arc::new(RecordingCompleter::default());
    let fetcher = StaticFetcher {
        pages: pages
            .iter()
            .map(|(url, text)| (url.to_string(), text.to_string()))
            .collect(),
    };
    let state = AppState::with_services(
        settings,
        Arc::new(KeywordEmbedder),
        completer.clone(),
        Arc::new(fetcher),
    )
    .expect("state");

    Harness {
        app: router(state),
        completer,
        _dir: dir,
    }
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, body)
}

fn json_request(method: &str, uri: &str, body: Value, admin: bool) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if admin {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", TOKEN));
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

fn admin_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .body(Body::empty())
        .expect("request")
}

fn upload_request(files: &[(&str, &str)]) -> Request<Body> {
    let mut body = String::new();
    for (name, contents) in files {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: text/plain\r\n\r\n{contents}\r\n"
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method("POST")
        .uri("/api/admin/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
        .body(Body::from(body))
        .expect("request")
}

async fn ask(app: &Router, message: &str) -> (StatusCode, Value) {
    send(
        app,
        json_request("POST", "/api/chat", json!({ "message": message }), false),
    )
    .await
}

#[tokio::test]
async fn uploaded_notes_answer_with_citations() {
    let h = harness(&[]);

    let (status, body) = send(&h.app, upload_request(&[("notes.txt", NOTES)])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["files"][0]["file"], "notes.txt");
    assert_eq!(body["files"][0]["chunks"], 2);

    let (status, body) = ask(&h.app, "How long do refunds take?").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "Refunds are processed within 5 days [[1]].");
    let sources = body["sources"].as_array().expect("sources");
    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0]["id"], 1);
    assert_eq!(sources[0]["source"], "notes.txt");
    assert_eq!(sources[0]["score"], 1.0);
    assert_eq!(sources[1]["score"], 0.8);

    let calls = h.completer.calls.lock().expect("lock");
    assert_eq!(calls.len(), 1);
    let prompt = &calls[0][1].content;
    assert!(prompt.contains("[[1]] (notes.txt)\nRefunds: 5 days! Shi"));
    assert!(prompt.contains("How long do refunds take?"));
}

#[tokio::test]
async fn unrelated_question_is_refused_without_completion() {
    let h = harness(&[]);
    send(&h.app, upload_request(&[("notes.txt", NOTES)])).await;

    let (status, body) = ask(&h.app, "What is the capital of France?").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["sources"].as_array().expect("sources").is_empty());
    assert!(body["answer"].as_str().expect("answer").contains("couldn't find"));
    assert!(h.completer.calls.lock().expect("lock").is_empty());
}

#[tokio::test]
async fn empty_index_refuses() {
    let h = harness(&[]);

    let (status, body) = ask(&h.app, "How long do refunds take?").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["sources"].as_array().expect("sources").is_empty());
}

#[tokio::test]
async fn chat_requires_a_message() {
    let h = harness(&[]);

    let (status, body) = send(&h.app, json_request("POST", "/api/chat", json!({}), false)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = ask(&h.app, "   ").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn admin_routes_reject_missing_or_wrong_token() {
    let h = harness(&[]);

    let missing = Request::builder()
        .uri("/api/admin/sources")
        .body(Body::empty())
        .expect("request");
    let (status, body) = send(&h.app, missing).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Unauthorized");

    let wrong = Request::builder()
        .method("POST")
        .uri("/api/admin/rebuild")
        .header(header::AUTHORIZATION, "Bearer nope")
        .body(Body::empty())
        .expect("request");
    let (status, _) = send(&h.app, wrong).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sources_can_be_listed_and_deleted() {
    let h = harness(&[]);
    send(
        &h.app,
        upload_request(&[("notes.txt", NOTES), ("other.txt", "nothing relevant")]),
    )
    .await;

    let (status, body) = send(&h.app, admin_request("GET", "/api/admin/sources")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_chunks"], 3);
    assert_eq!(body["sources"][0], json!({ "source": "notes.txt", "type": "file", "chunks": 2 }));

    let (status, body) = send(
        &h.app,
        admin_request("DELETE", "/api/admin/sources?source=notes.txt"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], 2);
    assert_eq!(body["untracked"], true);

    let (_, body) = send(&h.app, admin_request("GET", "/api/admin/sources")).await;
    assert_eq!(body["total_chunks"], 1);

    let (status, _) = send(&h.app, admin_request("DELETE", "/api/admin/sources")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reports_item_count_and_thresholds() {
    let h = harness(&[]);
    send(&h.app, upload_request(&[("notes.txt", NOTES)])).await;

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("request");
    let (status, body) = send(&h.app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["items"], 2);
    assert_eq!(body["embedding_dimension"], 3);
    assert_eq!(body["top_k"], 6);
    let min_top_sim = body["thresholds"]["min_top_sim"].as_f64().expect("number");
    assert!((min_top_sim - 0.78).abs() < 1e-6);
}

#[tokio::test]
async fn urls_are_indexed_and_rebuild_reports_failures() {
    let h = harness(&[("https://docs.example.com/refunds", "Refund policy page")]);

    let (status, body) = send(
        &h.app,
        json_request(
            "POST",
            "/api/admin/urls",
            json!({ "url": "https://docs.example.com/refunds" }),
            true,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["url"], "https://docs.example.com/refunds");
    assert_eq!(body["chunks"], 1);

    let (status, _) = send(
        &h.app,
        json_request(
            "POST",
            "/api/admin/urls",
            json!({ "url": "https://missing.example.com/" }),
            true,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, _) = send(
        &h.app,
        json_request("POST", "/api/admin/urls", json!({ "url": "ftp://x" }), true),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    send(&h.app, upload_request(&[("notes.txt", NOTES)])).await;
    let (status, body) = send(&h.app, admin_request("POST", "/api/admin/rebuild")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sources"], 2);
    assert_eq!(body["chunks"], 3);
    assert!(body["failed"].as_array().expect("failed").is_empty());
}

#[tokio::test]
async fn upload_reports_per_file_failures() {
    let h = harness(&[]);

    let (status, body) = send(
        &h.app,
        upload_request(&[("blank.txt", "   "), ("notes.txt", NOTES)]),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["files"][0]["file"], "blank.txt");
    assert!(body["files"][0]["error"].is_string());
    assert_eq!(body["files"][1]["chunks"], 2);
}
