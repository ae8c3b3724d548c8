// tests/server_http.rs

mod common;

use std::path::Path;
use std::sync::Arc;

use asr_runner::engine::WalkOptions;
use asr_runner::exec::Shell;
use asr_runner::report::ReportConfig;
use asr_runner::server::models::RunResponse;
use asr_runner::server::{create_router, AppState, ServerConfig, DEFAULT_STREAM_BUFFER};
use asr_runner_test_utils::fake_runner::FakeRunner;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use futures::StreamExt;
use tower::ServiceExt;

use common::with_timeout;

fn test_state(output_root: &Path, runner: Arc<FakeRunner>) -> AppState {
    let config = ServerConfig {
        addr: "127.0.0.1:0".to_string(),
        output_root: output_root.to_path_buf(),
        shell: Shell::default(),
        walk: WalkOptions::default(),
        stream_buffer: DEFAULT_STREAM_BUFFER,
        max_depth: 64,
        report: ReportConfig::default(),
    };
    AppState::new(config, runner)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, String) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8_lossy(&body).into_owned())
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

const WORKFLOW: &str = r#"{"name": "web", "target": "example.com",
    "tasks": [{"name": "A", "result": "a.txt", "command": "scan {target}",
        "tasks": [{"name": "B", "command": "probe {parent_result}"}]}]}"#;

#[tokio::test]
async fn run_then_stream_delivers_log_and_terminal_marker() {
    let tmp = tempfile::tempdir().unwrap();
    let runner = Arc::new(FakeRunner::new());
    let state = test_state(tmp.path(), runner.clone());
    let registry = Arc::clone(&state.registry);
    let app = create_router(state);

    let (status, body) = send(&app, post_json("/run", serde_json::json!({ "workflow": WORKFLOW }))).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let run: RunResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(run.target, "example.com");
    assert!(Path::new(&run.outdir).is_dir());

    let (status, body) = with_timeout(send(&app, get(&format!("/stream?id={}", run.run_id)))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("data: scan example.com"), "{body}");
    assert!(body.contains("• A"));
    assert!(body.contains("✅ done in"));
    assert!(body.trim_end().ends_with("data: [run complete]"), "{body}");

    assert!(registry.lookup(&run.run_id).is_none());
    assert_eq!(runner.executed().len(), 2);

    // Once observed to completion the id is gone.
    let (status, _) = send(&app, get(&format!("/stream?id={}", run.run_id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn target_in_request_overrides_document() {
    let tmp = tempfile::tempdir().unwrap();
    let runner = Arc::new(FakeRunner::new());
    let app = create_router(test_state(tmp.path(), runner.clone()));

    let (status, body) = send(
        &app,
        post_json("/run", serde_json::json!({ "target": "other.example", "workflow_json_text": WORKFLOW })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let run: RunResponse = serde_json::from_str(&body).unwrap();
    assert_eq!(run.target, "other.example");

    let (_, body) = with_timeout(send(&app, get(&format!("/stream?id={}", run.run_id)))).await;
    assert!(body.contains("data: scan other.example"), "{body}");
}

#[tokio::test]
async fn bad_run_requests_are_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let app = create_router(test_state(tmp.path(), Arc::new(FakeRunner::new())));

    let no_target = r#"{"tasks": [{"name": "A", "command": "true"}]}"#;
    let cases = [
        serde_json::json!({ "workflow": no_target }),
        serde_json::json!({ "workflow": "{ not json" }),
        serde_json::json!({ "workflow": r#"{"target": "t", "tasks": []}"# }),
        serde_json::json!({ "target": "t" }),
    ];
    for case in cases {
        let (status, body) = send(&app, post_json("/run", case.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{case} -> {body}");
        assert!(body.contains(r#""ok":false"#));
    }

    let raw = Request::builder()
        .method("POST")
        .uri("/run")
        .body(Body::from("definitely not json"))
        .unwrap();
    let (status, _) = send(&app, raw).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nothing was created for rejected requests.
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn unknown_run_id_is_not_found() {
    let tmp = tempfile::tempdir().unwrap();
    let app = create_router(test_state(tmp.path(), Arc::new(FakeRunner::new())));

    let (status, body) = send(&app, get("/stream?id=12345")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("not_found"));
}

#[tokio::test]
async fn second_concurrent_observer_is_refused() {
    let tmp = tempfile::tempdir().unwrap();
    let state = test_state(tmp.path(), Arc::new(FakeRunner::new()));
    let job = state
        .registry
        .register("t".into(), tmp.path().to_path_buf(), 8);
    let app = create_router(state);

    let held = job.try_attach().unwrap();
    let (status, _) = send(&app, get(&format!("/stream?id={}", job.id()))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    drop(held);
}

#[tokio::test]
async fn observer_disconnect_leaves_the_run_attachable() {
    let tmp = tempfile::tempdir().unwrap();
    let state = test_state(tmp.path(), Arc::new(FakeRunner::new()));
    let registry = Arc::clone(&state.registry);
    let job = registry.register("t".into(), tmp.path().to_path_buf(), 8);
    let app = create_router(state);
    let uri = format!("/stream?id={}", job.id());

    job.push_line("hello".into());
    let res = app.clone().oneshot(get(&uri)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let mut frames = res.into_body().into_data_stream();
    let first = with_timeout(frames.next()).await.unwrap().unwrap();
    assert!(String::from_utf8_lossy(&first).contains("data: hello"));

    // Client goes away mid-run.
    drop(frames);

    assert!(registry.lookup(job.id()).is_some());
    assert!(!job.cancel_token().is_cancelled());
    assert!(!job.is_done());

    job.push_line("after".into());
    job.mark_done();

    let (status, body) = with_timeout(send(&app, get(&uri))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("data: after"), "{body}");
    assert!(!body.contains("hello"));
    assert!(body.trim_end().ends_with("data: [run complete]"));
    assert!(registry.lookup(job.id()).is_none());
}

#[tokio::test]
async fn overflowing_run_reports_dropped_lines() {
    let tmp = tempfile::tempdir().unwrap();
    let state = test_state(tmp.path(), Arc::new(FakeRunner::new()));
    let job = state
        .registry
        .register("t".into(), tmp.path().to_path_buf(), 2);
    let app = create_router(state);

    job.push_line("first\rline".into());
    job.push_line("second".into());
    job.push_line("third".into());
    job.mark_done();

    let (status, body) = with_timeout(send(&app, get(&format!("/stream?id={}", job.id())))).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("data: firstline"));
    assert!(body.contains("data: second"));
    assert!(!body.contains("third"));
    assert!(body.contains("event: warning"));
    assert!(body.contains("1 log line(s) dropped"));
    assert!(body.trim_end().ends_with("data: [run complete]"));
}

#[tokio::test]
async fn health_and_index() {
    let tmp = tempfile::tempdir().unwrap();
    let app = create_router(test_state(tmp.path(), Arc::new(FakeRunner::new())));

    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains(r#""status":"ok""#));

    let (status, body) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("EventSource"));
}

#[tokio::test]
async fn report_requires_a_location() {
    let tmp = tempfile::tempdir().unwrap();
    let app = create_router(test_state(tmp.path(), Arc::new(FakeRunner::new())));

    let (status, _) = send(&app, post_json("/report", serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let missing = tmp.path().join("gone");
    let (status, body) = send(
        &app,
        post_json(
            "/report",
            serde_json::json!({ "outdir": missing.display().to_string(), "target": "t" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("outdir not found"));
}
