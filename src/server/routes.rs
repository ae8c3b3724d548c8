// src/server/routes.rs

use std::path::PathBuf;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::{parse_json_workflow, Workflow};
use crate::engine::{execute_run, ProgressSink, RunContext, TreeWalker};
use crate::report::{generate_report, ReportError, DEFAULT_MODEL};
use crate::run_dir::create_run_dir;
use crate::server::job::{Job, JobSink};
use crate::server::models::{
    ApiError, HealthResponse, ReportRequest, ReportResponse, RunRequest, RunResponse,
};
use crate::server::state::AppState;
use crate::server::stream::stream_handler;

const INDEX_HTML: &str = include_str!("../../assets/index.html");

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/health", get(health_handler))
        .route("/run", post(run_handler))
        .route("/stream", get(stream_handler))
        .route("/report", post(report_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        active_runs: state.registry.len(),
    })
}

/// Bodies are parsed by hand so that every malformed request is a 400.
fn parse_body<T: serde::de::DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::BadRequest(format!("invalid request body: {e}")))
}

async fn run_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<RunResponse>, ApiError> {
    let req: RunRequest = parse_body(&body)?;

    let workflow = parse_json_workflow(&req.workflow, state.config.max_depth)
        .map_err(|e| ApiError::BadRequest(format!("workflow: {e}")))?;
    let target = workflow
        .resolve_target(req.target.as_deref())
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let outdir = create_run_dir(&state.config.output_root, &workflow.name)
        .map_err(|e| ApiError::Internal(format!("create run directory: {e}")))?;

    let job = state
        .registry
        .register(target.clone(), outdir.clone(), state.config.stream_buffer);
    info!(run_id = %job.id(), outdir = %outdir.display(), "run accepted");

    spawn_run(&state, Arc::clone(&job), workflow);

    Ok(Json(RunResponse {
        run_id: job.id().to_string(),
        outdir: outdir.display().to_string(),
        target,
    }))
}

/// Walk `workflow` in the background, reporting into `job`.
fn spawn_run(state: &AppState, job: Arc<Job>, workflow: Workflow) {
    let walker = TreeWalker::new(Arc::clone(&state.runner), state.config.walk);
    let ctx = RunContext::new(job.target(), job.outdir());
    let sink: Arc<dyn ProgressSink> = Arc::new(JobSink::new(Arc::clone(&job)));
    let cancel = job.cancel_token();

    tokio::spawn(async move {
        match execute_run(&walker, &workflow, &ctx, sink, &cancel).await {
            Ok(report) => info!(
                run_id = %job.id(),
                succeeded = report.succeeded,
                failed = report.failures.len(),
                "web run finished"
            ),
            Err(err) => warn!(run_id = %job.id(), error = %err, "web run ended with error"),
        }
    });
}

async fn report_handler(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<ReportResponse>, ApiError> {
    let req: ReportRequest = parse_body(&body)?;
    let (target, outdir) = report_location(&state, &req)?;
    let model = req
        .model
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_MODEL);

    let report = generate_report(&state.config.report, &target, &outdir, model).await?;

    Ok(Json(ReportResponse {
        ok: true,
        path: report.path.display().to_string(),
        preview: report.preview,
    }))
}

/// A registered run wins; otherwise an explicit outdir and target are needed.
fn report_location(state: &AppState, req: &ReportRequest) -> Result<(String, PathBuf), ApiError> {
    let non_empty = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

    if let Some(job) = non_empty(&req.run_id).and_then(|id| state.registry.lookup(&id)) {
        return Ok((job.target().to_string(), job.outdir().to_path_buf()));
    }

    match (non_empty(&req.outdir), non_empty(&req.target)) {
        (Some(outdir), Some(target)) => Ok((target, PathBuf::from(outdir))),
        _ => Err(ReportError::MissingLocation.into()),
    }
}
