#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use asr_runner::config::Workflow;
use asr_runner::engine::{execute_run, RunContext, RunReport, TreeWalker, WalkOptions};
use asr_runner::errors::Result;
use asr_runner::exec::CommandRunner;
use asr_runner::types::{ErrorPolicy, ExecMode};
use asr_runner_test_utils::fake_runner::RecordingSink;
use tokio_util::sync::CancellationToken;

pub use asr_runner_test_utils::{init_tracing, with_timeout};

/// Write a workflow document into `dir` and return its path.
pub fn write_workflow(dir: &Path, file_name: &str, contents: &str) -> PathBuf {
    let path = dir.join(file_name);
    std::fs::write(&path, contents).unwrap();
    path
}

pub fn options(error_policy: ErrorPolicy, mode: ExecMode) -> WalkOptions {
    WalkOptions { error_policy, mode }
}

/// Run `workflow` against `outdir` with a recording sink.
pub async fn run_recorded(
    runner: Arc<dyn CommandRunner>,
    workflow: &Workflow,
    outdir: &Path,
    options: WalkOptions,
) -> (Result<RunReport>, Arc<RecordingSink>) {
    run_recorded_with_cancel(runner, workflow, outdir, options, CancellationToken::new()).await
}

/// Like [`run_recorded`], with a caller-owned cancellation token.
pub async fn run_recorded_with_cancel(
    runner: Arc<dyn CommandRunner>,
    workflow: &Workflow,
    outdir: &Path,
    options: WalkOptions,
    cancel: CancellationToken,
) -> (Result<RunReport>, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::new());
    let walker = TreeWalker::new(runner, options);
    let ctx = RunContext::new(workflow.resolve_target(None).unwrap(), outdir);
    let outcome = execute_run(&walker, workflow, &ctx, sink.clone(), &cancel).await;
    (outcome, sink)
}
