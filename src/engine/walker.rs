// src/engine/walker.rs

//! Depth-first, pre-order traversal of a workflow's task tree.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Workflow;
use crate::engine::context::{Frame, RunContext};
use crate::engine::events::{Completion, ProgressEvent, ProgressSink};
use crate::errors::{Result, RunnerError, TaskError};
use crate::exec::CommandRunner;
use crate::types::{ErrorPolicy, ExecMode};

/// Walker policies, fixed for a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkOptions {
    pub error_policy: ErrorPolicy,
    pub mode: ExecMode,
}

/// A task failure absorbed by [`ErrorPolicy::Continue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub task: String,
    pub error: String,
}

/// Summary of a walk that ran to the end of the tree.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Tasks whose command succeeded (or was skipped in dry-run).
    pub succeeded: usize,
    pub failures: Vec<TaskFailure>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Walks a task tree, executing each node through a [`CommandRunner`] and
/// reporting to a [`ProgressSink`].
///
/// The tree is read-only for the whole walk. An explicit stack replaces
/// recursion so that document depth never translates into call depth.
pub struct TreeWalker {
    runner: Arc<dyn CommandRunner>,
    options: WalkOptions,
}

impl std::fmt::Debug for TreeWalker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeWalker")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl TreeWalker {
    pub fn new(runner: Arc<dyn CommandRunner>, options: WalkOptions) -> Self {
        Self { runner, options }
    }

    pub fn options(&self) -> WalkOptions {
        self.options
    }

    /// Traverse every root task of `workflow` in order.
    ///
    /// - Each task's result directory is created before its command runs.
    /// - A failed task's children are never executed.
    /// - With [`ErrorPolicy::Abort`] the first failure ends the walk and is
    ///   returned as [`RunnerError::TaskFailed`]; with
    ///   [`ErrorPolicy::Continue`] it is recorded in the report and the walk
    ///   resumes at the failed task's next sibling.
    pub async fn walk(
        &self,
        workflow: &Workflow,
        ctx: &RunContext,
        sink: Arc<dyn ProgressSink>,
        cancel: &CancellationToken,
    ) -> Result<RunReport> {
        let started = Instant::now();
        let mut report = RunReport::default();

        let mut stack: Vec<Frame<'_>> = workflow.tasks.iter().rev().map(Frame::root).collect();

        while let Some(frame) = stack.pop() {
            if cancel.is_cancelled() {
                info!(task = %frame.task.name, "run cancelled before task started");
                return Err(RunnerError::Cancelled);
            }

            match self.visit(&frame, ctx, &sink, cancel).await {
                Ok(result_path) => {
                    report.succeeded += 1;
                    stack.extend(frame.children_reversed(result_path.as_ref()));
                }
                Err(err) => {
                    let name = frame.task.name.clone();
                    sink.emit(ProgressEvent::TaskFailed {
                        name: name.clone(),
                        error: err.to_string(),
                    });

                    if cancel.is_cancelled() {
                        return Err(RunnerError::Cancelled);
                    }

                    match self.options.error_policy {
                        ErrorPolicy::Abort => {
                            warn!(task = %name, error = %err, "task failed; aborting run");
                            return Err(RunnerError::TaskFailed {
                                task: name,
                                source: err,
                            });
                        }
                        ErrorPolicy::Continue => {
                            warn!(task = %name, error = %err, "task failed; continuing with next sibling");
                            sink.emit(ProgressEvent::TaskContinued {
                                name: name.clone(),
                                error: err.to_string(),
                            });
                            report.failures.push(TaskFailure {
                                task: name,
                                error: err.to_string(),
                            });
                        }
                    }
                }
            }
        }

        report.elapsed = started.elapsed();
        Ok(report)
    }

    /// Execute one task. Returns its result path on success.
    async fn visit(
        &self,
        frame: &Frame<'_>,
        ctx: &RunContext,
        sink: &Arc<dyn ProgressSink>,
        cancel: &CancellationToken,
    ) -> std::result::Result<Option<PathBuf>, TaskError> {
        let task = frame.task;
        let resolved = ctx.resolve(task, frame.parent_result.as_deref());

        if let Some(ref path) = resolved.result_path {
            ensure_parent_dir(path).await?;
        }

        sink.emit(ProgressEvent::TaskStarted {
            name: task.name.clone(),
            description: task.description.clone(),
            result: resolved.result_path.clone(),
            command: resolved.command.clone(),
            depth: frame.depth,
        });

        let started = Instant::now();
        let simulated = self.options.mode.is_dry_run();

        if simulated {
            debug!(task = %task.name, command = %resolved.command, "dry run; not executing");
        } else {
            info!(task = %task.name, depth = frame.depth, command = %resolved.command, "running task");
            self.runner
                .run(resolved.command, Arc::clone(sink), cancel.clone())
                .await?;
        }

        sink.emit(ProgressEvent::TaskSucceeded {
            name: task.name.clone(),
            elapsed: started.elapsed(),
            simulated,
        });

        Ok(resolved.result_path)
    }
}

async fn ensure_parent_dir(path: &Path) -> std::result::Result<(), TaskError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| TaskError::CreateDir {
                path: parent.to_path_buf(),
                source,
            }),
        _ => Ok(()),
    }
}

/// Run a whole workflow against a sink: header event, walk, terminal event.
///
/// The sink's [`ProgressSink::complete`] is called whether the walk succeeded
/// or not.
pub async fn execute_run(
    walker: &TreeWalker,
    workflow: &Workflow,
    ctx: &RunContext,
    sink: Arc<dyn ProgressSink>,
    cancel: &CancellationToken,
) -> Result<RunReport> {
    sink.emit(ProgressEvent::RunStarted {
        workflow: workflow.name.clone(),
        target: ctx.target.clone(),
        outdir: ctx.output_root.clone(),
        mode: walker.options().mode,
    });

    let started = Instant::now();
    let outcome = walker.walk(workflow, ctx, Arc::clone(&sink), cancel).await;

    let completion = match &outcome {
        Ok(report) => Completion {
            success: true,
            elapsed: started.elapsed(),
            absorbed_failures: report.failures.len(),
            error: None,
        },
        Err(err) => Completion {
            success: false,
            elapsed: started.elapsed(),
            absorbed_failures: 0,
            error: Some(err.to_string()),
        },
    };
    sink.complete(&completion);

    info!(
        workflow = %workflow.name,
        success = completion.success,
        elapsed_ms = completion.elapsed.as_millis() as u64,
        "run finished"
    );

    outcome
}
