// src/engine/events.rs

//! Progress events and the sink they are written to.
//!
//! The walker has a single implementation regardless of mode; what differs
//! is the [`ProgressSink`] it is handed: the console in CLI mode, a run's
//! job channel in web mode, or a recorder in tests.

use std::path::PathBuf;
use std::time::Duration;

use crate::types::{ExecMode, OutputStream};

/// One observable step of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    RunStarted {
        workflow: String,
        target: String,
        outdir: PathBuf,
        mode: ExecMode,
    },
    /// Emitted before the task's command is executed (or skipped in dry-run).
    TaskStarted {
        name: String,
        description: Option<String>,
        result: Option<PathBuf>,
        command: String,
        depth: usize,
    },
    /// A line written by the running command.
    Output { stream: OutputStream, line: String },
    TaskSucceeded {
        name: String,
        elapsed: Duration,
        simulated: bool,
    },
    TaskFailed { name: String, error: String },
    /// The continue-on-error policy absorbed this task's failure; its
    /// children are skipped and traversal moves on to the next sibling.
    TaskContinued { name: String, error: String },
}

/// Terminal notification for a run. Emitted whether the run succeeded or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub success: bool,
    pub elapsed: Duration,
    /// Number of task failures absorbed by the continue policy.
    pub absorbed_failures: usize,
    /// The error that stopped the run, if any.
    pub error: Option<String>,
}

/// Destination for progress events.
///
/// Implementations must tolerate concurrent calls: output lines arrive from
/// the process runner's reader tasks.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);

    /// The run is over. Called exactly once, after the last event.
    fn complete(&self, completion: &Completion);
}

impl ProgressEvent {
    /// Plain-text rendering, one entry per line, without colour.
    pub fn render_lines(&self) -> Vec<String> {
        match self {
            ProgressEvent::RunStarted {
                workflow,
                target,
                outdir,
                mode,
            } => {
                let mut lines = vec![
                    format!("▶ {workflow}"),
                    format!("  target : {target}"),
                    format!("  output : {}", outdir.display()),
                ];
                if mode.is_dry_run() {
                    lines.push("  mode   : DRY RUN".to_string());
                }
                lines
            }
            ProgressEvent::TaskStarted {
                name,
                description,
                result,
                command,
                depth,
            } => {
                let indent = "  ".repeat(*depth);
                let mut lines = vec![format!("{indent}• {name}")];
                if let Some(desc) = description {
                    lines.push(format!("{indent}  - {desc}"));
                }
                if let Some(result) = result {
                    lines.push(format!("{indent}  - result: {}", result.display()));
                }
                lines.push(format!("{indent}  - cmd   : {command}"));
                lines
            }
            ProgressEvent::Output { line, .. } => vec![line.clone()],
            ProgressEvent::TaskSucceeded {
                elapsed, simulated, ..
            } => {
                if *simulated {
                    vec!["  ✓ skipped (dry run)".to_string()]
                } else {
                    vec![format!("  ✓ done : {}", format_elapsed(*elapsed))]
                }
            }
            ProgressEvent::TaskFailed { name, error } => {
                vec![format!("  ✗ error in {name:?}: {error}")]
            }
            ProgressEvent::TaskContinued { name, error } => {
                vec![format!("    ↪ continue after error in {name:?}: {error}")]
            }
        }
    }
}

impl Completion {
    pub fn render_line(&self) -> String {
        match (&self.error, self.absorbed_failures) {
            (Some(err), _) => format!("✗ stopped on error: {err}"),
            (None, 0) => format!("✅ done in {}", format_elapsed(self.elapsed)),
            (None, n) => format!(
                "✅ done in {} ({n} task(s) failed, continued)",
                format_elapsed(self.elapsed)
            ),
        }
    }
}

/// Millisecond-truncated duration, e.g. `1.204s` or `35ms`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let truncated = Duration::from_millis(elapsed.as_millis() as u64);
    format!("{truncated:?}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_started_renders_optional_fields_only_when_present() {
        let ev = ProgressEvent::TaskStarted {
            name: "A".into(),
            description: None,
            result: Some(PathBuf::from("out/a.txt")),
            command: "echo hi".into(),
            depth: 1,
        };
        assert_eq!(
            ev.render_lines(),
            vec!["  • A", "    - result: out/a.txt", "    - cmd   : echo hi"]
        );
    }

    #[test]
    fn completion_line_distinguishes_failure() {
        let ok = Completion {
            success: true,
            elapsed: Duration::from_millis(1500),
            absorbed_failures: 0,
            error: None,
        };
        assert!(ok.render_line().starts_with("✅ done in 1.5s"));

        let failed = Completion {
            success: false,
            error: Some("task 'A' failed: exit status 1".into()),
            ..ok
        };
        assert!(failed.render_line().contains("stopped on error"));
    }

    #[test]
    fn elapsed_is_truncated_to_milliseconds() {
        assert_eq!(format_elapsed(Duration::from_micros(35_900)), "35ms");
    }
}
