// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::MAX_TASK_DEPTH;
use crate::server::DEFAULT_STREAM_BUFFER;

/// Command-line arguments for `asr-runner`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "asr-runner",
    version,
    about = "Run a tree of shell tasks against a target, threading each task's output into its children.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the workflow document (JSON, or TOML for `.toml` files).
    #[arg(long, value_name = "PATH")]
    pub workflow: Option<PathBuf>,

    /// Override the workflow's target.
    #[arg(long, value_name = "TARGET")]
    pub target: Option<String>,

    /// Root directory under which each run gets its own output directory.
    #[arg(long, value_name = "DIR", default_value = "out")]
    pub outdir: PathBuf,

    /// Print and resolve commands, create result directories, execute nothing.
    #[arg(long)]
    pub dry_run: bool,

    /// Keep going with the next sibling when a task fails.
    #[arg(long)]
    pub continue_on_error: bool,

    /// Shell used to run commands, invoked as `<shell> -c <command>`.
    ///
    /// Default: `sh -c` on Unix, `cmd /C` on Windows.
    #[arg(long, value_name = "SHELL")]
    pub shell: Option<String>,

    /// Start the local web UI instead of running a workflow.
    #[arg(long)]
    pub serve: bool,

    /// Print the resolved execution plan and exit.
    #[arg(long)]
    pub plan: bool,

    /// HTTP listen address (for --serve).
    #[arg(long, value_name = "HOST:PORT", default_value = "127.0.0.1:8080")]
    pub addr: String,

    /// Capacity of each web run's log buffer; lines beyond it are dropped.
    #[arg(long, value_name = "LINES", default_value_t = DEFAULT_STREAM_BUFFER)]
    pub stream_buffer: usize,

    /// Deepest task nesting accepted in a workflow document.
    #[arg(long, value_name = "N", default_value_t = MAX_TASK_DEPTH)]
    pub max_depth: usize,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASR_RUNNER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_surface() {
        let args = CliArgs::try_parse_from(["asr-runner", "--workflow", "wf.json"]).unwrap();
        assert_eq!(args.outdir, PathBuf::from("out"));
        assert_eq!(args.addr, "127.0.0.1:8080");
        assert!(!args.dry_run && !args.continue_on_error && !args.plan && !args.serve);
        assert_eq!(args.max_depth, MAX_TASK_DEPTH);
    }

    #[test]
    fn all_flags_parse() {
        let args = CliArgs::try_parse_from([
            "asr-runner",
            "--workflow",
            "wf.json",
            "--target",
            "example.com",
            "--outdir",
            "/tmp/o",
            "--dry-run",
            "--continue-on-error",
            "--shell",
            "bash",
            "--plan",
        ])
        .unwrap();
        assert_eq!(args.target.as_deref(), Some("example.com"));
        assert_eq!(args.shell.as_deref(), Some("bash"));
        assert!(args.dry_run && args.continue_on_error && args.plan);
    }
}
