// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`shell`] resolves which interpreter runs a command string.
//! - [`runner`] provides the [`CommandRunner`] trait the walker talks to and
//!   the production [`ShellRunner`], which spawns the command with
//!   `tokio::process::Command` and streams stdout/stderr to a sink.

pub mod runner;
pub mod shell;

pub use runner::{CommandRunner, RunFuture, ShellRunner};
pub use shell::Shell;
