// src/errors.rs

//! Crate-wide error types.
//!
//! Configuration problems are fatal before anything runs; task problems are
//! local to one node of the tree and are either absorbed by the
//! continue-on-error policy or surface as [`RunnerError::TaskFailed`].

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("empty target: set it in the workflow or pass --target")]
    EmptyTarget,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("task '{task}' failed: {source}")]
    TaskFailed {
        task: String,
        #[source]
        source: TaskError,
    },

    #[error("run cancelled")]
    Cancelled,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Why a single task did not succeed.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("creating result directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Process(#[from] ProcessError),
}

/// Failure modes of one external command.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("waiting for process: {0}")]
    Wait(#[source] std::io::Error),

    #[error("exit status {code}")]
    Exited { code: i32 },

    #[error("terminated by signal")]
    Signalled,

    #[error("cancelled")]
    Cancelled,
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RunnerError>;
