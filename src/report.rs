// src/report.rs

//! Report generation: shells out to an external script that reads a run's
//! artifacts and writes a markdown draft next to them.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::{info, warn};

/// File the script is expected to write inside the run directory.
pub const REPORT_ARTIFACT: &str = "ai_draft.md";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
pub const PREVIEW_CHARS: usize = 4000;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("need run_id or (outdir + target)")]
    MissingLocation,

    #[error("outdir not found: {0}")]
    OutdirNotFound(PathBuf),

    #[error("outdir error: {0}")]
    Outdir(#[source] std::io::Error),

    #[error("failed to launch report script `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("report script timed out after {0:?}")]
    Timeout(Duration),

    #[error("report script error: {status}\n{output}")]
    ScriptFailed { status: String, output: String },

    #[error("ai_draft.md not found: {0}")]
    ArtifactMissing(#[source] std::io::Error),
}

impl ReportError {
    /// Whether the caller supplied something unusable, as opposed to the
    /// script failing.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ReportError::MissingLocation | ReportError::OutdirNotFound(_)
        )
    }
}

/// How to invoke the report script.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub python_bin: String,
    pub script: PathBuf,
    pub timeout: Duration,
    pub preview_chars: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            python_bin: "python3".to_string(),
            script: PathBuf::from("./make_ai_report.py"),
            timeout: DEFAULT_TIMEOUT,
            preview_chars: PREVIEW_CHARS,
        }
    }
}

impl ReportConfig {
    /// Defaults overridden by `PYTHON_BIN` and `REPORT_SCRIPT` (or the older
    /// `AI_SCRIPT`).
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(bin) = non_empty_env("PYTHON_BIN") {
            cfg.python_bin = bin;
        }
        if let Some(script) = non_empty_env("REPORT_SCRIPT").or_else(|| non_empty_env("AI_SCRIPT")) {
            cfg.script = PathBuf::from(script);
        }
        cfg
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// A generated report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub path: PathBuf,
    pub preview: String,
}

/// Run the report script for `target` over the artifacts in `outdir`.
///
/// The script gets `-t <target> -i <outdir> --model <model>`. It is killed if
/// it outlives `config.timeout`. Its artifact is read back verbatim and
/// truncated to `config.preview_chars` characters for the preview.
pub async fn generate_report(
    config: &ReportConfig,
    target: &str,
    outdir: &Path,
    model: &str,
) -> Result<Report, ReportError> {
    match tokio::fs::metadata(outdir).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ReportError::OutdirNotFound(outdir.to_path_buf()));
        }
        Err(e) => return Err(ReportError::Outdir(e)),
    }

    info!(subject = %target, outdir = %outdir.display(), model, "generating report");

    let mut cmd = Command::new(&config.python_bin);
    cmd.arg(&config.script)
        .arg("-t")
        .arg(target)
        .arg("-i")
        .arg(outdir)
        .arg("--model")
        .arg(model)
        .stdin(Stdio::null())
        .kill_on_drop(true);

    // Dropping the `output()` future on timeout kills the child.
    let output = match tokio::time::timeout(config.timeout, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(source)) => {
            return Err(ReportError::Launch {
                program: config.python_bin.clone(),
                source,
            });
        }
        Err(_) => {
            warn!(timeout = ?config.timeout, "report script timed out");
            return Err(ReportError::Timeout(config.timeout));
        }
    };

    if !output.status.success() {
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        return Err(ReportError::ScriptFailed {
            status: output.status.to_string(),
            output: combined,
        });
    }

    let path = outdir.join(REPORT_ARTIFACT);
    let contents = tokio::fs::read_to_string(&path)
        .await
        .map_err(ReportError::ArtifactMissing)?;

    Ok(Report {
        preview: first_n_chars(&contents, config.preview_chars).to_string(),
        path,
    })
}

/// The first `n` characters of `s`, never splitting a character.
pub fn first_n_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
