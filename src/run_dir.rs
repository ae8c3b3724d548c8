// src/run_dir.rs

//! Per-run output directories: `<root>/<sanitized-name>-<YYYYmmdd-HHMMSS>`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::debug;

/// Lowercase, spaces to dashes, and anything outside `[a-z0-9_-]` to `-`.
pub fn sanitize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' | '_' => c,
            _ => '-',
        })
        .collect()
}

/// The directory name a run started now would get (before collision
/// handling).
pub fn run_dir_name(workflow_name: &str) -> String {
    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    let name = sanitize_name(workflow_name);
    if name.is_empty() {
        format!("run-{stamp}")
    } else {
        format!("{name}-{stamp}")
    }
}

/// Create a fresh run directory under `output_root`.
///
/// Two runs started within the same second get distinct directories: the
/// creation itself is the uniqueness check, and a numeric suffix is added on
/// collision.
pub fn create_run_dir(output_root: &Path, workflow_name: &str) -> io::Result<PathBuf> {
    fs::create_dir_all(output_root)?;

    let base = run_dir_name(workflow_name);
    let mut candidate = output_root.join(&base);
    let mut attempt = 1u32;

    loop {
        match fs::create_dir(&candidate) {
            Ok(()) => {
                debug!(dir = %candidate.display(), "created run directory");
                return Ok(candidate);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                attempt += 1;
                candidate = output_root.join(format!("{base}-{attempt}"));
            }
            Err(e) => return Err(e),
        }
    }
}
