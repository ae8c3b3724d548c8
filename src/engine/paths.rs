// src/engine/paths.rs

//! Lexical path handling for task result paths.

use std::path::{Component, Path, PathBuf};

/// Lexically clean a relative result path.
///
/// Redundant separators and `.` components disappear and `..` folds the
/// previous component. The result must stay relative and must not climb
/// above its starting directory; otherwise an explanation is returned.
pub fn clean_relative(raw: &str) -> Result<PathBuf, String> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();

    for component in Path::new(raw).components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err("path escapes the run directory".to_string());
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err("path must be relative".to_string());
            }
        }
    }

    if parts.is_empty() {
        return Err("path does not name a file".to_string());
    }

    Ok(parts.iter().collect())
}

/// `output_root / clean(result)`.
///
/// Workflows are validated before they run, so an invalid path here falls
/// back to a plain join rather than failing.
pub fn resolve_result_path(output_root: &Path, result: &str) -> PathBuf {
    match clean_relative(result) {
        Ok(clean) => output_root.join(clean),
        Err(_) => output_root.join(result),
    }
}
