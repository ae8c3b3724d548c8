// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{RawWorkflow, Workflow};
use crate::config::validate::validate_with_depth;
use crate::config::MAX_TASK_DEPTH;
use crate::errors::Result;

/// Load a workflow document from a given path and return the raw form.
///
/// `.toml` files are parsed as TOML, anything else as JSON. This only
/// deserializes; use [`load_and_validate`] to get a runnable [`Workflow`].
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawWorkflow> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let raw = if is_toml {
        toml::from_str(&contents)?
    } else {
        serde_json::from_str(&contents)?
    };

    Ok(raw)
}

/// Load a workflow document from path and validate it with the default
/// depth limit.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Workflow> {
    load_and_validate_with_depth(path, MAX_TASK_DEPTH)
}

/// Like [`load_and_validate`], with an explicit nesting limit.
pub fn load_and_validate_with_depth(path: impl AsRef<Path>, max_depth: usize) -> Result<Workflow> {
    let raw = load_from_path(path)?;
    validate_with_depth(raw, max_depth)
}

/// Parse and validate workflow JSON text (the web UI posts the document as a
/// string).
pub fn parse_json_workflow(text: &str, max_depth: usize) -> Result<Workflow> {
    let raw: RawWorkflow = serde_json::from_str(text)?;
    validate_with_depth(raw, max_depth)
}
