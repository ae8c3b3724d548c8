// src/config/validate.rs

use crate::config::MAX_TASK_DEPTH;
use crate::config::model::{RawTask, RawWorkflow, Task, Workflow};
use crate::engine::paths::clean_relative;
use crate::errors::{Result, RunnerError};

impl TryFrom<RawWorkflow> for Workflow {
    type Error = RunnerError;

    fn try_from(raw: RawWorkflow) -> std::result::Result<Self, Self::Error> {
        validate_with_depth(raw, MAX_TASK_DEPTH)
    }
}

/// Validate a raw workflow and convert it into its checked form.
///
/// The target is *not* checked here: it may still be supplied by an override
/// at execution time (see [`Workflow::resolve_target`]).
pub fn validate_with_depth(raw: RawWorkflow, max_depth: usize) -> Result<Workflow> {
    ensure_has_tasks(&raw)?;

    let mut tasks = Vec::with_capacity(raw.tasks.len());
    for task in raw.tasks {
        tasks.push(convert_task(task, 1, max_depth)?);
    }

    Ok(Workflow::new_unchecked(raw.name, raw.target, tasks))
}

fn ensure_has_tasks(raw: &RawWorkflow) -> Result<()> {
    if raw.tasks.is_empty() {
        return Err(RunnerError::Config(
            "workflow must contain at least one task".to_string(),
        ));
    }
    Ok(())
}

// Recursion here is bounded by `max_depth`; serde_json's own recursion limit
// already caps how deep a parsed document can be.
fn convert_task(raw: RawTask, depth: usize, max_depth: usize) -> Result<Task> {
    if depth > max_depth {
        return Err(RunnerError::Config(format!(
            "task '{}' is nested {} levels deep (limit {})",
            raw.name, depth, max_depth
        )));
    }

    if raw.name.trim().is_empty() {
        return Err(RunnerError::Config(format!(
            "task at depth {depth} has an empty name"
        )));
    }

    let result = non_empty(raw.result);
    if let Some(ref rel) = result {
        if let Err(reason) = clean_relative(rel) {
            return Err(RunnerError::Config(format!(
                "task '{}' has an invalid result path '{}': {}",
                raw.name, rel, reason
            )));
        }
    }

    let mut children = Vec::with_capacity(raw.tasks.len());
    for child in raw.tasks {
        children.push(convert_task(child, depth + 1, max_depth)?);
    }

    Ok(Task {
        name: raw.name,
        description: non_empty(raw.description),
        result,
        command: raw.command,
        children,
    })
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl Workflow {
    /// The target this run executes against.
    ///
    /// A non-blank override wins over the document's own target; a blank
    /// result is a configuration error.
    pub fn resolve_target(&self, override_target: Option<&str>) -> Result<String> {
        let target = match override_target.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => self.target.trim(),
        };
        if target.is_empty() {
            return Err(RunnerError::EmptyTarget);
        }
        Ok(target.to_string())
    }
}
