// src/engine/context.rs

//! Per-run and per-branch execution state.

use std::path::{Path, PathBuf};

use crate::config::Task;
use crate::engine::interpolate::{interpolate, Vars};
use crate::engine::paths::resolve_result_path;

/// Parameters fixed for the whole run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub target: String,
    pub output_root: PathBuf,
}

/// What a task turns into once its context is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTask {
    pub result_path: Option<PathBuf>,
    pub command: String,
}

impl RunContext {
    pub fn new(target: impl Into<String>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            output_root: output_root.into(),
        }
    }

    /// Resolve a task's result path and interpolate its command.
    ///
    /// `parent_result` is the result path of the nearest ancestor that
    /// declared one, or `None` at the root of a chain.
    pub fn resolve(&self, task: &Task, parent_result: Option<&Path>) -> ResolvedTask {
        let result_path = task
            .result
            .as_deref()
            .map(|rel| resolve_result_path(&self.output_root, rel));

        let vars = Vars {
            target: self.target.clone(),
            result: display_path(result_path.as_deref()),
            parent_result: display_path(parent_result),
            outdir: self.output_root.to_string_lossy().into_owned(),
        };

        ResolvedTask {
            command: interpolate(&task.command, &vars),
            result_path,
        }
    }
}

fn display_path(path: Option<&Path>) -> String {
    path.map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// One pending visit in the walker's explicit stack.
///
/// Siblings never see each other's results: each frame carries only the
/// result inherited down its own chain of ancestors.
#[derive(Debug, Clone)]
pub(crate) struct Frame<'a> {
    pub task: &'a Task,
    pub parent_result: Option<PathBuf>,
    pub depth: usize,
}

impl<'a> Frame<'a> {
    pub fn root(task: &'a Task) -> Self {
        Self {
            task,
            parent_result: None,
            depth: 0,
        }
    }

    /// Frames for this task's children, in reverse so that popping from a
    /// stack yields declaration order.
    ///
    /// Children of a task without a `result` inherit this frame's
    /// `parent_result` unchanged.
    pub fn children_reversed(&self, own_result: Option<&PathBuf>) -> impl Iterator<Item = Frame<'a>> + use<'a> {
        let inherited = own_result.or(self.parent_result.as_ref()).cloned();
        let depth = self.depth + 1;
        self.task.children.iter().rev().map(move |child| Frame {
            task: child,
            parent_result: inherited.clone(),
            depth,
        })
    }
}
