// src/engine/plan.rs

//! Execution plan: the fully resolved task tree, computed without side
//! effects.

use std::fmt::Write as _;
use std::path::PathBuf;

use crate::config::Workflow;
use crate::engine::context::{Frame, RunContext};

/// One task of the plan, in pre-order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub depth: usize,
    pub name: String,
    pub description: Option<String>,
    pub result: Option<PathBuf>,
    pub command: String,
}

/// Resolve every task exactly as a run would, without creating directories
/// or executing anything.
pub fn build_plan(workflow: &Workflow, ctx: &RunContext) -> Vec<PlanEntry> {
    let mut entries = Vec::with_capacity(workflow.task_count());
    let mut stack: Vec<Frame<'_>> = workflow.tasks.iter().rev().map(Frame::root).collect();

    while let Some(frame) = stack.pop() {
        let resolved = ctx.resolve(frame.task, frame.parent_result.as_deref());
        stack.extend(frame.children_reversed(resolved.result_path.as_ref()));

        entries.push(PlanEntry {
            depth: frame.depth,
            name: frame.task.name.clone(),
            description: frame.task.description.clone(),
            result: resolved.result_path,
            command: resolved.command,
        });
    }

    entries
}

/// Render a plan as indented text.
pub fn render_plan(entries: &[PlanEntry]) -> String {
    let mut out = String::from("Execution plan:\n");
    for entry in entries {
        let indent = "  ".repeat(entry.depth);
        let _ = writeln!(out, "{indent}- {}", entry.name);
        if let Some(ref desc) = entry.description {
            let _ = writeln!(out, "{indent}  desc  : {desc}");
        }
        if let Some(ref result) = entry.result {
            let _ = writeln!(out, "{indent}  result: {}", result.display());
        }
        let _ = writeln!(out, "{indent}  cmd   : {}", entry.command);
    }
    out
}
