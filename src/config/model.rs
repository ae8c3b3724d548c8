// src/config/model.rs

use serde::Deserialize;

/// Workflow document as read from disk or an HTTP request body.
///
/// ```json
/// {
///   "name": "attack-surface-recon",
///   "target": "example.com",
///   "tasks": [
///     { "name": "Subdomain Finder", "result": "subdomains.txt",
///       "command": "subfinder -d {target} -silent -o {result}",
///       "tasks": [
///         { "name": "Probe HTTP(S)", "result": "http_result.txt",
///           "command": "httpx -l {parent_result} -silent -o {result}" }
///       ] }
///   ]
/// }
/// ```
///
/// This is the unchecked form; convert it with `Workflow::try_from` (see
/// `validate.rs`) before running anything.
#[derive(Debug, Clone, Deserialize)]
pub struct RawWorkflow {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub target: String,

    #[serde(default)]
    pub tasks: Vec<RawTask>,
}

/// One node of the unchecked task tree.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTask {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Path relative to the run directory that the command is expected to
    /// write. Exposed to the command as `{result}` and to children as
    /// `{parent_result}`.
    #[serde(default)]
    pub result: Option<String>,

    #[serde(default)]
    pub command: String,

    /// Child tasks, run in order after this one succeeds.
    #[serde(default, alias = "children")]
    pub tasks: Vec<RawTask>,
}

/// A validated workflow. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Workflow {
    pub name: String,
    pub target: String,
    pub tasks: Vec<Task>,
}

/// A validated task node.
///
/// Empty `description`/`result` strings from the document are normalised to
/// `None`, and `result` is known to stay inside the run directory.
#[derive(Debug, Clone)]
pub struct Task {
    pub name: String,
    pub description: Option<String>,
    pub result: Option<String>,
    pub command: String,
    pub children: Vec<Task>,
}

impl Workflow {
    pub(crate) fn new_unchecked(name: String, target: String, tasks: Vec<Task>) -> Self {
        Self {
            name,
            target,
            tasks,
        }
    }

    /// Total number of tasks in the tree.
    pub fn task_count(&self) -> usize {
        self.tasks.iter().map(Task::subtree_size).sum()
    }
}

impl Task {
    /// Number of tasks in this subtree, including `self`.
    pub fn subtree_size(&self) -> usize {
        1 + self.children.iter().map(Task::subtree_size).sum::<usize>()
    }
}
