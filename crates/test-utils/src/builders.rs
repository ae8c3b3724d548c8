#![allow(dead_code)]

use asr_runner::config::{RawTask, RawWorkflow, Workflow};

/// Builder for `Workflow` to simplify test setup.
pub struct WorkflowBuilder {
    workflow: RawWorkflow,
}

impl WorkflowBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            workflow: RawWorkflow {
                name: name.to_string(),
                target: "example.com".to_string(),
                tasks: vec![],
            },
        }
    }

    pub fn target(mut self, target: &str) -> Self {
        self.workflow.target = target.to_string();
        self
    }

    pub fn with_task(mut self, task: RawTask) -> Self {
        self.workflow.tasks.push(task);
        self
    }

    /// The unchecked document, for tests that exercise validation.
    pub fn build_raw(self) -> RawWorkflow {
        self.workflow
    }

    pub fn build(self) -> Workflow {
        Workflow::try_from(self.workflow).expect("Failed to build valid workflow from builder")
    }
}

/// Builder for `RawTask`.
pub struct TaskBuilder {
    task: RawTask,
}

impl TaskBuilder {
    pub fn new(name: &str, command: &str) -> Self {
        Self {
            task: RawTask {
                name: name.to_string(),
                description: None,
                result: None,
                command: command.to_string(),
                tasks: vec![],
            },
        }
    }

    pub fn description(mut self, text: &str) -> Self {
        self.task.description = Some(text.to_string());
        self
    }

    pub fn result(mut self, path: &str) -> Self {
        self.task.result = Some(path.to_string());
        self
    }

    pub fn child(mut self, child: RawTask) -> Self {
        self.task.tasks.push(child);
        self
    }

    pub fn build(self) -> RawTask {
        self.task
    }
}
