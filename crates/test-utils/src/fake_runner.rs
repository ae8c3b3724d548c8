use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use asr_runner::engine::{Completion, ProgressEvent, ProgressSink};
use asr_runner::errors::ProcessError;
use asr_runner::exec::{CommandRunner, RunFuture};
use asr_runner::types::OutputStream;
use tokio_util::sync::CancellationToken;

/// A fake runner that:
/// - records every command it is asked to run, in order
/// - echoes the command back as one stdout line
/// - fails (exit code 1) for commands registered with `fail_on`
/// - cancels the run's token after commands registered with `cancel_after`
/// - never spawns a process.
#[derive(Default)]
pub struct FakeRunner {
    executed: Arc<Mutex<Vec<String>>>,
    failing: Mutex<HashSet<String>>,
    cancelling: Mutex<HashSet<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `command` (after interpolation) exit non-zero.
    pub fn fail_on(self, command: &str) -> Self {
        self.failing.lock().unwrap().insert(command.to_string());
        self
    }

    /// Cancel the run's token once `command` has run (it still succeeds),
    /// as if Ctrl-C arrived between two tasks.
    pub fn cancel_after(self, command: &str) -> Self {
        self.cancelling.lock().unwrap().insert(command.to_string());
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap().clone()
    }
}

impl CommandRunner for FakeRunner {
    fn run(
        &self,
        command: String,
        sink: Arc<dyn ProgressSink>,
        cancel: CancellationToken,
    ) -> RunFuture<'_> {
        Box::pin(async move {
            if cancel.is_cancelled() {
                return Err(ProcessError::Cancelled);
            }

            self.executed.lock().unwrap().push(command.clone());
            sink.emit(ProgressEvent::Output {
                stream: OutputStream::Stdout,
                line: command.clone(),
            });

            if self.cancelling.lock().unwrap().contains(&command) {
                cancel.cancel();
            }

            if self.failing.lock().unwrap().contains(&command) {
                Err(ProcessError::Exited { code: 1 })
            } else {
                Ok(())
            }
        })
    }
}

/// A sink that keeps everything it is given.
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
    completion: Mutex<Option<Completion>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn completion(&self) -> Option<Completion> {
        self.completion.lock().unwrap().clone()
    }

    /// Names from `TaskStarted` events, in emission order.
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::TaskStarted { name, .. } => Some(name),
                _ => None,
            })
            .collect()
    }

    /// Lines from `Output` events, in emission order.
    pub fn output_lines(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ProgressEvent::Output { line, .. } => Some(line),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn complete(&self, completion: &Completion) {
        let mut slot = self.completion.lock().unwrap();
        assert!(slot.is_none(), "complete() called more than once");
        *slot = Some(completion.clone());
    }
}
