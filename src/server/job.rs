// src/server/job.rs

//! In-memory handle to a web-triggered run and its live log stream.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch, Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::engine::{Completion, ProgressEvent, ProgressSink};

pub type RunId = String;

/// A registered run.
///
/// The walker for this run is the only producer of log lines. Lines go into a
/// bounded channel; when it is full (typically because nobody is observing)
/// the newest line is dropped and counted, so the run itself never stalls.
#[derive(Debug)]
pub struct Job {
    id: RunId,
    target: String,
    outdir: PathBuf,
    lines_tx: mpsc::Sender<String>,
    lines_rx: Arc<Mutex<mpsc::Receiver<String>>>,
    done: watch::Sender<bool>,
    dropped: AtomicU64,
    cancel: CancellationToken,
}

impl Job {
    pub(crate) fn new(id: RunId, target: String, outdir: PathBuf, capacity: usize) -> Self {
        let (lines_tx, lines_rx) = mpsc::channel(capacity.max(1));
        let (done, _) = watch::channel(false);
        Self {
            id,
            target,
            outdir,
            lines_tx,
            lines_rx: Arc::new(Mutex::new(lines_rx)),
            done,
            dropped: AtomicU64::new(0),
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn outdir(&self) -> &Path {
        &self.outdir
    }

    /// Token the run's walker observes; cancelled on server shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Enqueue a line without waiting. Returns `false` if it was dropped.
    pub fn push_line(&self, line: String) -> bool {
        match self.lines_tx.try_send(line) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped == 1 {
                    warn!(run_id = %self.id, "log buffer full; dropping new lines until an observer drains it");
                }
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    pub fn dropped_lines(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Fire the one-shot completion signal.
    pub fn mark_done(&self) {
        self.done.send_replace(true);
    }

    pub fn is_done(&self) -> bool {
        *self.done.borrow()
    }

    pub fn done_signal(&self) -> watch::Receiver<bool> {
        self.done.subscribe()
    }

    /// Claim the log stream for draining. Only one observer may drain a job
    /// at a time; `None` means another observer holds it.
    pub fn try_attach(&self) -> Option<OwnedMutexGuard<mpsc::Receiver<String>>> {
        Arc::clone(&self.lines_rx).try_lock_owned().ok()
    }
}

/// Progress sink that writes a run's events into its job channel.
#[derive(Debug, Clone)]
pub struct JobSink {
    job: Arc<Job>,
}

impl JobSink {
    pub fn new(job: Arc<Job>) -> Self {
        Self { job }
    }
}

impl ProgressSink for JobSink {
    fn emit(&self, event: ProgressEvent) {
        for line in event.render_lines() {
            self.job.push_line(line);
        }
    }

    fn complete(&self, completion: &Completion) {
        self.job.push_line(completion.render_line());
        self.job.mark_done();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overflow_drops_newest_and_counts() {
        let job = Job::new("1".into(), "t".into(), PathBuf::from("out"), 2);
        assert!(job.push_line("a".into()));
        assert!(job.push_line("b".into()));
        assert!(!job.push_line("c".into()));
        assert!(!job.push_line("d".into()));
        assert_eq!(job.dropped_lines(), 2);

        let mut rx = job.try_attach().expect("first observer attaches");
        assert_eq!(rx.try_recv().unwrap(), "a");
        assert_eq!(rx.try_recv().unwrap(), "b");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn only_one_observer_drains_at_a_time() {
        let job = Job::new("1".into(), "t".into(), PathBuf::from("out"), 4);
        let first = job.try_attach();
        assert!(first.is_some());
        assert!(job.try_attach().is_none());
        drop(first);
        assert!(job.try_attach().is_some());
    }

    #[test]
    fn completion_signal_is_visible_to_late_subscribers() {
        let job = Job::new("1".into(), "t".into(), PathBuf::from("out"), 4);
        assert!(!job.is_done());
        job.mark_done();
        assert!(job.is_done());
        assert!(*job.done_signal().borrow());
    }
}
