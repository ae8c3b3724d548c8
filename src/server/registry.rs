// src/server/registry.rs

//! Concurrent run-id → job map owned by the HTTP layer.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::server::job::{Job, RunId};

/// Hands out time-derived ids that are strictly increasing for the lifetime
/// of the process, even when the clock stalls or steps backwards.
#[derive(Debug, Default)]
pub struct RunIdGenerator {
    last: AtomicU64,
}

impl RunIdGenerator {
    pub fn next_id(&self) -> RunId {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0);

        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return candidate.to_string(),
                Err(actual) => prev = actual,
            }
        }
    }
}

/// Registry of in-flight (and completed but not yet observed) runs.
///
/// Lookups are frequent and concurrent, inserts and removals rare, hence the
/// read-write lock.
#[derive(Debug, Default)]
pub struct RunRegistry {
    runs: RwLock<HashMap<RunId, Arc<Job>>>,
    ids: RunIdGenerator,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a job under a fresh id and insert it.
    pub fn register(&self, target: String, outdir: PathBuf, capacity: usize) -> Arc<Job> {
        let id = self.ids.next_id();
        let job = Arc::new(Job::new(id.clone(), target, outdir, capacity));

        self.runs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), Arc::clone(&job));

        debug!(run_id = %id, "registered run");
        job
    }

    pub fn lookup(&self, id: &str) -> Option<Arc<Job>> {
        self.runs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn unregister(&self, id: &str) -> Option<Arc<Job>> {
        let removed = self
            .runs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        if removed.is_some() {
            debug!(run_id = %id, "unregistered run");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.runs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Cancel every registered run (server shutdown).
    pub fn cancel_all(&self) {
        let runs = self.runs.read().unwrap_or_else(PoisonError::into_inner);
        for job in runs.values() {
            job.cancel_token().cancel();
        }
    }
}
