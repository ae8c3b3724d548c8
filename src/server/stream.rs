// src/server/stream.rs

//! Server-sent-events transport for a run's log.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::OwnedMutexGuard;
use tokio::sync::mpsc::Receiver;
use tracing::debug;

use crate::server::job::Job;
use crate::server::models::{ApiError, StreamQuery};
use crate::server::registry::RunRegistry;
use crate::server::state::AppState;

/// Data of the final event on every stream.
pub const RUN_COMPLETE_MARKER: &str = "[run complete]";
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

pub async fn stream_handler(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let job = state
        .registry
        .lookup(&query.id)
        .ok_or_else(|| ApiError::NotFound(format!("unknown run id: {}", query.id)))?;

    let lines = job
        .try_attach()
        .ok_or_else(|| ApiError::Conflict(format!("run {} already has an observer", query.id)))?;

    debug!(run_id = %query.id, "observer attached");
    let stream = progress_stream(job, lines, Arc::clone(&state.registry));
    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL)))
}

/// Relay lines until the run completes, then flush what is buffered, report
/// dropped lines, unregister the run and send the terminal marker.
///
/// Dropping the stream (client went away) releases `lines`, so a later
/// observer can pick up where this one stopped.
pub fn progress_stream(
    job: Arc<Job>,
    mut lines: OwnedMutexGuard<Receiver<String>>,
    registry: Arc<RunRegistry>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    async_stream::stream! {
        let mut done = job.done_signal();

        loop {
            let next = tokio::select! {
                biased;
                line = lines.recv() => line,
                _ = done.wait_for(|finished| *finished) => None,
            };
            match next {
                Some(line) => yield Ok(line_event(&line)),
                None => break,
            }
        }

        while let Ok(line) = lines.try_recv() {
            yield Ok(line_event(&line));
        }

        let dropped = job.dropped_lines();
        if dropped > 0 {
            yield Ok(Event::default()
                .event("warning")
                .data(format!("{dropped} log line(s) dropped: buffer was full")));
        }

        registry.unregister(job.id());
        debug!(run_id = %job.id(), "stream finished");
        yield Ok(Event::default().data(RUN_COMPLETE_MARKER));
    }
}

/// SSE data may not contain carriage returns.
fn line_event(line: &str) -> Event {
    Event::default().data(line.replace('\r', ""))
}
