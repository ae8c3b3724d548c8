// src/exec/runner.rs

//! Process runner: one shell command per call, output streamed line by line.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::engine::{ProgressEvent, ProgressSink};
use crate::errors::ProcessError;
use crate::exec::shell::Shell;
use crate::types::OutputStream;

/// How long output may keep arriving after the command itself exited.
///
/// Background jobs started by the command inherit its pipes; once this
/// elapses their output is dropped and the command counts as finished.
pub const OUTPUT_DRAIN_GRACE: Duration = Duration::from_secs(1);

/// Boxed future returned by [`CommandRunner::run`].
pub type RunFuture<'a> = Pin<Box<dyn Future<Output = Result<(), ProcessError>> + Send + 'a>>;

/// Trait abstracting how a resolved command is executed.
///
/// Production code uses [`ShellRunner`]; tests provide implementations that
/// record commands without spawning processes.
pub trait CommandRunner: Send + Sync {
    /// Run `command` to completion.
    ///
    /// Output lines go to `sink` as they are produced. Every line of this
    /// command must have been emitted by the time the future resolves.
    /// Cancelling `cancel` terminates the command and resolves with
    /// [`ProcessError::Cancelled`].
    fn run(
        &self,
        command: String,
        sink: Arc<dyn ProgressSink>,
        cancel: CancellationToken,
    ) -> RunFuture<'_>;
}

/// Real runner: hands the command to a shell via `tokio::process`.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner {
    shell: Shell,
}

impl ShellRunner {
    pub fn new(shell: Shell) -> Self {
        Self { shell }
    }

    async fn run_inner(
        &self,
        command: String,
        sink: Arc<dyn ProgressSink>,
        cancel: CancellationToken,
    ) -> Result<(), ProcessError> {
        debug!(shell = %self.shell.program, command = %command, "spawning command");

        let mut cmd = self.shell.command(&command);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own process group, so a kill also reaches jobs the shell backgrounds.
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = cmd.spawn().map_err(|source| ProcessError::Launch {
            program: self.shell.program.clone(),
            source,
        })?;
        let pid = child.id();

        let mut readers: Vec<JoinHandle<()>> = [
            forward_lines(child.stdout.take(), OutputStream::Stdout, Arc::clone(&sink)),
            forward_lines(child.stderr.take(), OutputStream::Stderr, Arc::clone(&sink)),
        ]
        .into_iter()
        .flatten()
        .collect();

        // Either the process exits on its own, or the run is cancelled.
        let status = tokio::select! {
            status_res = child.wait() => status_res.map_err(ProcessError::Wait)?,

            _ = cancel.cancelled() => {
                info!(command = %command, "cancellation requested; killing process");
                kill_process_group(pid);
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "failed to kill child process on cancellation");
                }
                abort_all(&readers);
                return Err(ProcessError::Cancelled);
            }
        };

        // Wait for the readers so every line precedes the caller's completion
        // event. A background job can hold the pipes open past exit.
        let drained = tokio::select! {
            _ = join_all(&mut readers) => Some(true),
            _ = tokio::time::sleep(OUTPUT_DRAIN_GRACE) => Some(false),
            _ = cancel.cancelled() => None,
        };
        match drained {
            Some(true) => {}
            Some(false) => {
                warn!(
                    command = %command,
                    grace_ms = OUTPUT_DRAIN_GRACE.as_millis() as u64,
                    "output still open after exit; a background job holds the pipe"
                );
                abort_all(&readers);
            }
            None => {
                info!(command = %command, "cancellation requested while draining output");
                kill_process_group(pid);
                abort_all(&readers);
                return Err(ProcessError::Cancelled);
            }
        }

        debug!(exit_code = ?status.code(), success = status.success(), "command exited");

        match status.code() {
            Some(0) => Ok(()),
            Some(code) => Err(ProcessError::Exited { code }),
            None => Err(ProcessError::Signalled),
        }
    }
}

impl CommandRunner for ShellRunner {
    fn run(
        &self,
        command: String,
        sink: Arc<dyn ProgressSink>,
        cancel: CancellationToken,
    ) -> RunFuture<'_> {
        Box::pin(self.run_inner(command, sink, cancel))
    }
}

async fn join_all(readers: &mut [JoinHandle<()>]) {
    for reader in readers.iter_mut() {
        if let Err(e) = reader.await {
            debug!(error = %e, "output reader ended abnormally");
        }
    }
}

fn abort_all(readers: &[JoinHandle<()>]) {
    for reader in readers {
        reader.abort();
    }
}

/// SIGKILL the whole process group led by `pid`.
#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    let Some(pid) = pid else { return };
    let Ok(pgid) = libc::pid_t::try_from(pid) else { return };
    // SAFETY: kill(2) takes no pointers; a negative pid addresses the group.
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc != 0 {
        debug!(pgid, error = %std::io::Error::last_os_error(), "process group already gone");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

/// Forward each line of `reader` to the sink until EOF.
///
/// Lines are decoded lossily: tools that print non-UTF-8 bytes must not stall
/// the pipe.
fn forward_lines<R>(
    reader: Option<R>,
    stream: OutputStream,
    sink: Arc<dyn ProgressSink>,
) -> Option<JoinHandle<()>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let reader = reader?;
    Some(tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(['\n', '\r']).to_string();
                    sink.emit(ProgressEvent::Output { stream, line });
                }
                Err(e) => {
                    debug!(%stream, error = %e, "stopped reading command output");
                    break;
                }
            }
        }
    }))
}
