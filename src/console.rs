// src/console.rs

//! CLI progress sink: coloured progress on stdout and a spinner while a
//! command is running.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::engine::events::format_elapsed;
use crate::engine::{Completion, ProgressEvent, ProgressSink};
use crate::types::OutputStream;

const SPINNER_TICK: Duration = Duration::from_millis(120);

#[derive(Default)]
pub struct ConsoleSink {
    dry_run: AtomicBool,
    spinner: Mutex<Option<ProgressBar>>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn start_spinner(&self) {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["|", "/", "-", "\\", " "]),
        );
        bar.set_message("running...");
        bar.enable_steady_tick(SPINNER_TICK);

        let mut slot = self.spinner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(bar) {
            previous.finish_and_clear();
        }
    }

    fn stop_spinner(&self) {
        let mut slot = self.spinner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(bar) = slot.take() {
            bar.finish_and_clear();
        }
    }

    /// Print without tearing the spinner line.
    fn print(&self, stream: OutputStream, text: &str) {
        let slot = self.spinner.lock().unwrap_or_else(PoisonError::into_inner);
        let write = || match stream {
            OutputStream::Stdout => println!("{text}"),
            OutputStream::Stderr => eprintln!("{text}"),
        };
        match slot.as_ref() {
            Some(bar) => bar.suspend(write),
            None => write(),
        }
    }

    fn out(&self, text: &str) {
        self.print(OutputStream::Stdout, text);
    }
}

impl ProgressSink for ConsoleSink {
    fn emit(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::RunStarted {
                workflow,
                target,
                outdir,
                mode,
            } => {
                self.dry_run.store(mode.is_dry_run(), Ordering::Relaxed);
                self.out(&format!("{}", format!("▶ {workflow}").bold()));
                self.out(&format!("  {} : {target}", "target".cyan()));
                self.out(&format!("  {} : {}", "output".cyan(), outdir.display()));
                if mode.is_dry_run() {
                    self.out(&format!("  {}   : DRY RUN", "mode".cyan()));
                }
                self.out("");
            }
            ProgressEvent::TaskStarted {
                name,
                description,
                result,
                command,
                depth,
            } => {
                let indent = "  ".repeat(depth);
                self.out(&format!("{indent}{}", format!("• {name}").bold()));
                if let Some(desc) = description {
                    self.out(&format!("{indent}  - {desc}"));
                }
                if let Some(result) = result {
                    self.out(&format!("{indent}  - result: {}", result.display()));
                }
                self.out(&format!("{indent}  - cmd   : {}", command.bright_black()));

                if !self.dry_run.load(Ordering::Relaxed) {
                    self.start_spinner();
                }
            }
            ProgressEvent::Output { stream, line } => self.print(stream, &line),
            ProgressEvent::TaskSucceeded {
                elapsed, simulated, ..
            } => {
                self.stop_spinner();
                if simulated {
                    self.out(&format!("  {}\n", "✓ skipped (dry run)".green()));
                } else {
                    self.out(&format!("  {} : {}\n", "✓ done".green(), format_elapsed(elapsed)));
                }
            }
            ProgressEvent::TaskFailed { name, error } => {
                self.stop_spinner();
                self.out(&format!("{}\n", failure_line(&name, &error).red()));
            }
            ProgressEvent::TaskContinued { name, error } => {
                self.out(&format!("    ↪ continue after error in {name:?}: {error}\n"));
            }
        }
    }

    fn complete(&self, completion: &Completion) {
        self.stop_spinner();
        let line = completion.render_line();
        if completion.success {
            self.out(&line.green().to_string());
        } else {
            self.print(OutputStream::Stderr, &line.red().to_string());
        }
    }
}

fn failure_line(name: &str, error: &str) -> String {
    format!("  ✗ error in {name:?}: {error}")
}
