// src/server/mod.rs

//! Local web UI: start runs over HTTP and follow their logs as
//! server-sent events.

pub mod job;
pub mod models;
pub mod registry;
pub mod routes;
pub mod state;
pub mod stream;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::engine::WalkOptions;
use crate::exec::{CommandRunner, Shell, ShellRunner};
use crate::report::ReportConfig;
use crate::types::{ErrorPolicy, ExecMode};

pub use job::{Job, JobSink, RunId};
pub use registry::{RunIdGenerator, RunRegistry};
pub use routes::create_router;
pub use state::AppState;

/// Per-run log buffer capacity, in lines.
pub const DEFAULT_STREAM_BUFFER: usize = 1024;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
    pub output_root: PathBuf,
    pub shell: Shell,
    pub walk: WalkOptions,
    pub stream_buffer: usize,
    pub max_depth: usize,
    pub report: ReportConfig,
}

impl ServerConfig {
    pub fn from_args(args: &CliArgs) -> Self {
        Self {
            addr: normalize_addr(&args.addr),
            output_root: args.outdir.clone(),
            shell: Shell::resolve(args.shell.as_deref()),
            walk: WalkOptions {
                error_policy: ErrorPolicy::from_continue_flag(args.continue_on_error),
                mode: ExecMode::from_dry_run_flag(args.dry_run),
            },
            stream_buffer: args.stream_buffer,
            max_depth: args.max_depth,
            report: ReportConfig::from_env(),
        }
    }
}

/// `":8080"` means every interface.
fn normalize_addr(addr: &str) -> String {
    match addr.strip_prefix(':') {
        Some(port) => format!("0.0.0.0:{port}"),
        None => addr.to_string(),
    }
}

/// Serve until Ctrl-C. In-flight runs are cancelled on shutdown.
pub async fn start_server(config: ServerConfig) -> Result<()> {
    let runner: Arc<dyn CommandRunner> = Arc::new(ShellRunner::new(config.shell.clone()));
    let state = AppState::new(config, runner);
    let registry = Arc::clone(&state.registry);

    let listener = tokio::net::TcpListener::bind(&state.config.addr)
        .await
        .with_context(|| format!("failed to bind {}", state.config.addr))?;
    let local = listener.local_addr()?;

    info!(addr = %local, output_root = %state.config.output_root.display(), "web UI listening");
    println!("asr-runner UI on http://{local}");

    let app = create_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
            info!("shutdown requested; cancelling in-flight runs");
            registry.cancel_all();
        })
        .await?;

    Ok(())
}
