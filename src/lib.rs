// src/lib.rs

pub mod cli;
pub mod config;
pub mod console;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod report;
pub mod run_dir;
pub mod server;
pub mod types;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::load_and_validate_with_depth;
use crate::console::ConsoleSink;
use crate::engine::{build_plan, execute_run, render_plan, ProgressSink, RunContext, TreeWalker, WalkOptions};
use crate::exec::{Shell, ShellRunner};
use crate::run_dir::{create_run_dir, run_dir_name};
use crate::server::ServerConfig;
use crate::types::{ErrorPolicy, ExecMode};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - web mode (`--serve`), or
/// - config loading and target resolution
/// - plan printing (`--plan`)
/// - run directory, shell runner, console progress and Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    if args.serve {
        return server::start_server(ServerConfig::from_args(&args)).await;
    }

    let workflow_path = args
        .workflow
        .as_ref()
        .ok_or_else(|| anyhow!("--workflow is required unless --serve is given"))?;

    // Configuration errors are fatal before anything runs.
    let workflow = load_and_validate_with_depth(workflow_path, args.max_depth)?;
    let target = workflow.resolve_target(args.target.as_deref())?;
    info!(workflow = %workflow.name, tasks = workflow.task_count(), "workflow loaded");

    if args.plan {
        let outdir = args.outdir.join(run_dir_name(&workflow.name));
        let ctx = RunContext::new(target, outdir);
        print!("{}", render_plan(&build_plan(&workflow, &ctx)));
        return Ok(());
    }

    let outdir = create_run_dir(&args.outdir, &workflow.name)
        .with_context(|| format!("creating run directory under {}", args.outdir.display()))?;
    let ctx = RunContext::new(target, outdir);

    let options = WalkOptions {
        error_policy: ErrorPolicy::from_continue_flag(args.continue_on_error),
        mode: ExecMode::from_dry_run_flag(args.dry_run),
    };
    let runner = Arc::new(ShellRunner::new(Shell::resolve(args.shell.as_deref())));
    let walker = TreeWalker::new(runner, options);
    let sink: Arc<dyn ProgressSink> = Arc::new(ConsoleSink::new());

    // Ctrl-C → cancel the in-flight command and stop the walk.
    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            cancel.cancel();
        });
    }

    let report = execute_run(&walker, &workflow, &ctx, sink, &cancel).await?;
    debug!(
        succeeded = report.succeeded,
        absorbed = report.failures.len(),
        "cli run complete"
    );
    Ok(())
}
