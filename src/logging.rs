// src/logging.rs

//! Logging setup for `asr-runner` using `tracing` + `tracing-subscriber`.
//!
//! The filter comes from, in order:
//! 1. `--log-level` (one level for everything)
//! 2. `ASR_RUNNER_LOG`, read as `EnvFilter` directives, so
//!    `ASR_RUNNER_LOG=asr_runner=debug,tower_http=info` works
//! 3. `warn`
//!
//! Logs go to STDERR; STDOUT carries the run progress.

use anyhow::Result;
use tracing::warn;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "ASR_RUNNER_LOG";
pub const DEFAULT_DIRECTIVE: &str = "warn";

/// Initialise the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV_VAR).ok();
    let directive = filter_directive(cli_level, env.as_deref());

    let (filter, rejected) = match EnvFilter::try_new(&directive) {
        Ok(filter) => (filter, None),
        Err(e) => (EnvFilter::new(DEFAULT_DIRECTIVE), Some(e)),
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("initialising logging: {e}"))?;

    if let Some(e) = rejected {
        warn!(directive = %directive, error = %e, "invalid {LOG_ENV_VAR}; using {DEFAULT_DIRECTIVE}");
    }
    Ok(())
}

fn filter_directive(cli_level: Option<LogLevel>, env: Option<&str>) -> String {
    if let Some(level) = cli_level {
        return level_name(level).to_string();
    }
    match env.map(str::trim) {
        Some(directives) if !directives.is_empty() => directives.to_string(),
        _ => DEFAULT_DIRECTIVE.to_string(),
    }
}

fn level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::filter::LevelFilter;

    #[test]
    fn cli_level_overrides_the_environment() {
        assert_eq!(filter_directive(Some(LogLevel::Debug), Some("asr_runner=trace")), "debug");
    }

    #[test]
    fn environment_directives_pass_through() {
        assert_eq!(
            filter_directive(None, Some(" asr_runner=debug,tower_http=info ")),
            "asr_runner=debug,tower_http=info"
        );
    }

    #[test]
    fn defaults_to_warn() {
        assert_eq!(filter_directive(None, None), "warn");
        assert_eq!(filter_directive(None, Some("  ")), "warn");
    }

    #[test]
    fn per_target_directives_build_a_filter() {
        let filter = EnvFilter::try_new("asr_runner=debug").unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }
}
