use std::fmt;

/// What the walker does when a task fails.
///
/// - `Abort`: the first failure stops the whole traversal and is returned to
///   the caller (default).
/// - `Continue`: the failure is reported, the failed task's children are
///   skipped, and traversal resumes at the next sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    #[default]
    Abort,
    Continue,
}

impl ErrorPolicy {
    pub fn from_continue_flag(continue_on_error: bool) -> Self {
        if continue_on_error {
            ErrorPolicy::Continue
        } else {
            ErrorPolicy::Abort
        }
    }
}

/// Whether commands are actually executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecMode {
    #[default]
    Execute,
    /// Interpolate and display every command, create result directories,
    /// but never spawn a process.
    DryRun,
}

impl ExecMode {
    pub fn from_dry_run_flag(dry_run: bool) -> Self {
        if dry_run {
            ExecMode::DryRun
        } else {
            ExecMode::Execute
        }
    }

    pub fn is_dry_run(self) -> bool {
        self == ExecMode::DryRun
    }
}

/// Which pipe a line of process output came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStream::Stdout => f.write_str("stdout"),
            OutputStream::Stderr => f.write_str("stderr"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policies_follow_cli_flags() {
        assert_eq!(ErrorPolicy::from_continue_flag(true), ErrorPolicy::Continue);
        assert_eq!(ErrorPolicy::from_continue_flag(false), ErrorPolicy::Abort);
        assert_eq!(ErrorPolicy::default(), ErrorPolicy::Abort);

        assert!(ExecMode::from_dry_run_flag(true).is_dry_run());
        assert!(!ExecMode::default().is_dry_run());
    }
}
