// src/exec/shell.rs

use tokio::process::Command;

/// The interpreter a command string is handed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shell {
    pub program: String,
    pub args: Vec<String>,
}

impl Shell {
    /// `sh -c` on Unix, `cmd /C` on Windows.
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Self {
                program: "cmd".to_string(),
                args: vec!["/C".to_string()],
            }
        } else {
            Self {
                program: "sh".to_string(),
                args: vec!["-c".to_string()],
            }
        }
    }

    /// An operator-supplied shell is invoked as `<shell> -c <command>`;
    /// a missing or blank override selects the platform default.
    pub fn resolve(override_shell: Option<&str>) -> Self {
        match override_shell.map(str::trim) {
            Some(program) if !program.is_empty() => Self {
                program: program.to_string(),
                args: vec!["-c".to_string()],
            },
            _ => Self::platform_default(),
        }
    }

    pub(crate) fn command(&self, command_line: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg(command_line);
        cmd
    }
}

impl Default for Shell {
    fn default() -> Self {
        Self::platform_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_override_falls_back_to_platform_default() {
        assert_eq!(Shell::resolve(Some("  ")), Shell::platform_default());
        assert_eq!(Shell::resolve(None), Shell::platform_default());
    }

    #[test]
    fn override_uses_dash_c() {
        let shell = Shell::resolve(Some("bash"));
        assert_eq!(shell.program, "bash");
        assert_eq!(shell.args, vec!["-c"]);
    }
}
