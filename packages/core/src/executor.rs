//! Command execution abstraction with privilege escalation support.
//!
//! Every external tool (`blkid`, `lsblk`, `mount`, `rsync`, ...) is invoked
//! through the [`CommandRunner`] trait as an argument list, never as an
//! interpolated shell string. A non-zero exit status is data, not an error:
//! callers classify [`CommandOutput::code`] themselves. Failing to spawn the
//! process at all is the only error case.

use std::ffi::OsString;
use std::fmt;
use std::process::Command;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{IoResultExt, Result};

/// Privilege escalation method for executing commands that require root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivilegeEscalation {
    /// Execute directly without privilege escalation.
    None,
    /// Use `pkexec` for GUI-based privilege escalation (polkit).
    Pkexec,
    /// Use `sudo` for TTY-based privilege escalation.
    #[default]
    Sudo,
}

impl PrivilegeEscalation {
    fn wrapper(self) -> Option<&'static str> {
        match self {
            PrivilegeEscalation::None => None,
            PrivilegeEscalation::Pkexec => Some("pkexec"),
            PrivilegeEscalation::Sudo => Some("sudo"),
        }
    }
}

/// A single external command: program, arguments and whether it needs root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<OsString>,
    pub privileged: bool,
}

impl CommandSpec {
    /// A command run with the caller's own privileges.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            privileged: false,
        }
    }

    /// A command that must run as root.
    pub fn privileged<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            privileged: true,
            ..Self::new(program, args)
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit code. `-1` when the process was killed by a signal.
    pub code: i32,
}

impl CommandOutput {
    /// Returns true when the command exited with status 0.
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Capability for running external commands.
///
/// Components receive a runner at construction instead of reaching for a
/// process-wide instance, so tests can substitute canned output.
pub trait CommandRunner: Send + Sync {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// Execution context for running system commands.
///
/// # Example
///
/// ```
/// use usbmirror_core::executor::{ExecutionContext, PrivilegeEscalation};
///
/// // Resolves to `None` when already running as root
/// let ctx = ExecutionContext::with_escalation(PrivilegeEscalation::Pkexec);
/// assert!(matches!(
///     ctx.escalation(),
///     PrivilegeEscalation::Pkexec | PrivilegeEscalation::None
/// ));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    escalation: PrivilegeEscalation,
}

impl ExecutionContext {
    /// Creates an execution context with a specific escalation method.
    ///
    /// When the process already runs as root the wrapper is skipped.
    pub fn with_escalation(escalation: PrivilegeEscalation) -> Self {
        let escalation = if nix::unistd::geteuid().is_root() {
            PrivilegeEscalation::None
        } else {
            escalation
        };
        Self { escalation }
    }

    /// Returns the current privilege escalation method.
    pub fn escalation(&self) -> PrivilegeEscalation {
        self.escalation
    }

    /// Builds the `std::process::Command` for a `CommandSpec`, wrapping privileged
    /// commands with the escalation tool.
    fn build(&self, spec: &CommandSpec) -> Command {
        match self.escalation.wrapper().filter(|_| spec.privileged) {
            Some(wrapper) => {
                let mut cmd = Command::new(wrapper);
                cmd.arg(&spec.program).args(&spec.args);
                cmd
            }
            None => {
                let mut cmd = Command::new(&spec.program);
                cmd.args(&spec.args);
                cmd
            }
        }
    }
}

impl CommandRunner for ExecutionContext {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        debug!("running: {}{}", if spec.privileged { "[root] " } else { "" }, spec);

        let output = self
            .build(spec)
            .output()
            .command_context(spec.to_string())?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code().unwrap_or(-1),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_privileged_command_is_wrapped() {
        let ctx = ExecutionContext {
            escalation: PrivilegeEscalation::Sudo,
        };
        let spec = CommandSpec::privileged("mkdir", ["-p", "/media/USB"]);
        let cmd = ctx.build(&spec);

        assert_eq!(cmd.get_program(), "sudo");
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, ["mkdir", "-p", "/media/USB"]);
    }

    #[test]
    fn test_unprivileged_command_is_not_wrapped() {
        let ctx = ExecutionContext {
            escalation: PrivilegeEscalation::Pkexec,
        };
        let spec = CommandSpec::new("lsblk", ["--json"]);
        let cmd = ctx.build(&spec);

        assert_eq!(cmd.get_program(), "lsblk");
    }

    #[test]
    fn test_no_escalation_runs_directly() {
        let ctx = ExecutionContext {
            escalation: PrivilegeEscalation::None,
        };
        let spec = CommandSpec::privileged("umount", ["/media/USB"]);
        assert_eq!(ctx.build(&spec).get_program(), "umount");
    }

    #[test]
    fn test_nonzero_exit_is_not_an_error() {
        let ctx = ExecutionContext {
            escalation: PrivilegeEscalation::None,
        };
        let output = ctx.run(&CommandSpec::new("false", Vec::<String>::new())).unwrap();
        assert!(!output.success());
        assert_eq!(output.code, 1);
    }

    #[test]
    fn test_spawn_failure_is_an_error() {
        let ctx = ExecutionContext::default();
        let result = ctx.run(&CommandSpec::new("definitely-not-a-real-binary-xyz", ["x"]));
        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        let spec = CommandSpec::new("rsync", ["-rt", "a/", "b/", "--delete"]);
        assert_eq!(spec.to_string(), "rsync -rt a/ b/ --delete");
    }

    #[test]
    fn test_non_utf8_argument_is_passed_through() {
        use std::os::unix::ffi::OsStrExt;
        let raw = std::ffi::OsStr::from_bytes(b"/media/caf\xe9");
        let spec = CommandSpec::new("ls", [raw]);
        let ctx = ExecutionContext {
            escalation: PrivilegeEscalation::None,
        };
        let cmd = ctx.build(&spec);
        let args: Vec<_> = cmd.get_args().collect();
        assert_eq!(args, [raw]);
    }

    #[test]
    fn test_escalation_serde() {
        let parsed: PrivilegeEscalation = serde_json::from_str("\"pkexec\"").unwrap();
        assert_eq!(parsed, PrivilegeEscalation::Pkexec);
    }
}
