// src/exec/invocation.rs

//! Description of a single shell-mediated process invocation.

use tokio::process::Command;

use crate::types::{InvocationMode, Shell};

/// One spawn of an external command through a shell.
///
/// The command string is passed verbatim; callers own quoting and escaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInvocation {
    pub command: String,
    pub shell: Shell,
    pub mode: InvocationMode,
    /// Echo every non-blank output line to stdout as it is read.
    pub display: bool,
}

impl ProcessInvocation {
    /// Blocking invocation through the platform command shell.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            shell: Shell::Default,
            mode: InvocationMode::Blocking,
            display: false,
        }
    }

    /// Blocking invocation through PowerShell.
    pub fn powershell(command: impl Into<String>) -> Self {
        Self::new(command).with_shell(Shell::PowerShell)
    }

    pub fn with_shell(mut self, shell: Shell) -> Self {
        self.shell = shell;
        self
    }

    pub fn with_mode(mut self, mode: InvocationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn detached(self) -> Self {
        self.with_mode(InvocationMode::Detached)
    }

    pub fn with_display(mut self, display: bool) -> Self {
        self.display = display;
        self
    }

    /// Build a shell command appropriate for the platform.
    pub(crate) fn to_command(&self) -> Command {
        let (program, args) = shell_prefix(self.shell);
        let mut cmd = Command::new(program);
        cmd.args(args).arg(&self.command);
        cmd
    }
}

const CMD_ARGS: &[&str] = &["/C"];
const SH_ARGS: &[&str] = &["-c"];
const WINDOWS_POWERSHELL_ARGS: &[&str] = &["-NoProfile", "-ExecutionPolicy", "Bypass", "-Command"];
const PWSH_ARGS: &[&str] = &["-NoProfile", "-Command"];

fn shell_prefix(shell: Shell) -> (&'static str, &'static [&'static str]) {
    match shell {
        Shell::Default if cfg!(windows) => ("cmd", CMD_ARGS),
        Shell::Default => ("sh", SH_ARGS),
        Shell::PowerShell if cfg!(windows) => ("powershell.exe", WINDOWS_POWERSHELL_ARGS),
        Shell::PowerShell => ("pwsh", PWSH_ARGS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_to_blocking_default_shell() {
        let inv = ProcessInvocation::new("echo hi");
        assert_eq!(inv.shell, Shell::Default);
        assert_eq!(inv.mode, InvocationMode::Blocking);
        assert!(!inv.display);

        let inv = ProcessInvocation::powershell("Get-Date").detached();
        assert_eq!(inv.shell, Shell::PowerShell);
        assert_eq!(inv.mode, InvocationMode::Detached);
    }

    #[cfg(unix)]
    #[test]
    fn default_shell_is_sh_dash_c() {
        let cmd = ProcessInvocation::new("echo hi | cat").to_command();
        let std_cmd = cmd.as_std();
        assert_eq!(std_cmd.get_program(), "sh");
        let args: Vec<_> = std_cmd.get_args().collect();
        assert_eq!(args, ["-c", "echo hi | cat"]);
    }
}
