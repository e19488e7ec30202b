use std::str::FromStr;

use clap::ValueEnum;
use serde::Deserialize;

/// Which shell a command string is handed to.
///
/// - `Default`: the platform command shell (`cmd /C` on Windows, `sh -c`
///   elsewhere). Needed because command strings may contain pipes,
///   redirection and quoting that only a shell parses.
/// - `PowerShell`: `powershell.exe` on Windows, `pwsh` elsewhere, with
///   `-NoProfile -Command`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Shell {
    #[default]
    Default,
    #[value(name = "powershell")]
    PowerShell,
}

impl FromStr for Shell {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "default" | "sh" | "cmd" => Ok(Shell::Default),
            "powershell" | "pwsh" => Ok(Shell::PowerShell),
            other => Err(format!(
                "invalid shell: {other} (expected \"default\" or \"powershell\")"
            )),
        }
    }
}

/// Whether the invoking call waits for the child process.
///
/// - `Blocking`: the call does not return until the child has exited.
/// - `Detached`: the call returns immediately with a handle; the child runs
///   on its own and nothing ever kills it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationMode {
    #[default]
    Blocking,
    Detached,
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_parses_aliases() {
        assert_eq!("pwsh".parse::<Shell>(), Ok(Shell::PowerShell));
        assert_eq!(" SH ".parse::<Shell>(), Ok(Shell::Default));
        assert!("fish".parse::<Shell>().is_err());
    }
}
