// src/exec/output.rs

//! Result types produced by the process invoker.

use std::fmt;
use std::process::ExitStatus;

/// How a process invocation ended.
///
/// Transient failures (spawn errors, broken pipes while waiting) are folded
/// into this type instead of being raised, so a batch of commands always
/// runs to the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    /// The child exited with this code.
    Exited(i32),
    /// The child ended without an exit code (e.g. killed by a signal).
    Terminated,
    /// The child could not be started.
    SpawnFailed(String),
    /// Waiting for or reading from the child failed.
    Io(String),
}

impl CommandStatus {
    pub fn success(&self) -> bool {
        matches!(self, CommandStatus::Exited(0))
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            CommandStatus::Exited(code) => Some(*code),
            _ => None,
        }
    }
}

impl From<ExitStatus> for CommandStatus {
    fn from(status: ExitStatus) -> Self {
        status
            .code()
            .map_or(CommandStatus::Terminated, CommandStatus::Exited)
    }
}

impl fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandStatus::Exited(code) => write!(f, "exited with code {code}"),
            CommandStatus::Terminated => write!(f, "terminated without exit code"),
            CommandStatus::SpawnFailed(msg) => write!(f, "failed to start: {msg}"),
            CommandStatus::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

/// Captured, order-preserving output of one invocation.
///
/// Stdout and stderr are merged into one sequence. Lines carry no line
/// terminator and no trailing whitespace. The sequence is never empty: a
/// process that printed nothing yields a single empty line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    lines: Vec<String>,
}

impl CommandOutput {
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let lines: Vec<String> = lines
            .into_iter()
            .map(|line| line.as_ref().trim_end().to_string())
            .collect();

        if lines.is_empty() {
            Self::empty()
        } else {
            Self { lines }
        }
    }

    /// The output of a process that printed nothing: `[""]`.
    pub fn empty() -> Self {
        Self {
            lines: vec![String::new()],
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }

    /// Trimmed lines that carry any text.
    pub fn non_blank(&self) -> impl Iterator<Item = &str> + '_ {
        self.lines
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
    }

    pub fn is_blank(&self) -> bool {
        self.non_blank().next().is_none()
    }

    /// Whether any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}

impl Default for CommandOutput {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Display for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lines.join("\n"))
    }
}

/// Status and captured output of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub output: CommandOutput,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}
