// src/exec/runner.rs

//! Spawning shell commands and collecting their output.

use std::io::{self, BufRead, BufReader, PipeReader};
use std::process::Stdio;

use tokio::process::Child;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, trace, warn};

use crate::exec::invocation::ProcessInvocation;
use crate::exec::output::{CommandOutput, CommandResult, CommandStatus};
use crate::types::InvocationMode;

/// Handle to a detached invocation.
///
/// Dropping the handle detaches it; the child process keeps running and is
/// never killed by this crate.
#[derive(Debug)]
pub struct CommandHandle<T> {
    command: String,
    handle: JoinHandle<T>,
}

impl<T> CommandHandle<T> {
    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the invocation to finish.
    pub async fn wait(self) -> Result<T, JoinError> {
        self.handle.await
    }
}

/// What [`invoke`] did with an invocation, depending on its mode.
#[derive(Debug)]
pub enum Invoked {
    Finished(CommandStatus),
    Detached(CommandHandle<CommandStatus>),
}

/// Run an invocation according to its [`InvocationMode`].
pub async fn invoke(invocation: ProcessInvocation) -> Invoked {
    match invocation.mode {
        InvocationMode::Blocking => Invoked::Finished(run_command(&invocation).await),
        InvocationMode::Detached => Invoked::Detached(spawn_command(invocation)),
    }
}

/// Run a command and wait for it to exit.
///
/// Output is discarded unless `display` is set, in which case it is read and
/// echoed line by line.
pub async fn run_command(invocation: &ProcessInvocation) -> CommandStatus {
    let sink = if invocation.display {
        Sink::Merged
    } else {
        Sink::Discard
    };
    match spawn_child(invocation, sink) {
        Ok(spawned) => finish(invocation, spawned, false).await.0,
        Err(status) => status,
    }
}

/// Start a command without waiting for it.
///
/// The process is spawned before this returns; only the wait runs in the
/// background. Its output never goes through a pipe owned by this process,
/// so the child keeps running after the handle, or the whole runtime, is
/// gone. With `display` set it writes straight to our stdout.
pub fn spawn_command(invocation: ProcessInvocation) -> CommandHandle<CommandStatus> {
    let command = invocation.command.clone();
    let sink = if invocation.display {
        Sink::Inherit
    } else {
        Sink::Discard
    };
    let handle = match spawn_child(&invocation, sink) {
        Ok(spawned) => {
            tokio::spawn(async move { finish(&invocation, spawned, false).await.0 })
        }
        Err(status) => tokio::spawn(async move { status }),
    };
    CommandHandle { command, handle }
}

/// Run a command to completion and capture its merged stdout/stderr.
pub async fn command_output(invocation: &ProcessInvocation) -> CommandResult {
    match spawn_child(invocation, Sink::Merged) {
        Ok(spawned) => {
            let (status, lines) = finish(invocation, spawned, true).await;
            captured(status, lines)
        }
        Err(status) => captured(status, Vec::new()),
    }
}

/// Detached variant of [`command_output`].
///
/// The child writes into a pipe read by this process, so unlike
/// [`spawn_command`] it needs the runtime to stay up until the child closes
/// its output.
pub fn spawn_command_output(invocation: ProcessInvocation) -> CommandHandle<CommandResult> {
    let command = invocation.command.clone();
    let handle = match spawn_child(&invocation, Sink::Merged) {
        Ok(spawned) => tokio::spawn(async move {
            let (status, lines) = finish(&invocation, spawned, true).await;
            captured(status, lines)
        }),
        Err(status) => tokio::spawn(async move { captured(status, Vec::new()) }),
    };
    CommandHandle { command, handle }
}

/// Whatever was read is kept, whatever the status.
fn captured(status: CommandStatus, lines: Vec<String>) -> CommandResult {
    CommandResult {
        status,
        output: CommandOutput::from_lines(lines),
    }
}

/// Where the child's stdout and stderr go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sink {
    Discard,
    Inherit,
    /// One pipe shared by stdout and stderr, read back line by line.
    Merged,
}

struct Spawned {
    child: Child,
    output: Option<PipeReader>,
}

/// Spawn the process. Failures are logged here and handed back as the
/// status to report.
fn spawn_child(invocation: &ProcessInvocation, sink: Sink) -> Result<Spawned, CommandStatus> {
    info!(cmd = %invocation.command, shell = ?invocation.shell, ?sink, "starting process");

    let spawn_failed = |e: std::io::Error| {
        error!(cmd = %invocation.command, error = %e, "failed to spawn process");
        CommandStatus::SpawnFailed(e.to_string())
    };

    let mut cmd = invocation.to_command();
    cmd.stdin(Stdio::null());

    let output = match sink {
        Sink::Discard => {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
            None
        }
        Sink::Inherit => {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            None
        }
        Sink::Merged => {
            // Both streams share one pipe, so lines arrive in the order the
            // child wrote them.
            let (reader, writer) = io::pipe().map_err(spawn_failed)?;
            let err_writer = writer.try_clone().map_err(spawn_failed)?;
            cmd.stdout(writer).stderr(err_writer);
            Some(reader)
        }
    };

    let child = cmd.spawn().map_err(spawn_failed)?;
    // `cmd` still owns our copies of the write ends; the reader only sees
    // EOF once they are closed.
    drop(cmd);

    Ok(Spawned { child, output })
}

/// Read the merged output (if any) to EOF, then wait for the exit status.
///
/// Lines read before a failed wait are still returned.
async fn finish(
    invocation: &ProcessInvocation,
    spawned: Spawned,
    capture: bool,
) -> (CommandStatus, Vec<String>) {
    let Spawned { mut child, output } = spawned;

    let lines = match output {
        Some(reader) => {
            let command = invocation.command.clone();
            let display = invocation.display;
            match tokio::task::spawn_blocking(move || {
                read_lines(reader, &command, display, capture)
            })
            .await
            {
                Ok(lines) => lines,
                Err(e) => {
                    warn!(cmd = %invocation.command, error = %e, "output reader failed");
                    Vec::new()
                }
            }
        }
        None => Vec::new(),
    };

    let status = match child.wait().await {
        Ok(status) => {
            debug!(
                cmd = %invocation.command,
                exit_code = status.code().unwrap_or(-1),
                success = status.success(),
                lines = lines.len(),
                "process exited"
            );
            CommandStatus::from(status)
        }
        Err(e) => {
            error!(cmd = %invocation.command, error = %e, "failed waiting for process");
            CommandStatus::Io(e.to_string())
        }
    };

    (status, lines)
}

/// Read `pipe` line by line until EOF.
///
/// Bytes are decoded lossily: console tools on Windows often print in the
/// OEM code page.
fn read_lines(pipe: PipeReader, command: &str, display: bool, capture: bool) -> Vec<String> {
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    let mut lines = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf)
                    .trim_end_matches(['\n', '\r'])
                    .to_string();
                if display && !line.trim().is_empty() {
                    println!("{line}");
                }
                if capture {
                    lines.push(line);
                } else {
                    trace!(cmd = %command, "output: {}", line);
                }
            }
            Err(e) => {
                warn!(cmd = %command, error = %e, "error reading process output; dropping rest");
                break;
            }
        }
    }

    lines
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn silent_command_yields_single_empty_line() {
        let result = command_output(&ProcessInvocation::new("true")).await;
        assert_eq!(result.status, CommandStatus::Exited(0));
        assert_eq!(result.output.lines(), [String::new()]);
    }

    #[tokio::test]
    async fn lines_keep_emission_order() {
        let result = command_output(&ProcessInvocation::new("printf 'a  \\nb\\nc \\n'")).await;
        assert_eq!(result.output.lines(), ["a", "b", "c"]);
    }

    #[tokio::test]
    async fn stderr_is_merged_into_output() {
        let result = command_output(&ProcessInvocation::new("echo out; echo err 1>&2")).await;
        assert!(result.output.contains("out"));
        assert!(result.output.contains("err"));
    }

    #[test]
    fn lines_survive_a_failed_wait() {
        let result = captured(
            CommandStatus::Io("wait failed".into()),
            vec!["partial".to_string()],
        );
        assert_eq!(result.output.lines(), ["partial"]);
        assert!(!result.success());

        let result = captured(CommandStatus::SpawnFailed("no shell".into()), Vec::new());
        assert_eq!(result.output.lines(), [""]);
    }

    #[tokio::test]
    async fn stdout_and_stderr_interleave_in_write_order() {
        for _ in 0..50 {
            let result = command_output(&ProcessInvocation::new(
                "echo a; echo b 1>&2; echo c; echo d 1>&2; echo e",
            ))
            .await;
            assert_eq!(result.output.lines(), ["a", "b", "c", "d", "e"]);
        }
    }

    #[tokio::test]
    async fn displayed_run_still_reports_status() {
        let status = run_command(&ProcessInvocation::new("echo shown; exit 2").with_display(true)).await;
        assert_eq!(status, CommandStatus::Exited(2));
    }

    #[tokio::test]
    async fn exit_code_is_reported() {
        let status = run_command(&ProcessInvocation::new("exit 3")).await;
        assert_eq!(status, CommandStatus::Exited(3));
    }
}
