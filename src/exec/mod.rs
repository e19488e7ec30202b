// src/exec/mod.rs

//! Process execution layer.
//!
//! Every external command runs through a shell (`sh -c`, `cmd /C` or
//! PowerShell) using `tokio::process::Command`.
//!
//! - [`invocation`] describes one command: string, shell, mode, display.
//! - [`runner`] spawns it, blocking or detached, optionally capturing the
//!   merged stdout/stderr lines.
//! - [`output`] holds `CommandStatus` / `CommandOutput` / `CommandResult`.
//! - [`classify`] turns a result into a `Verdict`.
//!
//! Exit codes and I/O failures are reported as values, never raised, and
//! nothing here ever kills a child process.

pub mod classify;
pub mod invocation;
pub mod output;
pub mod runner;

pub use classify::{FailurePhrases, FailureReason, OutputClassifier, Verdict};
pub use invocation::ProcessInvocation;
pub use output::{CommandOutput, CommandResult, CommandStatus};
pub use runner::{
    command_output, invoke, run_command, spawn_command, spawn_command_output, CommandHandle,
    Invoked,
};
