// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::types::Shell;

/// Command-line arguments for `repairkit`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "repairkit",
    version,
    about = "Run maintenance commands, task batches, package updates and repair plans.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `RepairKit.toml` in the current working directory. A missing
    /// default file means built-in defaults.
    #[arg(long, global = true, value_name = "PATH", default_value = "RepairKit.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `REPAIRKIT_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run a single shell command.
    Exec(ExecArgs),

    /// Run several shell commands in parallel and wait for all of them.
    Batch(BatchArgs),

    /// Upgrade every outdated winget package not excluded in `[updates]`.
    Update {
        /// Only list outdated and excluded packages.
        #[arg(long)]
        dry_run: bool,
    },

    /// Run the `[step.*]` maintenance plan wave by wave.
    Plan {
        /// Print the waves and commands without running anything.
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Debug, Clone, Args)]
pub struct ExecArgs {
    /// Command string handed to the shell verbatim.
    pub command: String,

    #[arg(long, value_enum, default_value = "default")]
    pub shell: Shell,

    /// Capture the merged output and print it after the command exits.
    #[arg(long)]
    pub capture: bool,

    /// Echo each non-blank output line as it arrives.
    #[arg(long)]
    pub display: bool,

    /// Start the command and return without waiting for it.
    #[arg(long, conflicts_with_all = ["capture", "display"])]
    pub detach: bool,
}

#[derive(Debug, Clone, Args)]
pub struct BatchArgs {
    /// Command strings; each becomes one task.
    #[arg(required = true)]
    pub commands: Vec<String>,

    /// At most this many commands at once; overrides `[config].max_parallel`.
    #[arg(long, value_name = "N")]
    pub max_parallel: Option<usize>,

    #[arg(long, value_enum, default_value = "default")]
    pub shell: Shell,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_batch_with_global_flags_after_subcommand() {
        let args = CliArgs::try_parse_from([
            "repairkit",
            "batch",
            "echo a",
            "echo b",
            "--max-parallel",
            "2",
            "--config",
            "other.toml",
        ])
        .unwrap();
        assert_eq!(args.config, "other.toml");
        match args.command {
            Command::Batch(b) => {
                assert_eq!(b.commands, ["echo a", "echo b"]);
                assert_eq!(b.max_parallel, Some(2));
                assert_eq!(b.shell, Shell::Default);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn detach_conflicts_with_capture() {
        let res = CliArgs::try_parse_from(["repairkit", "exec", "true", "--detach", "--capture"]);
        assert!(res.is_err());
    }

    #[test]
    fn update_dry_run_flag() {
        let args = CliArgs::try_parse_from(["repairkit", "update", "--dry-run"]).unwrap();
        assert!(matches!(args.command, Command::Update { dry_run: true }));
    }
}
