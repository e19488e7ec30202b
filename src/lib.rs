// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod notify;
pub mod plan;
pub mod tasks;
pub mod types;
pub mod update;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cli::{BatchArgs, CliArgs, Command, ExecArgs};
use crate::config::load_or_default;
use crate::config::model::ConfigFile;
use crate::exec::ProcessInvocation;
use crate::notify::{LogNotifier, LogProgress};
use crate::plan::{Plan, PlanRunner};
use crate::tasks::{Task, TaskExecutor};
use crate::update::{ExclusionSet, UpdateSequencer, WinGetManager};

/// High-level entry point used by `main.rs`.
///
/// Loads the config (defaults when the default path is missing) and
/// dispatches the subcommand. Only CLI and config problems come back as
/// errors; command and task failures are reported on stdout and in the log.
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_or_default(&args.config)
        .with_context(|| format!("failed to load config '{}'", args.config))?;
    debug!(config = %args.config, steps = cfg.steps().len(), "configuration loaded");

    match args.command {
        Command::Exec(exec_args) => run_exec(exec_args).await,
        Command::Batch(batch_args) => run_batch(&cfg, batch_args).await,
        Command::Update { dry_run } => run_update(&cfg, dry_run).await,
        Command::Plan { dry_run } => run_plan(&cfg, dry_run).await,
    }
}

async fn run_exec(args: ExecArgs) -> Result<()> {
    let invocation = ProcessInvocation::new(args.command)
        .with_shell(args.shell)
        .with_display(args.display);

    if args.detach {
        let handle = exec::spawn_command(invocation.detached());
        println!("started: {}", handle.command());
        return Ok(());
    }

    let status = if args.capture {
        let result = exec::command_output(&invocation).await;
        for line in result.output.lines() {
            println!("{line}");
        }
        result.status
    } else {
        exec::run_command(&invocation).await
    };

    if status.success() {
        info!(command = %invocation.command, %status, "command finished");
    } else {
        warn!(command = %invocation.command, %status, "command failed");
    }
    println!("{status}");
    Ok(())
}

async fn run_batch(cfg: &ConfigFile, args: BatchArgs) -> Result<()> {
    let executor = match args.max_parallel {
        Some(n) => TaskExecutor::bounded(n),
        None => cfg.executor(),
    };

    let tasks = args
        .commands
        .into_iter()
        .map(|c| Task::command(ProcessInvocation::new(c).with_shell(args.shell)))
        .collect();

    let report = executor.execute_tasks(tasks).await;

    println!("{}/{} tasks succeeded", report.succeeded(), report.len());
    for (name, failure) in report.failures() {
        println!("  failed: {name}: {failure}");
    }
    Ok(())
}

async fn run_update(cfg: &ConfigFile, dry_run: bool) -> Result<()> {
    let exclusions = cfg.exclusion_set().context("invalid [updates].exclude")?;
    let classifier = cfg.classifier().context("invalid [updates] classifier settings")?;
    let manager = WinGetManager::new(classifier);
    let sequencer = UpdateSequencer::new(manager, LogNotifier, cfg.update_options());

    if dry_run {
        let preview = sequencer.preview(&exclusions).await;
        print_update_preview(&exclusions, &preview.partition.remaining, &preview.partition.excluded);
        return Ok(());
    }

    let report = sequencer.run(&exclusions).await;
    for (id, outcome) in report.ledger.entries() {
        println!("  {id}: {outcome:?}");
    }
    println!("{}", report.summary.message());
    Ok(())
}

async fn run_plan(cfg: &ConfigFile, dry_run: bool) -> Result<()> {
    let plan = Plan::from_config(cfg).context("failed to build maintenance plan")?;

    if dry_run {
        print_dry_run(cfg, &plan);
        return Ok(());
    }

    if plan.is_empty() {
        println!("no [step.*] sections configured; nothing to run");
        return Ok(());
    }

    let runner = PlanRunner::new(cfg.executor(), Arc::new(LogProgress));
    let report = runner.run(&plan).await;

    for step in &report.steps {
        let mark = if step.succeeded() { "ok" } else { "FAILED" };
        println!("  [{mark}] {} (wave {})", step.name, step.wave);
        for cmd in step.commands.iter().filter(|c| c.failed()) {
            if let Some(status) = &cmd.status {
                println!("      {}: {status}", cmd.command);
            }
        }
    }
    let failed = report.failed_steps().count();
    println!("{} step(s) run, {failed} failed", report.steps.len());
    Ok(())
}

fn print_update_preview(exclusions: &ExclusionSet, remaining: &[String], excluded: &[String]) {
    println!("repairkit update dry-run");
    println!("  exclude patterns: {:?}", exclusions.patterns());
    println!();

    println!("would upgrade ({}):", remaining.len());
    for id in remaining {
        println!("  - {id}");
    }
    println!("excluded ({}):", excluded.len());
    for id in excluded {
        println!("  - {id}");
    }

    debug!("dry-run complete (no upgrades)");
}

/// Simple dry-run output: print waves, steps and commands.
fn print_dry_run(cfg: &ConfigFile, plan: &Plan) {
    println!("repairkit plan dry-run");
    println!("  config.max_parallel = {}", cfg.settings().max_parallel);
    println!();

    println!("steps ({}):", plan.len());
    for (wave, names) in plan.waves().iter().enumerate() {
        println!("  wave {wave}:");
        for step in names.iter().filter_map(|n| plan.step(n)) {
            println!("    - {}", step.name);
            for cmd in &step.commands {
                println!("        run: {cmd}");
            }
            if !step.after.is_empty() {
                println!("        after: {:?}", step.after);
            }
            if step.shell != types::Shell::Default {
                println!("        shell: {:?}", step.shell);
            }
            if step.detach {
                println!("        detach: true");
            }
        }
    }

    debug!("dry-run complete (no execution)");
}
