// src/plan/runner.rs

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::exec::{self, CommandStatus, Invoked};
use crate::notify::ProgressSink;
use crate::plan::graph::{Plan, PlanStep};
use crate::tasks::{BatchReport, Task, TaskExecutor};

/// What happened to one command of a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    pub command: String,
    /// `None` for detached commands, which are never waited on.
    pub status: Option<CommandStatus>,
}

impl CommandRecord {
    pub fn failed(&self) -> bool {
        matches!(&self.status, Some(status) if !status.success())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub name: String,
    pub wave: usize,
    pub commands: Vec<CommandRecord>,
}

impl StepReport {
    pub fn succeeded(&self) -> bool {
        !self.commands.iter().any(CommandRecord::failed)
    }
}

/// Outcome of a whole plan run, steps ordered by wave then name.
#[derive(Debug, Clone, Default)]
pub struct PlanReport {
    pub steps: Vec<StepReport>,
    pub batches: Vec<BatchReport>,
}

impl PlanReport {
    pub fn step(&self, name: &str) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.name == name)
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &StepReport> + '_ {
        self.steps.iter().filter(|s| !s.succeeded())
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed_steps().next().is_none() && self.batches.iter().all(|b| b.all_succeeded())
    }
}

/// Runs a [`Plan`] wave by wave on a [`TaskExecutor`].
pub struct PlanRunner {
    executor: TaskExecutor,
    progress: Arc<dyn ProgressSink>,
}

impl PlanRunner {
    pub fn new(executor: TaskExecutor, progress: Arc<dyn ProgressSink>) -> Self {
        Self { executor, progress }
    }

    /// Run every step. A failing command is recorded and the step carries
    /// on with its next command; later waves still run.
    pub async fn run(&self, plan: &Plan) -> PlanReport {
        let collected: Arc<Mutex<Vec<StepReport>>> = Arc::new(Mutex::new(Vec::new()));
        let mut batches = Vec::with_capacity(plan.waves().len());

        for (wave, names) in plan.waves().iter().enumerate() {
            info!(wave, steps = ?names, "starting wave");

            let tasks: Vec<Task> = names
                .iter()
                .filter_map(|name| plan.step(name))
                .map(|step| self.step_task(step.clone(), wave, Arc::clone(&collected)))
                .collect();

            let batch = self.executor.execute_tasks(tasks).await;
            if !batch.all_succeeded() {
                warn!(wave, failed = batch.len() - batch.succeeded(), "wave had failing steps");
            }
            batches.push(batch);
        }

        let mut steps = std::mem::take(&mut *collected.lock().await);
        let order: HashMap<&str, usize> = plan
            .waves()
            .iter()
            .flatten()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();
        steps.sort_by_key(|s| order.get(s.name.as_str()).copied().unwrap_or(usize::MAX));

        PlanReport { steps, batches }
    }

    fn step_task(
        &self,
        step: PlanStep,
        wave: usize,
        collected: Arc<Mutex<Vec<StepReport>>>,
    ) -> Task {
        let progress = Arc::clone(&self.progress);
        let name = step.name.clone();

        Task::from_future(name, async move {
            let mut commands = Vec::with_capacity(step.commands.len());

            for invocation in step.invocations() {
                let command = invocation.command.clone();
                let status = match exec::invoke(invocation).await {
                    Invoked::Finished(status) => {
                        if !status.success() {
                            warn!(step = %step.name, %command, %status, "step command failed");
                        }
                        Some(status)
                    }
                    Invoked::Detached(handle) => {
                        debug!(step = %step.name, command = handle.command(), "command detached");
                        None
                    }
                };
                commands.push(CommandRecord { command, status });
            }

            let report = StepReport {
                name: step.name.clone(),
                wave,
                commands,
            };
            let ok = report.succeeded();
            collected.lock().await.push(report);
            progress.step_completed(&step.name);

            if ok {
                Ok(())
            } else {
                Err(anyhow::anyhow!("step '{}' had failing commands", step.name))
            }
        })
    }
}
