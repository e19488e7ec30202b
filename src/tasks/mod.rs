// src/tasks/mod.rs

//! Batches of independent tasks with a completion barrier.
//!
//! A [`Task`] is a named, zero-argument unit of work with side effects
//! only. It is either a blocking closure (registry writes, synchronous
//! tool runs) or a future (process invocations). The [`TaskExecutor`] runs
//! a whole batch in parallel and returns once every task has finished,
//! with a [`BatchReport`] describing each outcome.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tokio::task::JoinError;

use crate::exec::{self, ProcessInvocation};

pub mod executor;

pub use executor::TaskExecutor;

/// Canonical task name type.
pub type TaskName = String;

/// Tasks submitted and awaited together, in submission order.
pub type TaskBatch = Vec<Task>;

type BlockingWork = Box<dyn FnOnce() -> anyhow::Result<()> + Send + 'static>;
type AsyncWork = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;

pub(crate) enum Work {
    Blocking(BlockingWork),
    Async(AsyncWork),
}

pub struct Task {
    name: TaskName,
    work: Work,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.work {
            Work::Blocking(_) => "blocking",
            Work::Async(_) => "async",
        };
        f.debug_struct("Task")
            .field("name", &self.name)
            .field("kind", &kind)
            .finish()
    }
}

impl Task {
    /// A task that runs on the blocking thread pool.
    pub fn blocking<F>(name: impl Into<TaskName>, f: F) -> Self
    where
        F: FnOnce() -> anyhow::Result<()> + Send + 'static,
    {
        Self {
            name: name.into(),
            work: Work::Blocking(Box::new(f)),
        }
    }

    /// A task driven as a future on the async worker pool.
    pub fn from_future<Fut>(name: impl Into<TaskName>, fut: Fut) -> Self
    where
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            name: name.into(),
            work: Work::Async(Box::pin(fut)),
        }
    }

    /// Run one command to completion; a non-zero exit fails the task.
    pub fn command(invocation: ProcessInvocation) -> Self {
        let name = invocation.command.clone();
        Self::from_future(name, async move {
            let status = exec::run_command(&invocation).await;
            if status.success() {
                Ok(())
            } else {
                Err(anyhow::anyhow!("`{}` {}", invocation.command, status))
            }
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn into_parts(self) -> (TaskName, Work) {
        (self.name, self.work)
    }
}

/// How a task failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFailure {
    /// The task returned an error.
    Error(String),
    /// The task panicked.
    Panicked(String),
}

impl TaskFailure {
    pub(crate) fn from_error(err: anyhow::Error) -> Self {
        TaskFailure::Error(format!("{err:#}"))
    }

    pub(crate) fn from_join_error(err: JoinError) -> Self {
        if err.is_panic() {
            TaskFailure::Panicked(panic_message(err.into_panic()))
        } else {
            TaskFailure::Error(err.to_string())
        }
    }
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskFailure::Error(msg) => write!(f, "{msg}"),
            TaskFailure::Panicked(msg) => write!(f, "panicked: {msg}"),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Succeeded,
    Failed(TaskFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub name: TaskName,
    pub outcome: TaskOutcome,
}

/// Per-task outcomes of one batch, in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub records: Vec<TaskRecord>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome == TaskOutcome::Succeeded)
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &TaskFailure)> + '_ {
        self.records.iter().filter_map(|r| match &r.outcome {
            TaskOutcome::Failed(f) => Some((r.name.as_str(), f)),
            TaskOutcome::Succeeded => None,
        })
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures().next().is_none()
    }
}
