// src/tasks/executor.rs

//! Fan-out / join of a task batch.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::tasks::{BatchReport, TaskBatch, TaskFailure, TaskName, TaskOutcome, TaskRecord, Work};

/// Runs batches of independent tasks and waits for all of them.
///
/// Blocking tasks go to tokio's blocking pool, which grows on demand like
/// a cached thread pool; async tasks run on the worker threads. Clones
/// share the same parallelism limit.
///
/// There is no timeout and no cancellation: a task that never finishes
/// keeps its batch, and the caller awaiting it, waiting forever.
#[derive(Debug, Clone, Default)]
pub struct TaskExecutor {
    limit: Option<Arc<Semaphore>>,
    max_parallel: Option<usize>,
}

impl TaskExecutor {
    /// Executor without a parallelism limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Executor running at most `max_parallel` tasks at once; `0` means
    /// unbounded.
    pub fn bounded(max_parallel: usize) -> Self {
        if max_parallel == 0 {
            return Self::new();
        }
        Self {
            limit: Some(Arc::new(Semaphore::new(max_parallel))),
            max_parallel: Some(max_parallel),
        }
    }

    pub fn max_parallel(&self) -> Option<usize> {
        self.max_parallel
    }

    /// Run every task in `tasks` and return once all have finished.
    ///
    /// Errors and panics are caught per task, logged, and recorded in the
    /// returned report; they never abort siblings and never propagate.
    pub async fn execute_tasks(&self, tasks: TaskBatch) -> BatchReport {
        if tasks.is_empty() {
            debug!("empty task batch; nothing to run");
            return BatchReport::default();
        }

        let total = tasks.len();
        info!(tasks = total, max_parallel = ?self.max_parallel, "executing task batch");

        let mut names: Vec<TaskName> = Vec::with_capacity(total);
        let mut outcomes: Vec<Option<TaskOutcome>> = vec![None; total];
        let mut index_of = HashMap::with_capacity(total);
        let mut set = JoinSet::new();

        for (index, task) in tasks.into_iter().enumerate() {
            let (name, work) = task.into_parts();
            names.push(name.clone());
            let handle = set.spawn(run_work(name, work, self.limit.clone()));
            index_of.insert(handle.id(), index);
        }

        while let Some(joined) = set.join_next_with_id().await {
            let (id, outcome) = match joined {
                Ok((id, outcome)) => (id, outcome),
                Err(err) => (err.id(), TaskOutcome::Failed(TaskFailure::from_join_error(err))),
            };

            let Some(&index) = index_of.get(&id) else {
                warn!(?id, "joined a task that was not part of this batch");
                continue;
            };

            if let TaskOutcome::Failed(failure) = &outcome {
                warn!(task = %names[index], error = %failure, "task failed");
            }
            outcomes[index] = Some(outcome);
        }

        let records: Vec<TaskRecord> = names
            .into_iter()
            .zip(outcomes)
            .map(|(name, outcome)| TaskRecord {
                name,
                outcome: outcome.unwrap_or_else(|| {
                    TaskOutcome::Failed(TaskFailure::Error("task never reported back".into()))
                }),
            })
            .collect();

        let report = BatchReport { records };
        info!(
            tasks = total,
            succeeded = report.succeeded(),
            failed = total - report.succeeded(),
            "task batch finished"
        );
        report
    }
}

async fn run_work(name: TaskName, work: Work, limit: Option<Arc<Semaphore>>) -> TaskOutcome {
    // The semaphore is never closed, so acquiring only waits.
    let _permit = match limit {
        Some(sem) => sem.acquire_owned().await.ok(),
        None => None,
    };

    debug!(task = %name, "task started");

    let result = match work {
        Work::Blocking(f) => match tokio::task::spawn_blocking(f).await {
            Ok(res) => res.map_err(TaskFailure::from_error),
            Err(join_err) => Err(TaskFailure::from_join_error(join_err)),
        },
        Work::Async(fut) => fut.await.map_err(TaskFailure::from_error),
    };

    debug!(task = %name, ok = result.is_ok(), "task finished");

    match result {
        Ok(()) => TaskOutcome::Succeeded,
        Err(failure) => TaskOutcome::Failed(failure),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::tasks::Task;

    #[tokio::test]
    async fn empty_batch_returns_empty_report() {
        let report = TaskExecutor::new().execute_tasks(Vec::new()).await;
        assert!(report.is_empty());
        assert!(report.all_succeeded());
    }

    #[tokio::test]
    async fn report_keeps_submission_order() {
        let tasks = vec![
            Task::from_future("slow", async {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                Ok(())
            }),
            Task::blocking("fast", || Ok(())),
        ];
        let report = TaskExecutor::new().execute_tasks(tasks).await;
        let names: Vec<_> = report.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["slow", "fast"]);
    }

    #[tokio::test]
    async fn zero_bound_means_unbounded() {
        let exec = TaskExecutor::bounded(0);
        assert_eq!(exec.max_parallel(), None);

        let counter = Arc::new(AtomicUsize::new(0));
        let tasks = (0..4)
            .map(|i| {
                let counter = Arc::clone(&counter);
                Task::blocking(format!("t{i}"), move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            })
            .collect();
        exec.execute_tasks(tasks).await;
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }
}
