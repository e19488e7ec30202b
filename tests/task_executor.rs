// tests/task_executor.rs

mod common;
use crate::common::{init_tracing, with_timeout};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use repairkit::tasks::{Task, TaskExecutor, TaskFailure, TaskOutcome};

fn counting_tasks(n: usize, counter: &Arc<AtomicUsize>) -> Vec<Task> {
    (0..n)
        .map(|i| {
            let counter = Arc::clone(counter);
            Task::blocking(format!("task_{i}"), move || {
                std::thread::sleep(Duration::from_millis(5));
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        })
        .collect()
}

#[tokio::test]
async fn every_task_runs_before_execute_returns() {
    init_tracing();

    let counter = Arc::new(AtomicUsize::new(0));
    let report = with_timeout(TaskExecutor::new().execute_tasks(counting_tasks(16, &counter))).await;

    assert_eq!(counter.load(Ordering::SeqCst), 16);
    assert_eq!(report.len(), 16);
    assert!(report.all_succeeded());
}

fn recording_tasks(ran: &Arc<Mutex<Vec<usize>>>, special: usize, task: Task) -> Vec<Task> {
    let mut task = Some(task);
    (0..5)
        .map(|i| {
            if i == special {
                return task.take().unwrap();
            }
            let ran = Arc::clone(ran);
            Task::blocking(format!("task_{i}"), move || {
                ran.lock().unwrap().push(i);
                Ok(())
            })
        })
        .collect()
}

fn sorted(ran: &Arc<Mutex<Vec<usize>>>) -> Vec<usize> {
    let mut v = ran.lock().unwrap().clone();
    v.sort();
    v
}

#[tokio::test]
async fn failing_task_does_not_stop_siblings() {
    init_tracing();

    let ran = Arc::new(Mutex::new(Vec::new()));
    let failing = Task::blocking("task_2", || Err(anyhow::anyhow!("registry key not found")));
    let report = with_timeout(TaskExecutor::new().execute_tasks(recording_tasks(&ran, 2, failing))).await;

    assert_eq!(sorted(&ran), vec![0, 1, 3, 4]);
    assert_eq!(report.succeeded(), 4);

    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, "task_2");
    assert!(matches!(failures[0].1, TaskFailure::Error(msg) if msg.contains("registry key")));
}

fn always() -> bool {
    true
}

#[tokio::test]
async fn panicking_task_is_reported_not_propagated() {
    init_tracing();

    let ran = Arc::new(Mutex::new(Vec::new()));
    let panicking = Task::from_future("task_2", async {
        if always() {
            panic!("boom");
        }
        Ok(())
    });
    let report = with_timeout(TaskExecutor::new().execute_tasks(recording_tasks(&ran, 2, panicking))).await;

    assert_eq!(sorted(&ran), vec![0, 1, 3, 4]);
    assert!(matches!(
        &report.records[2].outcome,
        TaskOutcome::Failed(TaskFailure::Panicked(msg)) if msg.contains("boom")
    ));
}

#[tokio::test]
async fn back_to_back_batches_on_one_executor() {
    init_tracing();

    let executor = TaskExecutor::new();
    let counter = Arc::new(AtomicUsize::new(0));

    let first = with_timeout(executor.execute_tasks(counting_tasks(3, &counter))).await;
    assert_eq!(counter.load(Ordering::SeqCst), 3);

    let second = with_timeout(executor.execute_tasks(counting_tasks(4, &counter))).await;
    assert_eq!(counter.load(Ordering::SeqCst), 7);

    assert!(first.all_succeeded() && second.all_succeeded());
}

#[tokio::test]
async fn max_parallel_one_never_overlaps() {
    init_tracing();

    let running = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let tasks = (0..6)
        .map(|i| {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            Task::from_future(format!("task_{i}"), async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                running.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            })
        })
        .collect();

    let report = with_timeout(TaskExecutor::bounded(1).execute_tasks(tasks)).await;

    assert_eq!(report.len(), 6);
    assert_eq!(peak.load(Ordering::SeqCst), 1);
}

#[cfg(unix)]
#[tokio::test]
async fn command_task_fails_on_non_zero_exit() {
    use repairkit::exec::ProcessInvocation;

    init_tracing();

    let tasks = vec![
        Task::command(ProcessInvocation::new("true")),
        Task::command(ProcessInvocation::new("exit 4")),
    ];
    let report = with_timeout(TaskExecutor::new().execute_tasks(tasks)).await;

    assert_eq!(report.records[0].outcome, TaskOutcome::Succeeded);
    assert!(matches!(
        &report.records[1].outcome,
        TaskOutcome::Failed(TaskFailure::Error(msg)) if msg.contains("exit 4")
    ));
}
