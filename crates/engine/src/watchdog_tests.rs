use super::*;
use agentcheck_core::test_support::sample_task;
use agentcheck_core::{Clock, FakeClock, TaskStatus};
use agentcheck_storage::InMemoryTaskRepository;
use std::sync::Arc;

#[test]
fn force_fails_a_task_running_past_the_timeout() {
    let clock = Arc::new(FakeClock::default());
    let repo = InMemoryTaskRepository::new(clock.clone() as Arc<dyn Clock>);
    let mut task = sample_task("watchdog-stale");
    task.status = TaskStatus::Running;
    let task_id = task.task_id.clone();
    repo.create_task(task).expect("creates");

    clock.advance(120_000);
    let later = clock.now();
    let failed = watchdog_sweep(&repo, Duration::from_secs(60), later).expect("sweeps");

    assert_eq!(failed, vec![task_id.clone()]);
    let task = repo.get_task(&task_id).expect("queries").expect("exists");
    assert_eq!(task.status, TaskStatus::FailedSystem);
    assert!(task
        .last_gate_reason
        .expect("reason set")
        .starts_with("watchdog_timeout"));
}

#[test]
fn leaves_recently_updated_running_tasks_alone() {
    let clock = Arc::new(FakeClock::default());
    let repo = InMemoryTaskRepository::new(clock.clone() as Arc<dyn Clock>);
    let mut task = sample_task("watchdog-fresh");
    task.status = TaskStatus::Running;
    let task_id = task.task_id.clone();
    repo.create_task(task).expect("creates");

    clock.advance(5_000);
    let later = clock.now();
    let failed = watchdog_sweep(&repo, Duration::from_secs(60), later).expect("sweeps");

    assert!(failed.is_empty());
    let task = repo.get_task(&task_id).expect("queries").expect("exists");
    assert_eq!(task.status, TaskStatus::Running);
}

#[test]
fn ignores_tasks_not_in_running_status() {
    let clock = Arc::new(FakeClock::default());
    let repo = InMemoryTaskRepository::new(clock.clone() as Arc<dyn Clock>);
    let task = sample_task("watchdog-queued");
    repo.create_task(task).expect("creates");

    clock.advance(600_000);
    let later = clock.now();
    let failed = watchdog_sweep(&repo, Duration::from_secs(60), later).expect("sweeps");

    assert!(failed.is_empty());
}
