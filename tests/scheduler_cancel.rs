// tests/scheduler_cancel.rs

use std::error::Error;

use taskpace::engine::{Priority, TaskSpec, TaskState};
use taskpace::errors::SchedulerError;
use taskpace_test_utils::probes::{ExecutionLog, Gate};
use taskpace_test_utils::{immediate_scheduler, init_tracing, wait_for_state, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn cancelling_pending_task_prevents_it_from_running() -> TestResult {
    init_tracing();
    let scheduler = immediate_scheduler();
    let mut events = scheduler.subscribe();
    let log = ExecutionLog::new();
    let gate = Gate::new();

    let blocker = scheduler.admit(TaskSpec::new("blocker", Priority::Urgent).with_payload(gate.payload()))?;
    let victim = scheduler.admit(TaskSpec::new("victim", Priority::Normal).with_payload(log.payload("victim")))?;
    let survivor = scheduler.admit(TaskSpec::new("survivor", Priority::Normal).with_payload(log.payload("survivor")))?;

    wait_for_state(&mut events, blocker, TaskState::Running).await;

    assert!(scheduler.cancel(victim));
    assert_eq!(scheduler.status(victim)?, TaskState::Cancelled);
    assert_eq!(scheduler.pending(), vec![survivor]);

    gate.open();
    with_timeout(scheduler.wait_idle()).await;

    assert_eq!(log.entries(), vec!["survivor"]);
    assert_eq!(scheduler.status(victim)?, TaskState::Cancelled);
    Ok(())
}

#[tokio::test]
async fn cancelled_task_never_reports_running() -> TestResult {
    init_tracing();
    let scheduler = immediate_scheduler();
    let mut events = scheduler.subscribe();
    let log = ExecutionLog::new();

    let a = scheduler.admit(TaskSpec::new("a", Priority::Normal).with_payload(log.payload("a")))?;
    let b = scheduler.admit(TaskSpec::new("b", Priority::Normal).with_payload(log.payload("b")))?;
    assert!(scheduler.cancel(b));

    with_timeout(scheduler.wait_idle()).await;

    let mut b_states = Vec::new();
    while let Some(event) = events.try_recv() {
        if event.id == b {
            b_states.push(event.state);
        }
    }
    assert_eq!(b_states, vec![TaskState::Pending, TaskState::Cancelled]);
    assert_eq!(scheduler.status(a)?, TaskState::Completed);
    assert_eq!(log.entries(), vec!["a"]);
    Ok(())
}

#[tokio::test]
async fn running_task_cannot_be_cancelled() -> TestResult {
    init_tracing();
    let scheduler = immediate_scheduler();
    let mut events = scheduler.subscribe();
    let gate = Gate::new();

    let id = scheduler.admit(TaskSpec::new("install", Priority::Normal).with_payload(gate.payload()))?;
    wait_for_state(&mut events, id, TaskState::Running).await;

    assert!(!scheduler.cancel(id));
    assert_eq!(scheduler.status(id)?, TaskState::Running);

    gate.open();
    with_timeout(scheduler.wait_idle()).await;

    assert_eq!(scheduler.status(id)?, TaskState::Completed);
    Ok(())
}

#[tokio::test]
async fn terminal_tasks_cannot_be_cancelled() -> TestResult {
    init_tracing();
    let scheduler = immediate_scheduler();
    let log = ExecutionLog::new();

    let done = scheduler.admit(TaskSpec::new("done", Priority::Normal).with_payload(log.payload("done")))?;
    let dropped = scheduler.admit(TaskSpec::new("dropped", Priority::Normal).with_payload(log.payload("dropped")))?;
    assert!(scheduler.cancel(dropped));
    assert!(!scheduler.cancel(dropped), "second cancel must be a no-op");

    with_timeout(scheduler.wait_idle()).await;

    assert!(!scheduler.cancel(done));
    assert_eq!(scheduler.status(done)?, TaskState::Completed);
    assert_eq!(scheduler.status(dropped)?, TaskState::Cancelled);
    Ok(())
}

#[tokio::test]
async fn unknown_ids_are_not_found() -> TestResult {
    init_tracing();
    let scheduler = immediate_scheduler();
    let other = immediate_scheduler();
    let log = ExecutionLog::new();

    // Ids are only meaningful to the scheduler that issued them.
    let foreign = other.admit(TaskSpec::new("elsewhere", Priority::Normal).with_payload(log.payload("elsewhere")))?;

    assert!(!scheduler.cancel(foreign));
    assert!(matches!(
        scheduler.status(foreign),
        Err(SchedulerError::TaskNotFound(id)) if id == foreign
    ));
    assert!(scheduler.report(foreign).is_err());

    with_timeout(other.wait_idle()).await;
    Ok(())
}
