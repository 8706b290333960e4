// tests/scheduler_retention.rs

use std::error::Error;
use std::time::Duration;

use taskpace::engine::{DelayPolicy, Priority, Scheduler, SchedulerConfig, TaskSpec, TaskState};
use taskpace::errors::SchedulerError;
use taskpace_test_utils::init_tracing;
use taskpace_test_utils::probes::ExecutionLog;

type TestResult = Result<(), Box<dyn Error>>;

fn scheduler_with(delay: DelayPolicy, retention: Option<Duration>) -> Scheduler {
    Scheduler::new(SchedulerConfig { delay, retention })
}

#[tokio::test(start_paused = true)]
async fn completed_status_is_stable_until_retention_expires() -> TestResult {
    init_tracing();
    let scheduler = scheduler_with(DelayPolicy::immediate(), Some(Duration::from_secs(30)));
    let log = ExecutionLog::new();

    let id = scheduler.admit(TaskSpec::new("sync", Priority::Normal).with_payload(log.payload("sync")))?;
    scheduler.wait_idle().await;

    for _ in 0..3 {
        assert_eq!(scheduler.status(id)?, TaskState::Completed);
    }

    tokio::time::sleep(Duration::from_secs(29)).await;
    assert_eq!(scheduler.status(id)?, TaskState::Completed);
    assert_eq!(scheduler.report(id)?.value.as_deref(), Some("sync"));

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(matches!(scheduler.status(id), Err(SchedulerError::TaskNotFound(_))));
    assert!(matches!(scheduler.report(id), Err(SchedulerError::TaskNotFound(_))));

    // Expired ids stay dead; a new admission gets a fresh id.
    let next = scheduler.admit(TaskSpec::new("sync", Priority::Normal).with_payload(log.payload("sync")))?;
    assert!(next > id);
    assert!(scheduler.status(id).is_err());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn waiting_and_running_tasks_never_expire() -> TestResult {
    init_tracing();
    let scheduler = scheduler_with(
        DelayPolicy::new(Duration::from_secs(10), Duration::from_secs(60)),
        Some(Duration::from_secs(1)),
    );
    let log = ExecutionLog::new();

    let first = scheduler.admit(TaskSpec::new("first", Priority::Urgent).with_payload(log.payload("first")))?;
    let second = scheduler.admit(TaskSpec::new("second", Priority::Normal).with_payload(log.payload("second")))?;

    // `first` is sitting in its 10s pre-execution delay, `second` is queued.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(scheduler.status(first)?, TaskState::Running);
    assert_eq!(scheduler.status(second)?, TaskState::Pending);

    // `first` finished at t=10s and expired at t=11s; `second` is in its delay.
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert!(scheduler.status(first).is_err());
    assert_eq!(scheduler.status(second)?, TaskState::Running);

    scheduler.wait_idle().await;
    assert_eq!(scheduler.status(second)?, TaskState::Completed);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn no_retention_window_keeps_records_forever() -> TestResult {
    init_tracing();
    let scheduler = scheduler_with(DelayPolicy::immediate(), None);
    let log = ExecutionLog::new();

    let id = scheduler.admit(TaskSpec::new("backup", Priority::Normal).with_payload(log.payload("backup")))?;
    scheduler.wait_idle().await;

    tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
    assert_eq!(scheduler.status(id)?, TaskState::Completed);
    Ok(())
}
