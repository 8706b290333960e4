// tests/scheduler_ordering.rs

use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

use taskpace::engine::{DelayPolicy, Priority, Scheduler, SchedulerConfig, TaskSpec, TaskState};
use taskpace::exec::Payload;
use taskpace_test_utils::probes::{ExecutionLog, Gate};
use taskpace_test_utils::{immediate_scheduler, init_tracing, wait_for_state, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn urgent_admitted_before_start_runs_first() -> TestResult {
    init_tracing();
    let scheduler = immediate_scheduler();
    let log = ExecutionLog::new();

    let sync = scheduler.admit(
        TaskSpec::new("Sync Contacts", Priority::Normal).with_payload(log.payload("Sync Contacts")),
    )?;
    let upload = scheduler.admit(
        TaskSpec::new("Upload Image", Priority::Urgent).with_payload(log.payload("Upload Image")),
    )?;

    with_timeout(scheduler.wait_idle()).await;

    assert_eq!(log.entries(), vec!["Upload Image", "Sync Contacts"]);
    assert_eq!(scheduler.status(upload)?, TaskState::Completed);
    assert_eq!(scheduler.status(sync)?, TaskState::Completed);
    Ok(())
}

#[tokio::test]
async fn same_priority_runs_in_admission_order() -> TestResult {
    init_tracing();
    let scheduler = immediate_scheduler();
    let log = ExecutionLog::new();

    for name in ["X", "Y", "Z"] {
        scheduler.admit(TaskSpec::new(name, Priority::Normal).with_payload(log.payload(name)))?;
    }

    with_timeout(scheduler.wait_idle()).await;

    assert_eq!(log.entries(), vec!["X", "Y", "Z"]);
    Ok(())
}

#[tokio::test]
async fn mixed_admissions_partition_by_priority() -> TestResult {
    init_tracing();
    let scheduler = immediate_scheduler();
    let log = ExecutionLog::new();

    let plan = [
        ("n1", Priority::Normal),
        ("u1", Priority::Urgent),
        ("n2", Priority::Normal),
        ("u2", Priority::Urgent),
        ("n3", Priority::Normal),
        ("u3", Priority::Urgent),
    ];
    for (name, priority) in plan {
        scheduler.admit(TaskSpec::new(name, priority).with_payload(log.payload(name)))?;
    }

    // Nothing has run yet, so the pending order is already fixed.
    assert_eq!(scheduler.backlog_len(), 6);

    with_timeout(scheduler.wait_idle()).await;

    assert_eq!(log.entries(), vec!["u1", "u2", "u3", "n1", "n2", "n3"]);
    Ok(())
}

#[tokio::test]
async fn urgent_admitted_while_running_jumps_waiting_normals() -> TestResult {
    init_tracing();
    let scheduler = immediate_scheduler();
    let mut events = scheduler.subscribe();
    let log = ExecutionLog::new();
    let gate = Gate::new();

    let first = scheduler.admit(TaskSpec::new("first", Priority::Normal).with_payload(gate.payload()))?;
    wait_for_state(&mut events, first, TaskState::Running).await;

    scheduler.admit(TaskSpec::new("backup", Priority::Normal).with_payload(log.payload("backup")))?;
    scheduler.admit(TaskSpec::new("upload", Priority::Urgent).with_payload(log.payload("upload")))?;

    // The running task is not preempted.
    assert_eq!(scheduler.status(first)?, TaskState::Running);

    gate.open();
    with_timeout(scheduler.wait_idle()).await;

    assert_eq!(scheduler.status(first)?, TaskState::Completed);
    assert_eq!(log.entries(), vec!["upload", "backup"]);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn delay_policy_paces_each_task_by_priority() -> TestResult {
    init_tracing();
    let scheduler = Scheduler::new(SchedulerConfig {
        delay: DelayPolicy::new(Duration::from_millis(1000), Duration::from_millis(5000)),
        retention: None,
    });

    let started_at = Instant::now();
    let ran_at: Arc<Mutex<Vec<(String, Duration)>>> = Arc::new(Mutex::new(Vec::new()));

    let stamp = |name: &'static str| {
        let ran_at = Arc::clone(&ran_at);
        Payload::from_fn(move || {
            ran_at
                .lock()
                .unwrap()
                .push((name.to_string(), started_at.elapsed()));
            Ok(String::new())
        })
    };

    scheduler.admit(TaskSpec::new("normal", Priority::Normal).with_payload(stamp("normal")))?;
    scheduler.admit(TaskSpec::new("urgent", Priority::Urgent).with_payload(stamp("urgent")))?;

    scheduler.wait_idle().await;

    let ran_at = ran_at.lock().unwrap().clone();
    assert_eq!(ran_at.len(), 2);

    let (first, first_at) = &ran_at[0];
    assert_eq!(first, "urgent");
    assert!(*first_at >= Duration::from_millis(1000));
    assert!(*first_at < Duration::from_millis(1100));

    let (second, second_at) = &ran_at[1];
    assert_eq!(second, "normal");
    assert!(*second_at >= Duration::from_millis(6000));
    assert!(*second_at < Duration::from_millis(6100));
    Ok(())
}

#[tokio::test]
async fn scheduler_restarts_after_going_idle() -> TestResult {
    init_tracing();
    let scheduler = immediate_scheduler();
    let log = ExecutionLog::new();

    assert!(scheduler.is_idle());

    let a = scheduler.admit(TaskSpec::new("A", Priority::Normal).with_payload(log.payload("A")))?;
    assert!(!scheduler.is_idle());
    with_timeout(scheduler.wait_idle()).await;
    assert!(scheduler.is_idle());

    let b = scheduler.admit(TaskSpec::new("B", Priority::Urgent).with_payload(log.payload("B")))?;
    with_timeout(scheduler.wait_idle()).await;

    assert!(b > a, "ids must keep increasing across idle periods");
    assert_eq!(scheduler.status(b)?, TaskState::Completed);
    assert_eq!(log.entries(), vec!["A", "B"]);
    Ok(())
}
