// src/engine/scheduler.rs

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::core::{CoreState, StartedTask, Transition};
use super::delay::DelayPolicy;
use super::registry::TaskReport;
use super::{Priority, TaskEvent, TaskId, TaskOutcome, TaskState};
use crate::errors::{Result, SchedulerError};
use crate::exec::Payload;

/// Default window during which terminal task records stay queryable.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(5 * 60);

/// Runtime knobs for a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub delay: DelayPolicy,
    /// How long terminal records stay visible to `status`/`report`.
    /// `None` keeps them forever.
    pub retention: Option<Duration>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            delay: DelayPolicy::default(),
            retention: Some(DEFAULT_RETENTION),
        }
    }
}

/// What a caller hands to [`Scheduler::admit`].
#[derive(Debug)]
pub struct TaskSpec {
    pub name: String,
    pub priority: Priority,
    pub payload: Option<Payload>,
}

impl TaskSpec {
    /// A spec without a payload; attach one with [`TaskSpec::with_payload`].
    pub fn new(name: impl Into<String>, priority: Priority) -> Self {
        Self {
            name: name.into(),
            priority,
            payload: None,
        }
    }

    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Stream of task transitions, in the order they happened.
///
/// Every subscriber gets every transition published after it subscribed.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<TaskEvent>,
}

impl EventStream {
    pub async fn recv(&mut self) -> Option<TaskEvent> {
        self.rx.recv().await
    }

    /// Next already-published event, if any.
    pub fn try_recv(&mut self) -> Option<TaskEvent> {
        self.rx.try_recv().ok()
    }
}

/// State guarded by the scheduler lock.
struct Guarded {
    core: CoreState,
    subscribers: Vec<mpsc::UnboundedSender<TaskEvent>>,
}

impl Guarded {
    /// Publish while still holding the lock, so subscribers observe
    /// transitions in the order they were applied.
    fn publish(&mut self, transition: Transition) {
        let event = TaskEvent {
            id: transition.id,
            name: transition.name,
            state: transition.state,
            timestamp: Utc::now(),
        };
        debug!(id = %event.id, task = %event.name, state = %event.state, "task transition");
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

struct Shared {
    guarded: Mutex<Guarded>,
    delay: DelayPolicy,
    /// `true` while no drain loop is active.
    idle_tx: watch::Sender<bool>,
}

/// Priority-aware sequential task scheduler.
///
/// Cheap to clone; all clones share one backlog and one drain loop.
///
/// - `admit`, `cancel`, `status` and `report` only take a short lock around
///   the backlog and never wait for a payload.
/// - Payloads run one at a time on a drain loop spawned onto the current
///   Tokio runtime when the first task arrives, and which exits once the
///   backlog is empty. `admit` outside a Tokio runtime fails with
///   [`SchedulerError::RuntimeUnavailable`] and queues nothing.
#[derive(Clone)]
pub struct Scheduler {
    shared: Arc<Shared>,
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guarded = self.shared.guarded.lock();
        f.debug_struct("Scheduler")
            .field("core", &guarded.core)
            .field("delay", &self.shared.delay)
            .finish_non_exhaustive()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let (idle_tx, _) = watch::channel(true);
        Self {
            shared: Arc::new(Shared {
                guarded: Mutex::new(Guarded {
                    core: CoreState::new(config.retention),
                    subscribers: Vec::new(),
                }),
                delay: config.delay,
                idle_tx,
            }),
        }
    }

    /// Queue a task and return its id.
    ///
    /// Starts the drain loop if it is idle. Rejected specs leave the backlog
    /// unchanged.
    pub fn admit(&self, spec: TaskSpec) -> Result<TaskId> {
        // Resolved before the core is touched: a queued task with nowhere to
        // spawn the drain loop would never run.
        let runtime = Handle::try_current()?;

        let mut guarded = self.shared.guarded.lock();
        let admitted = guarded.core.admit(spec, Instant::now())?;
        guarded.publish(admitted.transition);

        if admitted.start_drain {
            self.shared.idle_tx.send_replace(false);
            runtime.spawn(drain_loop(Arc::clone(&self.shared)));
        }

        Ok(admitted.id)
    }

    /// Cancel a task that has not started running.
    ///
    /// Returns `false` (and changes nothing) if the task is running, already
    /// finished, or unknown.
    pub fn cancel(&self, id: TaskId) -> bool {
        let mut guarded = self.shared.guarded.lock();
        match guarded.core.cancel(id, Instant::now()) {
            Some(transition) => {
                info!(%id, task = %transition.name, "task cancelled");
                guarded.publish(transition);
                true
            }
            None => false,
        }
    }

    /// Current state of a task.
    ///
    /// Unknown ids and terminal tasks past the retention window yield
    /// [`SchedulerError::TaskNotFound`].
    pub fn status(&self, id: TaskId) -> Result<TaskState> {
        self.shared
            .guarded
            .lock()
            .core
            .status(id, Instant::now())
            .ok_or(SchedulerError::TaskNotFound(id))
    }

    /// Full snapshot of a task, including its value or failure cause.
    pub fn report(&self, id: TaskId) -> Result<TaskReport> {
        self.shared
            .guarded
            .lock()
            .core
            .report(id, Instant::now())
            .ok_or(SchedulerError::TaskNotFound(id))
    }

    pub fn backlog_len(&self) -> usize {
        self.shared.guarded.lock().core.backlog_len()
    }

    /// Pending task ids in the order they will run.
    pub fn pending(&self) -> Vec<TaskId> {
        self.shared.guarded.lock().core.pending_ids()
    }

    pub fn is_idle(&self) -> bool {
        *self.shared.idle_tx.borrow()
    }

    /// Resolve once no drain loop is active.
    pub async fn wait_idle(&self) {
        let mut rx = self.shared.idle_tx.subscribe();
        // The sender lives in `self.shared`, so the channel cannot close here.
        let _ = rx.wait_for(|idle| *idle).await;
    }

    /// Receive every transition from now on.
    pub fn subscribe(&self) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        self.shared.guarded.lock().subscribers.push(tx);
        EventStream { rx }
    }
}

/// The one drain loop of a scheduler.
///
/// Only spawned by `admit` when `CoreState` reports no loop is active, and
/// exits in the same critical section that finds the backlog empty.
async fn drain_loop(shared: Arc<Shared>) {
    debug!("drain loop started");

    loop {
        let started = {
            let mut guarded = shared.guarded.lock();
            match guarded.core.start_next(Instant::now()) {
                Some(started) => {
                    guarded.publish(started.transition.clone());
                    started
                }
                None => {
                    shared.idle_tx.send_replace(true);
                    break;
                }
            }
        };

        let StartedTask {
            id,
            name,
            priority,
            payload,
            ..
        } = started;

        let delay = shared.delay.for_priority(priority);
        info!(%id, task = %name, %priority, delay_ms = delay.as_millis() as u64, "running task");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let outcome = execute(id, &name, payload).await;

        {
            let mut guarded = shared.guarded.lock();
            match guarded.core.finish(id, outcome, Instant::now()) {
                Some(transition) => guarded.publish(transition),
                None => error!(%id, task = %name, "could not record task outcome"),
            }
        }
    }

    debug!("drain loop idle");
}

/// Invoke a payload on its own Tokio task and wait for it.
///
/// Running it as a separate task turns a panic into a failure outcome
/// instead of taking down the drain loop.
async fn execute(id: TaskId, name: &str, payload: Payload) -> TaskOutcome {
    let handle = tokio::spawn(async move { payload.invoke().await });

    match handle.await {
        Ok(Ok(value)) => {
            info!(%id, task = %name, "task completed");
            TaskOutcome::Completed(value)
        }
        Ok(Err(err)) => {
            warn!(%id, task = %name, error = %format!("{err:#}"), "task failed");
            TaskOutcome::Failed(format!("{err:#}"))
        }
        Err(join_err) if join_err.is_panic() => {
            warn!(%id, task = %name, "task payload panicked");
            TaskOutcome::Failed("payload panicked".to_string())
        }
        Err(join_err) => {
            warn!(%id, task = %name, error = %join_err, "task payload aborted");
            TaskOutcome::Failed(format!("payload aborted: {join_err}"))
        }
    }
}
