// src/engine/core.rs

//! Pure core scheduler state machine.
//!
//! `CoreState` owns the backlog, the task registry, the id counter and the
//! "drain loop active" flag. Every method is synchronous and deterministic
//! given the `now` it is handed; the caller (`engine::scheduler`) holds the
//! lock, supplies the clock, publishes the returned [`Transition`]s and
//! spawns/awaits the actual work.
//!
//! Keeping loop activation in here, under the same lock as the backlog, is
//! what guarantees a single drain loop: `admit` only asks for a new loop when
//! `draining` was false, and `start_next` clears the flag in the same critical
//! section that observes the empty backlog.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, warn};

use super::backlog::Backlog;
use super::registry::{Registry, TaskRecord, TaskReport};
use super::scheduler::TaskSpec;
use super::{Priority, TaskId, TaskOutcome, TaskState};
use crate::errors::AdmissionError;
use crate::exec::Payload;

/// A state change that should be published on the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub id: TaskId,
    pub name: String,
    pub state: TaskState,
}

/// Result of a successful admission.
#[derive(Debug)]
pub struct Admitted {
    pub id: TaskId,
    pub transition: Transition,
    /// True if no drain loop was active; the caller must start one.
    pub start_drain: bool,
}

/// A task handed to the drain loop, already marked `Running`.
#[derive(Debug)]
pub struct StartedTask {
    pub id: TaskId,
    pub name: String,
    pub priority: Priority,
    pub payload: Payload,
    pub transition: Transition,
}

#[derive(Debug)]
pub struct CoreState {
    backlog: Backlog,
    registry: Registry,
    next_id: u64,
    draining: bool,
}

impl CoreState {
    pub fn new(retention: Option<Duration>) -> Self {
        Self {
            backlog: Backlog::new(),
            registry: Registry::new(retention),
            next_id: 0,
            draining: false,
        }
    }

    pub fn backlog_len(&self) -> usize {
        self.backlog.len()
    }

    /// Whether a drain loop is currently active.
    pub fn is_draining(&self) -> bool {
        self.draining
    }

    /// Waiting task ids in dequeue order.
    pub fn pending_ids(&self) -> Vec<TaskId> {
        self.backlog.iter().collect()
    }

    /// Validate a spec, allocate an id and queue the task.
    ///
    /// On error nothing changes: no id is consumed and the backlog is
    /// untouched.
    pub fn admit(&mut self, spec: TaskSpec, now: Instant) -> Result<Admitted, AdmissionError> {
        let TaskSpec {
            name,
            priority,
            payload,
        } = spec;

        if name.trim().is_empty() {
            return Err(AdmissionError::EmptyName);
        }
        let payload = payload.ok_or_else(|| AdmissionError::MissingPayload(name.clone()))?;

        self.registry.purge_expired(now);

        self.next_id += 1;
        let id = TaskId::new(self.next_id);

        self.registry
            .insert(id, TaskRecord::new(name.clone(), priority, payload, now));
        self.backlog.push(id, priority);

        let start_drain = !self.draining;
        self.draining = true;

        debug!(%id, task = %name, %priority, start_drain, "task admitted");

        Ok(Admitted {
            id,
            transition: Transition {
                id,
                name,
                state: TaskState::Pending,
            },
            start_drain,
        })
    }

    /// Cancel a task that has not started yet.
    ///
    /// Returns `None` for running, terminal, expired or unknown tasks.
    pub fn cancel(&mut self, id: TaskId, now: Instant) -> Option<Transition> {
        let record = self.registry.get_mut(id, now)?;
        if record.state != TaskState::Pending {
            debug!(%id, state = %record.state, "cancel ignored; task is not pending");
            return None;
        }

        if !self.backlog.remove(id, record.priority) {
            warn!(%id, task = %record.name, "pending task was not in the backlog");
            return None;
        }

        record.state = TaskState::Cancelled;
        record.finished_at = Some(now);
        record.payload = None;

        Some(Transition {
            id,
            name: record.name.clone(),
            state: TaskState::Cancelled,
        })
    }

    pub fn status(&self, id: TaskId, now: Instant) -> Option<TaskState> {
        self.registry.get(id, now).map(|record| record.state)
    }

    pub fn report(&self, id: TaskId, now: Instant) -> Option<TaskReport> {
        self.registry.get(id, now).map(|record| record.report(id))
    }

    /// Pop the next task and mark it `Running`.
    ///
    /// Returns `None` once the backlog is empty, and in the same step marks
    /// the drain loop inactive so the next `admit` starts a fresh one.
    pub fn start_next(&mut self, now: Instant) -> Option<StartedTask> {
        loop {
            let Some((id, priority)) = self.backlog.pop_next() else {
                self.draining = false;
                debug!("backlog empty; drain loop going idle");
                return None;
            };

            let Some(record) = self.registry.get_mut(id, now) else {
                error!(%id, "queued task missing from registry; skipping");
                continue;
            };

            let Some(payload) = record.payload.take() else {
                error!(%id, task = %record.name, "queued task has no payload; skipping");
                continue;
            };

            record.state = TaskState::Running;

            return Some(StartedTask {
                id,
                name: record.name.clone(),
                priority,
                payload,
                transition: Transition {
                    id,
                    name: record.name.clone(),
                    state: TaskState::Running,
                },
            });
        }
    }

    /// Record the outcome of a running task.
    ///
    /// Returns `None` if the task was not `Running`, which would mean the
    /// core's own bookkeeping is broken.
    pub fn finish(&mut self, id: TaskId, outcome: TaskOutcome, now: Instant) -> Option<Transition> {
        let Some(record) = self.registry.get_mut(id, now) else {
            error!(%id, "finished task missing from registry");
            return None;
        };

        if record.state != TaskState::Running {
            error!(%id, state = %record.state, "finished task was not running");
            return None;
        }

        let state = match outcome {
            TaskOutcome::Completed(value) => {
                record.value = Some(value);
                TaskState::Completed
            }
            TaskOutcome::Failed(cause) => {
                record.error = Some(cause);
                TaskState::Failed
            }
        };
        record.state = state;
        record.finished_at = Some(now);

        let transition = Transition {
            id,
            name: record.name.clone(),
            state,
        };

        self.registry.purge_expired(now);

        Some(transition)
    }
}
