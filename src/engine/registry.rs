// src/engine/registry.rs

//! Bookkeeping for every task the scheduler knows about.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::{Priority, TaskId, TaskState};
use crate::exec::Payload;

/// Everything the scheduler remembers about one task.
#[derive(Debug)]
pub struct TaskRecord {
    pub name: String,
    pub priority: Priority,
    pub state: TaskState,
    pub admitted_at: Instant,
    /// Set when the task reaches a terminal state.
    pub finished_at: Option<Instant>,
    /// Value produced by a completed payload.
    pub value: Option<String>,
    /// Cause recorded for a failed payload.
    pub error: Option<String>,
    /// Taken by the drain loop when the task starts running.
    pub(crate) payload: Option<Payload>,
}

impl TaskRecord {
    pub fn new(name: String, priority: Priority, payload: Payload, now: Instant) -> Self {
        Self {
            name,
            priority,
            state: TaskState::Pending,
            admitted_at: now,
            finished_at: None,
            value: None,
            error: None,
            payload: Some(payload),
        }
    }

    pub fn report(&self, id: TaskId) -> TaskReport {
        TaskReport {
            id,
            name: self.name.clone(),
            priority: self.priority,
            state: self.state,
            value: self.value.clone(),
            error: self.error.clone(),
        }
    }
}

/// Read-only snapshot of a task record, safe to hand out to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub id: TaskId,
    pub name: String,
    pub priority: Priority,
    pub state: TaskState,
    pub value: Option<String>,
    pub error: Option<String>,
}

/// Map of task records with a retention window for terminal ones.
///
/// Pending and running records never expire. A terminal record becomes
/// invisible once `retention` has elapsed since it finished, and is dropped
/// from memory on the next [`Registry::purge_expired`].
#[derive(Debug)]
pub struct Registry {
    records: HashMap<TaskId, TaskRecord>,
    retention: Option<Duration>,
}

impl Registry {
    /// `retention = None` keeps terminal records forever.
    pub fn new(retention: Option<Duration>) -> Self {
        Self {
            records: HashMap::new(),
            retention,
        }
    }

    pub fn insert(&mut self, id: TaskId, record: TaskRecord) {
        self.records.insert(id, record);
    }

    /// Look up a record that is still within its retention window.
    pub fn get(&self, id: TaskId, now: Instant) -> Option<&TaskRecord> {
        self.records
            .get(&id)
            .filter(|record| !self.is_expired(record, now))
    }

    /// Mutable lookup, subject to the same retention rule as [`Registry::get`].
    pub fn get_mut(&mut self, id: TaskId, now: Instant) -> Option<&mut TaskRecord> {
        let retention = self.retention;
        self.records
            .get_mut(&id)
            .filter(|record| !expired(record, retention, now))
    }

    /// Drop every terminal record whose retention window has elapsed.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let retention = self.retention;
        let before = self.records.len();
        self.records
            .retain(|_, record| !expired(record, retention, now));
        let purged = before - self.records.len();
        if purged > 0 {
            debug!(purged, remaining = self.records.len(), "purged expired task records");
        }
        purged
    }

    fn is_expired(&self, record: &TaskRecord, now: Instant) -> bool {
        expired(record, self.retention, now)
    }
}

fn expired(record: &TaskRecord, retention: Option<Duration>, now: Instant) -> bool {
    match (record.finished_at, retention) {
        (Some(finished), Some(window)) => now.saturating_duration_since(finished) >= window,
        _ => false,
    }
}
