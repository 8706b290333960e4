// src/engine/mod.rs

//! Priority-aware sequential task scheduler.
//!
//! This module ties together:
//! - the backlog of pending tasks (urgent partition ahead of normal, FIFO
//!   within each)
//! - the registry of task records, including terminal ones kept for a
//!   retention window
//! - the delay policy applied before each task runs
//! - the drain loop that executes one payload at a time
//!
//! The pure core state machine lives in [`core`]; the async shell that owns
//! the lock, spawns the drain loop and publishes events is [`scheduler`].

use std::fmt;

use chrono::{DateTime, Utc};

pub use crate::types::{Priority, TaskState};

/// Opaque task identifier, allocated at admission and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a payload invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The payload returned a value.
    Completed(String),
    /// The payload returned an error or panicked; holds the cause.
    Failed(String),
}

/// A single state transition, as published on the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEvent {
    pub id: TaskId,
    pub name: String,
    pub state: TaskState,
    pub timestamp: DateTime<Utc>,
}

pub mod backlog;
pub mod core;
pub mod delay;
pub mod registry;
pub mod scheduler;

pub use backlog::Backlog;
pub use self::core::{CoreState, Transition};
pub use delay::DelayPolicy;
pub use registry::{Registry, TaskReport};
pub use scheduler::{EventStream, Scheduler, SchedulerConfig, TaskSpec};
