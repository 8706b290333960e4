// src/engine/backlog.rs

use std::collections::VecDeque;

use tracing::debug;

use super::{Priority, TaskId};

/// Ordered collection of tasks that have been admitted but not started.
///
/// Two FIFO lanes, one per priority class. `pop_next` always drains the
/// urgent lane first, which gives:
/// - every waiting urgent task runs before every waiting normal task
/// - tasks of the same priority run in admission order
///
/// Nothing bounds either lane, so a steady stream of urgent admissions can
/// starve the normal lane indefinitely.
#[derive(Debug, Default)]
pub struct Backlog {
    urgent: VecDeque<TaskId>,
    normal: VecDeque<TaskId>,
}

impl Backlog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.urgent.len() + self.normal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urgent.is_empty() && self.normal.is_empty()
    }

    /// Append a task to the back of its priority lane.
    pub fn push(&mut self, id: TaskId, priority: Priority) {
        self.lane_mut(priority).push_back(id);
        debug!(%id, %priority, backlog_len = self.len(), "task queued");
    }

    /// Remove and return the task that should run next.
    pub fn pop_next(&mut self) -> Option<(TaskId, Priority)> {
        if let Some(id) = self.urgent.pop_front() {
            return Some((id, Priority::Urgent));
        }
        self.normal.pop_front().map(|id| (id, Priority::Normal))
    }

    /// Remove a specific waiting task, keeping the order of the others.
    ///
    /// Returns `false` if the task is not in the backlog.
    pub fn remove(&mut self, id: TaskId, priority: Priority) -> bool {
        let lane = self.lane_mut(priority);
        match lane.iter().position(|queued| *queued == id) {
            Some(pos) => {
                lane.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Waiting tasks in the order they would be dequeued.
    pub fn iter(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.urgent.iter().chain(self.normal.iter()).copied()
    }

    fn lane_mut(&mut self, priority: Priority) -> &mut VecDeque<TaskId> {
        match priority {
            Priority::Urgent => &mut self.urgent,
            Priority::Normal => &mut self.normal,
        }
    }
}
