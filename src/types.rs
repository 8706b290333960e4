use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::errors::AdmissionError;

/// Priority class of a task.
///
/// Every `Urgent` task still waiting in the backlog is dequeued before any
/// waiting `Normal` task, and waits the short delay instead of the long one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Priority {
    Urgent,
    Normal,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

impl FromStr for Priority {
    type Err = AdmissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "urgent" => Ok(Priority::Urgent),
            "normal" => Ok(Priority::Normal),
            other => Err(AdmissionError::InvalidPriority(other.to_string())),
        }
    }
}

impl TryFrom<String> for Priority {
    type Error = AdmissionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Urgent => f.write_str("urgent"),
            Priority::Normal => f.write_str("normal"),
        }
    }
}

/// Lifecycle state of a task.
///
/// Legal transitions are `Pending -> Running -> Completed | Failed` and
/// `Pending -> Cancelled`. Each happens at most once per task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Cancelled
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskState::Pending => "PENDING",
            TaskState::Running => "RUNNING",
            TaskState::Completed => "COMPLETED",
            TaskState::Failed => "FAILED",
            TaskState::Cancelled => "CANCELLED",
        };
        f.write_str(s)
    }
}
