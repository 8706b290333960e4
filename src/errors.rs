// src/errors.rs

//! Crate-wide error types.
//!
//! Payload failures are plain `anyhow::Error` values owned by the task that
//! produced them; they are recorded on the task and never surface here.

use thiserror::Error;

use crate::engine::TaskId;

/// A task specification rejected synchronously by `Scheduler::admit`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("task '{0}' has no payload")]
    MissingPayload(String),

    #[error("task name must not be empty")]
    EmptyName,

    #[error("invalid priority: {0} (expected \"urgent\" or \"normal\")")]
    InvalidPriority(String),
}

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Admission error: {0}")]
    Admission(#[from] AdmissionError),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Permission denied: '{subject}' lacks '{capability}'")]
    PermissionDenied { subject: String, capability: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("No Tokio runtime to run the drain loop on: {0}")]
    RuntimeUnavailable(#[from] tokio::runtime::TryCurrentError),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SchedulerError>;
