// src/permissions.rs

//! Permission oracle consulted by payloads that touch sensitive operations.
//!
//! The scheduler never looks at permissions; a task is gated by wrapping its
//! payload with [`gated`], so a denied task simply fails with a
//! [`SchedulerError::PermissionDenied`] cause.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use crate::errors::SchedulerError;
use crate::exec::Payload;

/// Answers "may `subject` use `capability`?".
pub trait PermissionOracle: Send + Sync {
    fn is_allowed(&self, subject: &str, capability: &str) -> bool;
}

/// Static grant table: subject -> set of capabilities.
///
/// Unknown subjects are denied everything.
#[derive(Debug, Clone, Default)]
pub struct PermissionTable {
    grants: HashMap<String, HashSet<String>>,
}

impl PermissionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `[permissions]` config section.
    pub fn from_config(section: &BTreeMap<String, Vec<String>>) -> Self {
        let grants = section
            .iter()
            .map(|(subject, caps)| (subject.clone(), caps.iter().cloned().collect()))
            .collect();
        Self { grants }
    }

    pub fn grant(mut self, subject: &str, capability: &str) -> Self {
        self.grants
            .entry(subject.to_string())
            .or_default()
            .insert(capability.to_string());
        self
    }
}

impl PermissionOracle for PermissionTable {
    fn is_allowed(&self, subject: &str, capability: &str) -> bool {
        let allowed = self
            .grants
            .get(subject)
            .is_some_and(|caps| caps.contains(capability));
        debug!(subject, capability, allowed, "permission check");
        allowed
    }
}

/// Wrap `payload` so it only runs if `oracle` allows `subject` to use
/// `capability`. The check happens when the task runs, not at admission.
pub fn gated(
    payload: Payload,
    oracle: Arc<dyn PermissionOracle>,
    subject: impl Into<String>,
    capability: impl Into<String>,
) -> Payload {
    let subject = subject.into();
    let capability = capability.into();

    Payload::new(move || async move {
        if !oracle.is_allowed(&subject, &capability) {
            info!(%subject, %capability, "permission denied; task will not run");
            return Err(SchedulerError::PermissionDenied {
                subject,
                capability,
            }
            .into());
        }
        payload.invoke().await
    })
}
