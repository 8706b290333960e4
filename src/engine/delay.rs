// src/engine/delay.rs

use std::time::Duration;

use super::Priority;

/// Pre-execution pause keyed by priority.
///
/// The pause throttles the drain loop (e.g. to go easy on battery or a rate
/// limit). It always runs to completion; a task that has been selected can
/// no longer be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayPolicy {
    /// Applied to `Priority::Urgent` tasks.
    pub short_delay: Duration,
    /// Applied to `Priority::Normal` tasks.
    pub long_delay: Duration,
}

impl DelayPolicy {
    pub fn new(short_delay: Duration, long_delay: Duration) -> Self {
        Self {
            short_delay,
            long_delay,
        }
    }

    /// No pause at all; useful for tests and `--no-delay`.
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn for_priority(&self, priority: Priority) -> Duration {
        match priority {
            Priority::Urgent => self.short_delay,
            Priority::Normal => self.long_delay,
        }
    }
}

impl Default for DelayPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000), Duration::from_millis(5000))
    }
}
