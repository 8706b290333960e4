//! Instrumented payloads for observing what the drain loop does.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use taskpace::exec::Payload;

/// Records the names of payloads in the order they ran.
#[derive(Clone, Default)]
pub struct ExecutionLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload that appends `name` to the log and returns it as its value.
    pub fn payload(&self, name: &str) -> Payload {
        let entries = Arc::clone(&self.entries);
        let name = name.to_string();
        Payload::from_fn(move || {
            entries.lock().unwrap().push(name.clone());
            Ok(name)
        })
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

/// Counts how many payloads are inside their body at the same time.
#[derive(Clone, Default)]
pub struct ConcurrencyProbe {
    active: Arc<AtomicUsize>,
    max_seen: Arc<AtomicUsize>,
    runs: Arc<AtomicUsize>,
}

impl ConcurrencyProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload that stays "inside" for `hold` before leaving.
    pub fn payload(&self, hold: Duration) -> Payload {
        let probe = self.clone();
        Payload::new(move || async move {
            let now = probe.active.fetch_add(1, Ordering::SeqCst) + 1;
            probe.max_seen.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(hold).await;
            probe.active.fetch_sub(1, Ordering::SeqCst);
            probe.runs.fetch_add(1, Ordering::SeqCst);
            Ok(String::new())
        })
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_seen.load(Ordering::SeqCst)
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }
}

/// A payload that blocks until [`Gate::open`] is called.
#[derive(Clone, Default)]
pub struct Gate {
    notify: Arc<Notify>,
}

impl Gate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payload(&self) -> Payload {
        let notify = Arc::clone(&self.notify);
        Payload::new(move || async move {
            notify.notified().await;
            Ok("released".to_string())
        })
    }

    /// Let the waiting payload finish (or the next one, if none waits yet).
    pub fn open(&self) {
        self.notify.notify_one();
    }
}

pub fn failing_payload(cause: &str) -> Payload {
    let cause = cause.to_string();
    Payload::from_fn(move || Err(anyhow::anyhow!(cause)))
}

pub fn panicking_payload() -> Payload {
    Payload::from_fn(|| panic!("payload blew up"))
}
