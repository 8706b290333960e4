// src/exec/payload.rs

use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// What a payload resolves to: a value on success, a cause on failure.
pub type PayloadResult = anyhow::Result<String>;

pub type PayloadFuture = Pin<Box<dyn Future<Output = PayloadResult> + Send + 'static>>;

/// Type-erased action carried by a task.
///
/// Invoked exactly once, with no arguments, by the drain loop.
pub struct Payload {
    action: Box<dyn FnOnce() -> PayloadFuture + Send + 'static>,
}

impl Payload {
    /// Wrap an async closure.
    pub fn new<F, Fut>(action: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = PayloadResult> + Send + 'static,
    {
        Self {
            action: Box::new(move || -> PayloadFuture { Box::pin(action()) }),
        }
    }

    /// Wrap a synchronous closure.
    pub fn from_fn<F>(action: F) -> Self
    where
        F: FnOnce() -> PayloadResult + Send + 'static,
    {
        Self::new(move || async move { action() })
    }

    pub fn invoke(self) -> PayloadFuture {
        (self.action)()
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload").finish_non_exhaustive()
    }
}
