//! Cleanable capability and reverse-construction-order teardown.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::RepeatTeardown;
use crate::error::{CleanupFailure, DiError, DiResult};
use crate::key::Key;

/// Result of a single cleanup.
pub type CleanResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Capability for instances that need explicit teardown.
///
/// Instances opt in through [`Wire::cleaner`](crate::Wire::cleaner) (or the
/// `clean` form of [`impl_wire!`](crate::impl_wire)). Once an instance's build
/// completes it is queued for teardown; `Container::teardown` then calls
/// `clean` on every queued instance, most recently built first.
///
/// # Examples
///
/// ```
/// use ferrous_wire::{impl_wire, Clean, CleanResult, ContainerBuilder};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// #[derive(Default)]
/// struct Pool {
///     closed: AtomicBool,
/// }
///
/// impl Clean for Pool {
///     fn clean(&self) -> CleanResult {
///         self.closed.store(true, Ordering::SeqCst);
///         Ok(())
///     }
/// }
///
/// impl_wire!(Pool {} clean);
///
/// let mut builder = ContainerBuilder::new();
/// builder.register::<Pool, _>(Pool::default).unwrap();
/// let container = builder.build();
///
/// let pool = container.get::<Pool>().unwrap();
/// container.teardown().unwrap();
/// assert!(pool.closed.load(Ordering::SeqCst));
/// ```
pub trait Clean: Send + Sync + 'static {
    /// Release the instance's resources.
    fn clean(&self) -> CleanResult;
}

struct Entry {
    key: Key,
    cleaner: Arc<dyn Clean>,
}

/// Ordered set of cleanable instances, newest first.
#[derive(Default)]
pub(crate) struct CleanupCoordinator {
    entries: Mutex<VecDeque<Entry>>,
    runs: AtomicUsize,
}

impl CleanupCoordinator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Queues `cleaner` ahead of everything registered before it.
    pub(crate) fn push(&self, key: Key, cleaner: Arc<dyn Clean>) {
        self.entries.lock().push_front(Entry { key, cleaner });
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub(crate) fn has_run(&self) -> bool {
        self.runs.load(Ordering::SeqCst) > 0
    }

    /// Drains the queue and runs every cleanup once, in queue order.
    ///
    /// Failures and panics do not stop the pass; they are collected into
    /// [`DiError::CleanupFailed`]. `on_cleaned` sees each key with its outcome.
    pub(crate) fn teardown<F>(&self, policy: RepeatTeardown, mut on_cleaned: F) -> DiResult<()>
    where
        F: FnMut(&Key, bool),
    {
        let previous_runs = self.runs.fetch_add(1, Ordering::SeqCst);
        if previous_runs > 0 && policy == RepeatTeardown::Reject {
            return Err(DiError::AlreadyTornDown);
        }

        // Lock released before any cleanup runs.
        let entries: Vec<Entry> = self.entries.lock().drain(..).collect();
        tracing::debug!(count = entries.len(), run = previous_runs + 1, "Running teardown");

        let mut failures = Vec::new();
        for Entry { key, cleaner } in entries {
            let outcome = match catch_unwind(AssertUnwindSafe(|| cleaner.clean())) {
                Ok(Ok(())) => None,
                Ok(Err(err)) => Some(err.to_string()),
                Err(payload) => Some(panic_message(payload.as_ref())),
            };

            on_cleaned(&key, outcome.is_none());
            if let Some(message) = outcome {
                tracing::warn!(key = %key, error = %message, "Cleanup failed");
                failures.push(CleanupFailure { key, message });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DiError::CleanupFailed(failures))
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "cleanup panicked".to_string()
    }
}
