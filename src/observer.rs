//! Build observers for tracing and diagnostics.

use std::sync::Arc;
use std::time::Duration;

use crate::key::Key;

/// Observer of container build and teardown events.
///
/// Observers are registered on the builder and called synchronously from the
/// resolving thread, so implementations should stay cheap. Every hook has an
/// empty default.
///
/// # Examples
///
/// ```
/// use ferrous_wire::{BuildObserver, ContainerBuilder, Key};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct BuildLog(Mutex<Vec<String>>);
///
/// impl BuildObserver for BuildLog {
///     fn built(&self, key: &Key, _duration: Duration) {
///         self.0.lock().unwrap().push(key.to_string());
///     }
/// }
///
/// let log = Arc::new(BuildLog::default());
/// let mut builder = ContainerBuilder::new();
/// builder.add_observer(log.clone());
/// builder.register::<u32, _>(|| 7).unwrap();
///
/// let container = builder.build();
/// container.get::<u32>().unwrap();
/// container.get::<u32>().unwrap();
/// assert_eq!(*log.0.lock().unwrap(), vec!["u32".to_string()]);
/// ```
pub trait BuildObserver: Send + Sync {
    /// A factory is about to be invoked for `key`.
    fn building(&self, _key: &Key) {}

    /// `key` finished building and wiring.
    fn built(&self, _key: &Key, _duration: Duration) {}

    /// A re-entrant request closed a cycle; `path` starts and ends with the same key.
    fn cycle_detected(&self, _path: &[Key]) {}

    /// Cleanup of `key` ran during teardown.
    fn cleaned(&self, _key: &Key, _succeeded: bool) {}
}

/// Fan-out over registered observers.
#[derive(Default, Clone)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn BuildObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn BuildObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    pub(crate) fn building(&self, key: &Key) {
        for observer in &self.observers {
            observer.building(key);
        }
    }

    pub(crate) fn built(&self, key: &Key, duration: Duration) {
        for observer in &self.observers {
            observer.built(key, duration);
        }
    }

    pub(crate) fn cycle_detected(&self, path: &[Key]) {
        for observer in &self.observers {
            observer.cycle_detected(path);
        }
    }

    pub(crate) fn cleaned(&self, key: &Key, succeeded: bool) {
        for observer in &self.observers {
            observer.cleaned(key, succeeded);
        }
    }
}
