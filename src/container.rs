//! The sealed container: resolution, wiring and teardown.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::cache::{BuildCache, BuildStatus, Claim};
use crate::cleanup::CleanupCoordinator;
use crate::collection::ContainerBuilder;
use crate::config::{ContainerOptions, CycleMode};
use crate::descriptors::{describe, ServiceDescriptor};
use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::observer::Observers;
use crate::registration::{AnyArc, Constructed, RegistrationTable};
use crate::wiring::{Wire, Wiring};

/// A sealed wiring container.
///
/// Created by [`ContainerBuilder::build`]. Every registration is a lazily
/// built singleton: the first request for a key invokes its factory exactly
/// once, wires the instance's [`Inject`](crate::Inject) slots, and memoizes
/// the result. Later requests, from any thread, get the same `Arc`.
///
/// Cloning a `Container` is cheap and shares all state.
///
/// # Examples
///
/// ```
/// use ferrous_wire::{impl_wire, ContainerBuilder, Inject};
/// use std::sync::Arc;
///
/// struct Config {
///     url: String,
/// }
/// impl_wire!(Config {});
///
/// struct Repository {
///     config: Inject<Config>,
/// }
/// impl_wire!(Repository { config });
///
/// let mut builder = ContainerBuilder::new();
/// builder.register::<Config, _>(|| Config { url: "postgres://db".into() }).unwrap();
/// builder.register::<Repository, _>(|| Repository { config: Inject::new() }).unwrap();
/// let container = builder.build();
///
/// let repo = container.get::<Repository>().unwrap();
/// assert_eq!(repo.config.url, "postgres://db");
/// assert!(Arc::ptr_eq(&repo, &container.get::<Repository>().unwrap()));
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    table: RegistrationTable,
    cache: BuildCache,
    cleanup: CleanupCoordinator,
    observers: Observers,
    options: ContainerOptions,
}

impl Container {
    pub(crate) fn new(table: RegistrationTable, observers: Observers, options: ContainerOptions) -> Self {
        tracing::debug!(
            registrations = table.len(),
            cycle_mode = %options.cycle_mode,
            max_depth = options.max_depth,
            "Container sealed"
        );
        Self {
            inner: Arc::new(Inner {
                table,
                cache: BuildCache::new(),
                cleanup: CleanupCoordinator::new(),
                observers,
                options,
            }),
        }
    }

    /// Shorthand for [`ContainerBuilder::new`].
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    /// Resolves the unnamed registration of `T`.
    pub fn get<T>(&self) -> DiResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve::<T>(&Key::of::<T>())
    }

    /// Resolves the registration of `T` under `name`.
    pub fn get_named<T>(&self, name: &'static str) -> DiResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve::<T>(&Key::named::<T>(name))
    }

    /// Like [`get`](Self::get), but panics on failure.
    ///
    /// # Panics
    ///
    /// Panics with the resolution error when `T` cannot be built.
    pub fn get_required<T>(&self) -> Arc<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }

    /// Like [`get_named`](Self::get_named), but panics on failure.
    ///
    /// # Panics
    ///
    /// Panics with the resolution error when the named `T` cannot be built.
    pub fn get_named_required<T>(&self, name: &'static str) -> Arc<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get_named::<T>(name).unwrap_or_else(|e| {
            panic!("Failed to resolve {}#{}: {}", std::any::type_name::<T>(), name, e)
        })
    }

    /// Resolves an explicit key, which must have been built for type `T`.
    ///
    /// Returns [`DiError::TypeMismatch`] when `key` belongs to another type.
    pub fn resolve<T>(&self, key: &Key) -> DiResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let mut path = Vec::new();
        let any = self.inner.resolve(key, &mut path)?;
        downcast::<T>(&any)
    }

    /// Wires the [`Inject`](crate::Inject) slots of a value the container did
    /// not construct.
    ///
    /// The value itself is neither memoized nor queued for teardown. Slots
    /// that are already wired are left alone.
    ///
    /// # Examples
    ///
    /// ```
    /// use ferrous_wire::{impl_wire, ContainerBuilder, Inject};
    ///
    /// struct Clock;
    /// impl_wire!(Clock {});
    ///
    /// struct Handler {
    ///     clock: Inject<Clock>,
    /// }
    /// impl_wire!(Handler { clock });
    ///
    /// let mut builder = ContainerBuilder::new();
    /// builder.register::<Clock, _>(|| Clock).unwrap();
    /// let container = builder.build();
    ///
    /// let handler = Handler { clock: Inject::new() };
    /// container.wire(&handler).unwrap();
    /// assert!(Inject::is_wired(&handler.clock));
    /// ```
    pub fn wire<W>(&self, value: &W) -> DiResult<()>
    where
        W: ?Sized + Wire,
    {
        let mut path = Vec::new();
        let mut wiring = Wiring::new(&self.inner, &mut path);
        value.wire(&mut wiring)
    }

    /// Runs every queued cleanup, most recently built instance first.
    ///
    /// A failing or panicking cleanup does not stop the rest; failures are
    /// returned together as [`DiError::CleanupFailed`]. Calling this again
    /// follows [`ContainerOptions::repeat_teardown`].
    pub fn teardown(&self) -> DiResult<()> {
        let observers = &self.inner.observers;
        self.inner
            .cleanup
            .teardown(self.inner.options.repeat_teardown, |key, ok| observers.cleaned(key, ok))
    }

    /// Build state of `key`, or `None` if it has never been requested.
    pub fn status(&self, key: &Key) -> Option<BuildStatus> {
        self.inner.cache.status(key)
    }

    pub fn is_registered(&self, key: &Key) -> bool {
        self.inner.table.contains(key)
    }

    /// Registrations in the order they were made.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        describe(&self.inner.table)
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.inner.options
    }

    /// Number of built instances waiting for teardown.
    pub fn pending_cleanups(&self) -> usize {
        self.inner.cleanup.len()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("registrations", &self.inner.table.len())
            .field("records", &self.inner.cache.len())
            .field("pending_cleanups", &self.inner.cleanup.len())
            .field("options", &self.inner.options)
            .finish()
    }
}

impl Inner {
    /// Resolves `key`; `path` holds the keys whose wiring is in progress on
    /// this call stack, outermost first.
    pub(crate) fn resolve(&self, key: &Key, path: &mut Vec<Key>) -> DiResult<AnyArc> {
        let registration = self
            .table
            .lookup(key)
            .ok_or_else(|| DiError::UnresolvedDependency(key.clone()))?;

        let guard = match self.cache.claim(key) {
            Claim::Ready(instance) => {
                tracing::trace!(key = %key, "Memoized instance");
                return Ok(instance);
            }
            Claim::Failed(err) => return Err(err),
            Claim::Reentrant(provisional) => return self.reentered(key, path, provisional),
            Claim::Owned(guard) => guard,
        };

        if path.len() >= self.options.max_depth {
            let err = DiError::DepthExceeded(self.options.max_depth);
            tracing::warn!(key = %key, depth = path.len(), "Resolution depth exceeded");
            guard.fail(err.clone());
            return Err(err);
        }

        self.observers.building(key);
        tracing::debug!(key = %key, declared_type = registration.declared_type, "Building");
        let started = self.observers.has_observers().then(Instant::now);

        let Constructed { value, wirer, cleaner } = (registration.factory)();
        guard.provide(value.clone());

        path.push(key.clone());
        let wired = wirer(&mut Wiring::new(self, path));
        path.pop();

        if let Err(err) = wired {
            tracing::debug!(key = %key, error = %err, "Build failed");
            guard.fail(err.clone());
            return Err(err);
        }

        guard.finish(value.clone());
        if let Some(cleaner) = cleaner {
            self.cleanup.push(key.clone(), cleaner);
        }
        if let Some(started) = started {
            self.observers.built(key, started.elapsed());
        }
        tracing::debug!(key = %key, "Built");
        Ok(value)
    }

    fn reentered(&self, key: &Key, path: &[Key], provisional: Option<AnyArc>) -> DiResult<AnyArc> {
        // A key re-entered from inside its own factory is not on `path` yet.
        let mut cycle = match path.iter().position(|k| k == key) {
            Some(start) => path[start..].to_vec(),
            None => vec![key.clone()],
        };
        cycle.push(key.clone());
        self.observers.cycle_detected(&cycle);

        match (self.options.cycle_mode, provisional) {
            (CycleMode::Lenient, Some(partial)) => {
                tracing::warn!(key = %key, depth = cycle.len() - 1, "Cycle detected, returning partially wired instance");
                Ok(partial)
            }
            _ => {
                tracing::warn!(key = %key, depth = cycle.len() - 1, "Cycle detected");
                Err(DiError::CycleDetected(cycle))
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if !self.cleanup.is_empty() && !self.cleanup.has_run() {
            tracing::warn!(
                pending = self.cleanup.len(),
                "Container dropped with instances that were never cleaned; call teardown() first"
            );
        }
    }
}

/// Recovers the typed `Arc<T>` stored in a type-erased record.
pub(crate) fn downcast<T>(any: &AnyArc) -> DiResult<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    any.downcast_ref::<Arc<T>>()
        .cloned()
        .ok_or(DiError::TypeMismatch(std::any::type_name::<T>()))
}
