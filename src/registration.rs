//! Registration table: one factory per key.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::cleanup::Clean;
use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::wiring::{Wire, Wiring};

// Type-erased instance; the concrete payload is always an `Arc<T>`.
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

pub(crate) type WireFn = Box<dyn FnOnce(&mut Wiring<'_>) -> DiResult<()> + Send>;

/// Raw factory output, erased but still carrying its wiring and cleanup hooks.
pub(crate) struct Constructed {
    pub(crate) value: AnyArc,
    pub(crate) wirer: WireFn,
    pub(crate) cleaner: Option<Arc<dyn Clean>>,
}

impl Constructed {
    pub(crate) fn new<T: ?Sized + Wire>(instance: Arc<T>) -> Self {
        let target = instance.clone();
        Self {
            cleaner: T::cleaner(instance.clone()),
            wirer: Box::new(move |wiring: &mut Wiring<'_>| target.wire(wiring)),
            value: Arc::new(instance),
        }
    }
}

pub(crate) type Factory = Box<dyn Fn() -> Constructed + Send + Sync>;

/// A bound factory plus the name of the type it was registered as.
pub(crate) struct Registration {
    pub(crate) factory: Factory,
    pub(crate) declared_type: &'static str,
}

impl Registration {
    pub(crate) fn new(factory: Factory, declared_type: &'static str) -> Self {
        Self { factory, declared_type }
    }
}

/// Key to factory bindings, in registration order.
#[derive(Default)]
pub(crate) struct RegistrationTable {
    entries: HashMap<Key, Registration>,
    order: Vec<Key>,
}

impl RegistrationTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Binds `registration` to `key`; an existing binding is kept and reported.
    pub(crate) fn register(&mut self, key: Key, registration: Registration) -> DiResult<()> {
        if self.entries.contains_key(&key) {
            return Err(DiError::DuplicateRegistration(key));
        }
        self.order.push(key.clone());
        self.entries.insert(key, registration);
        Ok(())
    }

    #[inline]
    pub(crate) fn lookup(&self, key: &Key) -> Option<&Registration> {
        self.entries.get(key)
    }

    #[inline]
    pub(crate) fn contains(&self, key: &Key) -> bool {
        self.entries.contains_key(key)
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    /// Bindings in the order they were registered.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&Key, &Registration)> {
        self.order
            .iter()
            .filter_map(move |key| self.entries.get(key).map(|reg| (key, reg)))
    }
}
