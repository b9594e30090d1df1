//! Container builder: the registration phase.
//!
//! Registrations are only accepted before [`ContainerBuilder::build`] seals
//! them into a [`Container`]; the sealed table never changes afterwards.

use std::fmt;
use std::sync::Arc;

use crate::config::{ContainerOptions, CycleMode};
use crate::container::Container;
use crate::descriptors::{describe, ServiceDescriptor};
use crate::error::DiResult;
use crate::key::Key;
use crate::observer::{BuildObserver, Observers};
use crate::registration::{Constructed, Registration, RegistrationTable};
use crate::wiring::Wire;

/// Collects factories, options and observers for a [`Container`].
pub struct ContainerBuilder {
    table: RegistrationTable,
    options: ContainerOptions,
    observers: Observers,
}

impl ContainerBuilder {
    /// Empty builder with default (strict) options.
    pub fn new() -> Self {
        Self::with_options(ContainerOptions::default())
    }

    pub fn with_options(options: ContainerOptions) -> Self {
        Self {
            table: RegistrationTable::new(),
            options,
            observers: Observers::new(),
        }
    }

    /// Empty builder that tolerates cycles, see [`CycleMode::Lenient`].
    pub fn lenient() -> Self {
        Self::with_options(ContainerOptions::lenient())
    }

    pub fn set_options(&mut self, options: ContainerOptions) -> &mut Self {
        self.options = options;
        self
    }

    pub fn set_cycle_mode(&mut self, mode: CycleMode) -> &mut Self {
        self.options.cycle_mode = mode;
        self
    }

    pub fn options(&self) -> &ContainerOptions {
        &self.options
    }

    // ----- Registrations -----

    /// Registers the unnamed factory for `T`.
    ///
    /// The factory runs at most once, on the first request for `T`; its
    /// output is then wired and shared. Registering `T` twice fails with
    /// [`DiError::DuplicateRegistration`](crate::DiError::DuplicateRegistration)
    /// and keeps the first factory.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ferrous_wire::{ContainerBuilder, DiError, Key};
    ///
    /// let mut builder = ContainerBuilder::new();
    /// builder.register::<String, _>(|| "primary".to_string()).unwrap();
    ///
    /// let err = builder.register::<String, _>(|| "second".to_string()).unwrap_err();
    /// assert!(matches!(err, DiError::DuplicateRegistration(key) if key == Key::of::<String>()));
    ///
    /// let container = builder.build();
    /// assert_eq!(*container.get::<String>().unwrap(), "primary");
    /// ```
    pub fn register<T, F>(&mut self, factory: F) -> DiResult<&mut Self>
    where
        T: Wire,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.bind::<T, _>(Key::of::<T>(), move || Arc::new(factory()))
    }

    /// Registers a factory for `T` under `name`.
    ///
    /// Named registrations are independent of each other and of the unnamed
    /// registration of the same type.
    pub fn register_named<T, F>(&mut self, name: &'static str, factory: F) -> DiResult<&mut Self>
    where
        T: Wire,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.bind::<T, _>(Key::named::<T>(name), move || Arc::new(factory()))
    }

    /// Registers a factory that hands out an `Arc<T>`, where `T` may be a
    /// trait object.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use ferrous_wire::{impl_wire, ContainerBuilder, Wire};
    /// use std::sync::Arc;
    ///
    /// trait Greeter: Wire {
    ///     fn greet(&self) -> String;
    /// }
    ///
    /// struct English;
    /// impl_wire!(English {});
    /// impl Greeter for English {
    ///     fn greet(&self) -> String {
    ///         "hello".into()
    ///     }
    /// }
    ///
    /// let mut builder = ContainerBuilder::new();
    /// builder
    ///     .register_shared::<dyn Greeter, _>(|| Arc::new(English) as Arc<dyn Greeter>)
    ///     .unwrap();
    ///
    /// let greeter = builder.build().get::<dyn Greeter>().unwrap();
    /// assert_eq!(greeter.greet(), "hello");
    /// ```
    pub fn register_shared<T, F>(&mut self, factory: F) -> DiResult<&mut Self>
    where
        T: ?Sized + Wire,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.bind::<T, _>(Key::of::<T>(), factory)
    }

    /// Named form of [`register_shared`](Self::register_shared).
    pub fn register_shared_named<T, F>(&mut self, name: &'static str, factory: F) -> DiResult<&mut Self>
    where
        T: ?Sized + Wire,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        self.bind::<T, _>(Key::named::<T>(name), factory)
    }

    fn bind<T, F>(&mut self, key: Key, factory: F) -> DiResult<&mut Self>
    where
        T: ?Sized + Wire,
        F: Fn() -> Arc<T> + Send + Sync + 'static,
    {
        let registration = Registration::new(
            Box::new(move || Constructed::new(factory())),
            std::any::type_name::<T>(),
        );
        match self.table.register(key.clone(), registration) {
            Ok(()) => {
                tracing::trace!(key = %key, "Registered");
                Ok(self)
            }
            Err(err) => {
                tracing::warn!(key = %key, "Duplicate registration rejected");
                Err(err)
            }
        }
    }

    // ----- Diagnostics -----

    /// Adds an observer that sees build, cycle and teardown events.
    pub fn add_observer(&mut self, observer: Arc<dyn BuildObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    pub fn is_registered(&self, key: &Key) -> bool {
        self.table.contains(key)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.len() == 0
    }

    /// Registrations made so far, in order.
    pub fn descriptors(&self) -> Vec<ServiceDescriptor> {
        describe(&self.table)
    }

    /// Seals the registrations into a container.
    pub fn build(self) -> Container {
        Container::new(self.table, self.observers, self.options)
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("registrations", &self.table.len())
            .field("options", &self.options)
            .finish()
    }
}
