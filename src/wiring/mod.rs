//! Wiring engine: dependency slots and the trait that exposes them.
//!
//! A wired type declares its dependencies as [`Inject`] fields and lists them
//! in its [`Wire`] implementation (usually through [`impl_wire!`]). After the
//! container invokes a type's factory, it hands the fresh instance a
//! [`Wiring`] context; each `inject` call resolves the slot's key through the
//! container and stores the result in the slot.
//!
//! [`impl_wire!`]: crate::impl_wire

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::cleanup::Clean;
use crate::container::{downcast, Inner};
use crate::error::DiResult;
use crate::key::Key;

pub mod tag;

/// A type the container can wire after constructing it.
///
/// Both methods default to "nothing to do", which is what plain values need.
/// The trait is object safe: a trait that should be resolvable as
/// `dyn Trait` takes `Wire` as a supertrait, and wiring dispatches to the
/// concrete type behind the trait object.
///
/// # Examples
///
/// ```
/// use ferrous_wire::{ContainerBuilder, DiResult, Inject, Wire, Wiring};
///
/// struct Engine;
/// impl Wire for Engine {}
///
/// struct Car {
///     engine: Inject<Engine>,
///     spare: Inject<Engine>,
/// }
///
/// impl Wire for Car {
///     fn wire(&self, wiring: &mut Wiring<'_>) -> DiResult<()> {
///         wiring.inject(&self.engine)?;
///         wiring.inject(&self.spare)
///     }
/// }
///
/// let mut builder = ContainerBuilder::new();
/// builder.register::<Engine, _>(|| Engine).unwrap();
/// builder.register_named::<Engine, _>("spare", || Engine).unwrap();
/// builder
///     .register::<Car, _>(|| Car { engine: Inject::new(), spare: Inject::named("spare") })
///     .unwrap();
///
/// let car = builder.build().get::<Car>().unwrap();
/// assert!(Inject::is_wired(&car.engine) && Inject::is_wired(&car.spare));
/// ```
pub trait Wire: Send + Sync + 'static {
    /// Resolves this instance's dependency slots.
    fn wire(&self, _wiring: &mut Wiring<'_>) -> DiResult<()> {
        Ok(())
    }

    /// Exposes the instance for teardown; `None` means nothing to clean.
    fn cleaner(self: Arc<Self>) -> Option<Arc<dyn Clean>> {
        None
    }
}

/// Context handed to [`Wire::wire`] while an instance is being built.
pub struct Wiring<'a> {
    container: &'a Inner,
    path: &'a mut Vec<Key>,
}

impl<'a> Wiring<'a> {
    pub(crate) fn new(container: &'a Inner, path: &'a mut Vec<Key>) -> Self {
        Self { container, path }
    }

    /// Resolves `slot`'s key and stores the instance in it.
    ///
    /// A slot that already holds an instance is left as is.
    pub fn inject<T>(&mut self, slot: &Inject<T>) -> DiResult<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        if Inject::is_wired(slot) {
            return Ok(());
        }
        let key = Inject::key(slot);
        let instance = self.resolve_key::<T>(&key)?;
        // Instances are memoized, so a concurrent wiring that filled the slot
        // first stored the same `Arc`.
        if slot.cell.set(instance).is_err() {
            tracing::trace!(key = %key, "Slot already wired");
        }
        Ok(())
    }

    /// Resolves the unnamed registration of `T`.
    pub fn resolve<T>(&mut self) -> DiResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve_key::<T>(&Key::of::<T>())
    }

    /// Resolves the registration of `T` under `name`.
    pub fn resolve_named<T>(&mut self, name: &'static str) -> DiResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.resolve_key::<T>(&Key::named::<T>(name))
    }

    /// Keys currently being built, outermost first.
    pub fn path(&self) -> &[Key] {
        self.path.as_slice()
    }

    fn resolve_key<T>(&mut self, key: &Key) -> DiResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let any = self.container.resolve(key, self.path)?;
        downcast::<T>(&any)
    }
}

/// Typed descriptor of one dependency edge: the alias to inject, if any.
///
/// The target type comes from the slot's type parameter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InjectSpec {
    pub alias: Option<&'static str>,
}

impl InjectSpec {
    /// Inject the unnamed registration.
    pub const fn unnamed() -> Self {
        Self { alias: None }
    }

    /// Inject the registration under `name`.
    pub const fn alias(name: &'static str) -> Self {
        Self { alias: Some(name) }
    }

    /// Builds a descriptor from an annotation such as `"type;alias:spare"`.
    ///
    /// A malformed annotation degrades to [`unnamed`](Self::unnamed).
    pub fn from_tag(annotation: &'static str) -> Self {
        match tag::parse(annotation) {
            Ok(directives) => Self { alias: directives.alias() },
            Err(err) => {
                tracing::debug!(annotation, error = %err, "Malformed injection annotation, injecting unnamed");
                Self::unnamed()
            }
        }
    }

    /// Key this descriptor points at for declared type `T`.
    pub fn key_for<T: ?Sized + 'static>(&self) -> Key {
        Key::with_alias::<T>(self.alias)
    }
}

/// Dependency slot filled by the container during wiring.
///
/// # Panics
///
/// Dereferencing a slot that has not been wired panics; use
/// [`Inject::get`] when the slot may still be empty (for instance on an
/// instance handed out through a lenient-mode cycle).
pub struct Inject<T: ?Sized> {
    spec: InjectSpec,
    cell: OnceCell<Arc<T>>,
}

impl<T: ?Sized + 'static> Inject<T> {
    /// Slot for the unnamed registration of `T`.
    pub fn new() -> Self {
        Self::with_spec(InjectSpec::unnamed())
    }

    /// Slot for the registration of `T` under `alias`.
    pub fn named(alias: &'static str) -> Self {
        Self::with_spec(InjectSpec::alias(alias))
    }

    /// Slot described by an annotation, see [`InjectSpec::from_tag`].
    pub fn tagged(annotation: &'static str) -> Self {
        Self::with_spec(InjectSpec::from_tag(annotation))
    }

    pub fn with_spec(spec: InjectSpec) -> Self {
        Self { spec, cell: OnceCell::new() }
    }

    // Accessors take `this` so they never shadow methods of `T` reached
    // through `Deref`.

    pub fn spec(this: &Self) -> InjectSpec {
        this.spec
    }

    pub fn key(this: &Self) -> Key {
        this.spec.key_for::<T>()
    }

    /// The injected instance, if wiring has reached this slot.
    pub fn get(this: &Self) -> Option<&Arc<T>> {
        this.cell.get()
    }

    pub fn is_wired(this: &Self) -> bool {
        this.cell.get().is_some()
    }
}

impl<T: ?Sized + 'static> Default for Inject<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + 'static> Deref for Inject<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self.cell.get() {
            Some(instance) => instance,
            None => panic!("dependency {} has not been wired", Inject::key(self)),
        }
    }
}

impl<T: ?Sized + 'static> fmt::Debug for Inject<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inject")
            .field("key", &Inject::key(self))
            .field("wired", &Inject::is_wired(self))
            .finish()
    }
}

// Indirection layers unwrap one level at a time; an empty layer wires nothing.

impl<T: Wire> Wire for Option<T> {
    fn wire(&self, wiring: &mut Wiring<'_>) -> DiResult<()> {
        match self {
            Some(inner) => inner.wire(wiring),
            None => Ok(()),
        }
    }
}

impl<T: ?Sized + Wire> Wire for Box<T> {
    fn wire(&self, wiring: &mut Wiring<'_>) -> DiResult<()> {
        (**self).wire(wiring)
    }
}

impl<T: ?Sized + Wire> Wire for Arc<T> {
    fn wire(&self, wiring: &mut Wiring<'_>) -> DiResult<()> {
        (**self).wire(wiring)
    }

    fn cleaner(self: Arc<Self>) -> Option<Arc<dyn Clean>> {
        T::cleaner(Arc::clone(&*self))
    }
}

macro_rules! impl_leaf_wire {
    ($($ty:ty),* $(,)?) => {
        $(impl Wire for $ty {})*
    };
}

impl_leaf_wire!(
    (), bool, char, str, String, &'static str,
    u8, u16, u32, u64, u128, usize,
    i8, i16, i32, i64, i128, isize,
    f32, f64,
);

/// Implements [`Wire`] for a struct by listing its [`Inject`] fields.
///
/// Append `clean` to also expose the type for teardown (it must implement
/// [`Clean`](crate::Clean)).
///
/// # Examples
///
/// ```
/// use ferrous_wire::{impl_wire, Clean, CleanResult, ContainerBuilder, Inject};
///
/// struct Engine;
/// impl_wire!(Engine {});
///
/// struct Car {
///     engine: Inject<Engine>,
/// }
/// impl_wire!(Car { engine } clean);
///
/// impl Clean for Car {
///     fn clean(&self) -> CleanResult {
///         Ok(())
///     }
/// }
///
/// let mut builder = ContainerBuilder::new();
/// builder.register::<Engine, _>(|| Engine).unwrap();
/// builder.register::<Car, _>(|| Car { engine: Inject::new() }).unwrap();
/// let container = builder.build();
///
/// assert!(Inject::is_wired(&container.get::<Car>().unwrap().engine));
/// container.teardown().unwrap();
/// ```
#[macro_export]
macro_rules! impl_wire {
    ($ty:ty { $($field:ident),* $(,)? } clean) => {
        impl $crate::Wire for $ty {
            #[allow(unused_variables)]
            fn wire(&self, wiring: &mut $crate::Wiring<'_>) -> $crate::DiResult<()> {
                $(wiring.inject(&self.$field)?;)*
                ::std::result::Result::Ok(())
            }

            fn cleaner(
                self: ::std::sync::Arc<Self>,
            ) -> ::std::option::Option<::std::sync::Arc<dyn $crate::Clean>> {
                ::std::option::Option::Some(self)
            }
        }
    };
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::Wire for $ty {
            #[allow(unused_variables)]
            fn wire(&self, wiring: &mut $crate::Wiring<'_>) -> $crate::DiResult<()> {
                $(wiring.inject(&self.$field)?;)*
                ::std::result::Result::Ok(())
            }
        }
    };
}
