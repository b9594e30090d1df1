//! Registration key types for the wiring container.

use std::any::TypeId;
use std::fmt;

/// Key identifying one singleton slot in the container.
///
/// A key is the pair *(declared type, optional name)*. A declared type has at
/// most one unnamed registration ([`Key::Type`]) and any number of
/// distinctly-named registrations ([`Key::Named`]). The declared type can be a
/// concrete type or a trait object type such as `dyn Logger`.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::Key;
///
/// trait Logger: Send + Sync {}
///
/// let engine = Key::of::<u32>();
/// let spare = Key::named::<u32>("spare");
/// let logger = Key::of::<dyn Logger>();
///
/// assert_ne!(engine, spare);
/// assert_eq!(engine.display_name(), "u32");
/// assert_eq!(spare.service_name(), Some("spare"));
/// assert!(logger.display_name().contains("Logger"));
/// ```
#[derive(Debug, Clone)]
pub enum Key {
    /// Unnamed registration: `TypeId` plus the type name for diagnostics.
    Type(TypeId, &'static str),
    /// Named registration: `TypeId`, type name and registration name.
    Named(TypeId, &'static str, &'static str),
}

impl Key {
    /// Key of the unnamed registration for `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Key {
        Key::Type(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// Key of the registration for `T` under `name`.
    #[inline]
    pub fn named<T: ?Sized + 'static>(name: &'static str) -> Key {
        Key::Named(TypeId::of::<T>(), std::any::type_name::<T>(), name)
    }

    /// Key for `T` with an optional name; `None` means the unnamed slot.
    #[inline]
    pub fn with_alias<T: ?Sized + 'static>(alias: Option<&'static str>) -> Key {
        match alias {
            Some(name) => Key::named::<T>(name),
            None => Key::of::<T>(),
        }
    }

    /// The declared type name (`std::any::type_name`).
    pub fn display_name(&self) -> &'static str {
        match self {
            Key::Type(_, name) => name,
            Key::Named(_, name, _) => name,
        }
    }

    /// The registration name, or `None` for the unnamed slot.
    pub fn service_name(&self) -> Option<&'static str> {
        match self {
            Key::Type(_, _) => None,
            Key::Named(_, _, name) => Some(name),
        }
    }

    /// The declared type's `TypeId`.
    pub fn type_id(&self) -> TypeId {
        match self {
            Key::Type(id, _) | Key::Named(id, _, _) => *id,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Type(_, name) => f.write_str(name),
            Key::Named(_, name, alias) => write!(f, "{}#{}", name, alias),
        }
    }
}

// TypeId-only comparison; the type name is diagnostic.
impl PartialEq for Key {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Key::Type(a, _), Key::Type(b, _)) => a == b,
            (Key::Named(a, _, name_a), Key::Named(b, _, name_b)) => a == b && name_a == name_b,
            _ => false,
        }
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;

        match (self, other) {
            (Key::Type(a, _), Key::Type(b, _)) => a.cmp(b),
            (Key::Named(a, _, name_a), Key::Named(b, _, name_b)) => {
                a.cmp(b).then_with(|| name_a.cmp(name_b))
            }
            (Key::Type(_, _), Key::Named(_, _, _)) => Ordering::Less,
            (Key::Named(_, _, _), Key::Type(_, _)) => Ordering::Greater,
        }
    }
}

impl std::hash::Hash for Key {
    #[inline]
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Key::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            Key::Named(id, _, name) => {
                1u8.hash(state);
                id.hash(state);
                name.hash(state);
            }
        }
    }
}

/// Shorthand for [`Key::of`].
#[inline]
pub fn key_of_type<T: ?Sized + 'static>() -> Key {
    Key::of::<T>()
}
