//! Error types for the wiring container.

use std::fmt;

use crate::key::Key;

/// Wiring container errors.
///
/// Every build error is fail-fast: it is meant to abort the bootstrap
/// sequence, not to be caught and retried. A failed build is memoized, so
/// requesting the same key again returns the same error without invoking the
/// factory a second time.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{ContainerBuilder, DiError, Key};
///
/// let container = ContainerBuilder::new().build();
/// match container.get::<String>() {
///     Err(DiError::UnresolvedDependency(key)) => {
///         assert_eq!(key, Key::of::<String>());
///     }
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone)]
pub enum DiError {
    /// The key already has a bound factory.
    DuplicateRegistration(Key),
    /// No factory is bound for the requested key.
    UnresolvedDependency(Key),
    /// Strict-mode re-entrant request of an in-progress key (includes path).
    CycleDetected(Vec<Key>),
    /// Maximum resolution depth exceeded
    DepthExceeded(usize),
    /// Type-erased instance failed to downcast
    TypeMismatch(&'static str),
    /// The factory or wiring of this key unwound before the build finished.
    FactoryPanicked(Key),
    /// One or more cleanups failed during teardown; the rest still ran.
    CleanupFailed(Vec<CleanupFailure>),
    /// Teardown was requested again under `RepeatTeardown::Reject`.
    AlreadyTornDown,
    /// Container options could not be loaded.
    InvalidConfig(String),
}

/// One failed cleanup recorded during teardown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupFailure {
    /// Key of the instance whose cleanup failed
    pub key: Key,
    /// Error or panic message
    pub message: String,
}

impl fmt::Display for CleanupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::DuplicateRegistration(key) => write!(f, "Duplicate registration for: {}", key),
            DiError::UnresolvedDependency(key) => write!(f, "No factory registered for: {}", key),
            DiError::CycleDetected(path) => {
                let names: Vec<String> = path.iter().map(ToString::to_string).collect();
                write!(f, "Cycle detected: {}", names.join(" -> "))
            }
            DiError::DepthExceeded(depth) => write!(f, "Max depth {} exceeded", depth),
            DiError::TypeMismatch(name) => write!(f, "Type mismatch for: {}", name),
            DiError::FactoryPanicked(key) => write!(f, "Build of {} panicked", key),
            DiError::CleanupFailed(failures) => {
                write!(f, "{} cleanup(s) failed", failures.len())?;
                for failure in failures {
                    write!(f, "; {}", failure)?;
                }
                Ok(())
            }
            DiError::AlreadyTornDown => write!(f, "Container already torn down"),
            DiError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for DiError {}

/// Result type for container operations.
pub type DiResult<T> = Result<T, DiError>;
