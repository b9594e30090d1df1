//! Registration descriptors for introspection and diagnostics.

use crate::key::Key;
use crate::registration::RegistrationTable;

/// Read-only view of one registration.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::ContainerBuilder;
///
/// let mut builder = ContainerBuilder::new();
/// builder.register::<u32, _>(|| 8080).unwrap();
/// builder.register_named::<u32, _>("admin_port", || 9090).unwrap();
///
/// let descriptors = builder.descriptors();
/// assert_eq!(descriptors.len(), 2);
///
/// let named = descriptors.iter().find(|d| d.is_named()).unwrap();
/// assert_eq!(named.service_name(), Some("admin_port"));
/// assert_eq!(named.type_name(), "u32");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// The registration key
    pub key: Key,
    /// Type named at registration; for trait registrations this is the
    /// trait object type, not the implementation behind it
    pub declared_type: &'static str,
}

impl ServiceDescriptor {
    pub fn service_name(&self) -> Option<&'static str> {
        self.key.service_name()
    }

    pub fn type_name(&self) -> &'static str {
        self.key.display_name()
    }

    pub fn is_named(&self) -> bool {
        self.service_name().is_some()
    }
}

pub(crate) fn describe(table: &RegistrationTable) -> Vec<ServiceDescriptor> {
    table
        .iter()
        .map(|(key, registration)| ServiceDescriptor {
            key: key.clone(),
            declared_type: registration.declared_type,
        })
        .collect()
}
