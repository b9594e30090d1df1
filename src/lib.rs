//! # ferrous-wire
//!
//! A bootstrap-time wiring container: register one factory per type (or per
//! named slot), seal the registrations, and let the container build the
//! object graph on demand.
//!
//! ## Features
//!
//! - **Lazy singletons**: each key's factory runs at most once; every request gets the same `Arc`
//! - **Declarative dependencies**: [`Inject`] slots are filled after construction, by type or by name
//! - **Cycle detection**: strict mode reports the full cycle path, lenient mode hands out a partially wired instance
//! - **Ordered teardown**: cleanable instances are released in reverse order of construction
//! - **Thread-safe**: concurrent first requests for a key wait for a single build
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_wire::{impl_wire, ContainerBuilder, Inject};
//!
//! struct Engine {
//!     power: u32,
//! }
//! impl_wire!(Engine {});
//!
//! struct Car {
//!     engine: Inject<Engine>,
//!     spare: Inject<Engine>,
//! }
//! impl_wire!(Car { engine, spare });
//!
//! let mut builder = ContainerBuilder::new();
//! builder.register::<Engine, _>(|| Engine { power: 150 }).unwrap();
//! builder.register_named::<Engine, _>("spare", || Engine { power: 90 }).unwrap();
//! builder
//!     .register::<Car, _>(|| Car {
//!         engine: Inject::new(),
//!         spare: Inject::tagged("alias:spare"),
//!     })
//!     .unwrap();
//!
//! let container = builder.build();
//! let car = container.get::<Car>().unwrap();
//! assert_eq!(car.engine.power, 150);
//! assert_eq!(car.spare.power, 90);
//! ```
//!
//! ## Cycles
//!
//! By default a type that (transitively) depends on itself fails with
//! [`DiError::CycleDetected`]. A container built with
//! [`CycleMode::Lenient`] instead returns the in-progress instance to the
//! re-entrant request, so some of its slots may still be empty when it is
//! first observed. Lenient cycles are `Arc` cycles and are never freed.
//!
//! ## Teardown
//!
//! Types that implement [`Clean`] and expose it through
//! [`Wire::cleaner`] are queued as they finish building;
//! [`Container::teardown`] cleans them newest first.

pub mod cleanup;
pub mod collection;
pub mod config;
pub mod container;
pub mod descriptors;
pub mod error;
pub mod key;
pub mod observer;
pub mod wiring;

mod cache;
mod registration;

pub use cache::BuildStatus;
pub use cleanup::{Clean, CleanResult};
pub use collection::ContainerBuilder;
pub use config::{ContainerOptions, CycleMode, RepeatTeardown};
pub use container::Container;
pub use descriptors::ServiceDescriptor;
pub use error::{CleanupFailure, DiError, DiResult};
pub use key::{key_of_type, Key};
pub use observer::BuildObserver;
pub use wiring::{tag, Inject, InjectSpec, Wire, Wiring};
