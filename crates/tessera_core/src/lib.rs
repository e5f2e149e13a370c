//! # TESSERA Core Engine
//!
//! Entity/component storage for frame-stepped applications:
//! - O(1) add, remove and membership per component type
//! - Uncached views driven by the smallest participating store
//! - Groups kept exactly in sync with live mutations, without rescans
//!
//! ## Architecture Rules
//!
//! 1. **Single-threaded** - one thread drives a registry for the whole frame
//! 2. **No structural mutation during iteration** - views borrow the
//!    registry; group iterators fail fast
//! 3. **Fail fast on programmer errors** - missing or duplicate components
//!    are errors, never silently defaulted
//!
//! ## Example
//!
//! ```rust
//! use tessera_core::{Component, Registry};
//!
//! struct Health(u32);
//! impl Component for Health {}
//!
//! struct Burning;
//! impl Component for Burning {}
//!
//! let mut registry = Registry::new();
//! let torch = registry.create()?;
//! registry.add_component(torch, Health(10))?;
//! registry.add_component(torch, Burning)?;
//!
//! let burning = registry.group::<(Health, Burning)>();
//! burning.each_mut(&mut registry, |_, health, _| health.0 -= 1);
//!
//! assert_eq!(registry.get_component::<Health>(torch)?.0, 9);
//! # Ok::<(), tessera_core::EcsError>(())
//! ```

#![deny(missing_docs)]
#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;

pub use config::RegistryConfig;
pub use ecs::{
    Component, ComponentStore, ComponentTag, EntityId, Group, GroupQuery, Query, Registry,
    SparseSet, StoreEvent, View, ViewMut,
};
pub use error::{EcsError, EcsResult};
