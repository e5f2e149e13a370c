//! # Entity Component System
//!
//! Sparse-set entity/component storage.
//!
//! ## Design Philosophy
//!
//! - Entity ids are plain integers from a monotonic counter, never recycled
//! - Each component type lives in its own store: a sparse set plus a dense
//!   payload array, index-synchronized
//! - Views recompute intersections on every use, driven by the smallest store
//! - Groups cache an intersection and follow store signals incrementally
//! - Single-threaded: no locks, nothing is `Send`

mod component;
mod entity;
mod group;
mod query;
mod registry;
mod signal;
mod sparse_set;
mod storage;
mod view;

pub use component::{Component, ComponentTag, ComponentTypes};
pub use entity::{EntityAllocator, EntityId};
pub use group::{Group, GroupIter};
pub use query::{GroupQuery, Query};
pub use registry::Registry;
pub use signal::{Sink, StoreEvent, Subscriber};
pub use sparse_set::SparseSet;
pub use storage::{ComponentStore, ErasedStore, StoreTable};
pub use view::{View, ViewIter, ViewMut};
