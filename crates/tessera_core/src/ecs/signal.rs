//! # Store Signals
//!
//! Per-store subscriber lists. A store's sink is fired synchronously right
//! after the store's own state changed, in registration order. There is no
//! global event bus: every subscriber is attached to exactly one store.

use super::entity::EntityId;
use super::storage::StoreTable;

/// Membership change reported by a component store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreEvent {
    /// The entity gained the component.
    Added,
    /// The entity lost the component.
    Removed,
}

/// Callback attached to a store.
///
/// Receives the entity and read access to every store, so a subscriber can
/// inspect the entity's other components. It cannot mutate stores.
pub type Subscriber = Box<dyn Fn(EntityId, &StoreTable)>;

/// Subscriber lists of one store.
#[derive(Default)]
pub struct Sink {
    on_add: Vec<Subscriber>,
    on_remove: Vec<Subscriber>,
}

impl Sink {
    /// Creates a sink without subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a subscriber for `event`.
    pub fn connect(&mut self, event: StoreEvent, subscriber: Subscriber) {
        match event {
            StoreEvent::Added => self.on_add.push(subscriber),
            StoreEvent::Removed => self.on_remove.push(subscriber),
        }
    }

    /// Subscribers of `event`, in registration order.
    #[inline]
    #[must_use]
    pub fn subscribers(&self, event: StoreEvent) -> &[Subscriber] {
        match event {
            StoreEvent::Added => &self.on_add,
            StoreEvent::Removed => &self.on_remove,
        }
    }

    /// Invokes every subscriber of `event`.
    #[inline]
    pub(crate) fn publish(&self, event: StoreEvent, entity: EntityId, stores: &StoreTable) {
        for subscriber in self.subscribers(event) {
            subscriber(entity, stores);
        }
    }
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink")
            .field("on_add", &self.on_add.len())
            .field("on_remove", &self.on_remove.len())
            .finish()
    }
}
