//! # Component Storage
//!
//! One [`ComponentStore`] per component type: a [`SparseSet`] of entity ids
//! plus a payload array kept index-synchronized with the set's dense window.
//!
//! ```text
//! set.dense: [ e4 | e1 | e9 ]
//! payload:   [ p4 | p1 | p9 ]     payload[i] belongs to set.dense[i]
//! ```
//!
//! Removal swap-removes both arrays in lock-step, so the pairing survives.
//!
//! Stores only change membership through the [`StoreTable`], which fires the
//! store's [`Sink`] after each change. No-op operations fire nothing.

use std::any::Any;

use tracing::debug;

use super::component::{Component, ComponentTag, ComponentTypes};
use super::entity::EntityId;
use super::signal::{Sink, StoreEvent, Subscriber};
use super::sparse_set::SparseSet;
use crate::error::{EcsError, EcsResult};

/// Type-erased, read-only view of a component store.
///
/// This is everything queries need to inspect a store without knowing its
/// payload type: its tag, its membership and its subscriber lists.
/// Membership only changes through [`StoreTable`], so that every change is
/// published.
pub trait ErasedStore: Any {
    /// Tag of the component type held by this store.
    fn tag(&self) -> ComponentTag;

    /// Number of entities holding the component.
    fn len(&self) -> usize;

    /// Checks if no entity holds the component.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks if `entity` holds the component.
    fn contains(&self, entity: EntityId) -> bool;

    /// Live entity ids in dense order.
    fn entity_ids(&self) -> &[u32];

    /// Subscriber lists of this store.
    fn sink(&self) -> &Sink;

    /// Upcast for downcasting to the concrete store.
    fn as_any(&self) -> &dyn Any;
}

/// Mutating half of a type-erased store, reachable only through the table.
pub(crate) trait StoreSlot: ErasedStore {
    /// Removes the entity's component if present, dropping the payload.
    ///
    /// Does not fire the sink; callers publish the event.
    fn discard(&mut self, entity: EntityId) -> bool;

    fn sink_mut(&mut self) -> &mut Sink;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn as_erased(&self) -> &dyn ErasedStore;
}

/// Dense storage for a single component type.
///
/// # Type Parameters
///
/// * `C` - The component type to store
pub struct ComponentStore<C: Component> {
    tag: ComponentTag,
    /// Membership, dense window parallel to `payload`.
    set: SparseSet,
    payload: Vec<C>,
    sink: Sink,
}

impl<C: Component> ComponentStore<C> {
    /// Creates an empty store over the entity universe `[0, universe)`.
    ///
    /// # Arguments
    ///
    /// * `tag` - Tag the owning registry assigned to `C`
    /// * `universe` - Exclusive upper bound of entity ids
    /// * `capacity` - Payload slots reserved up front
    #[must_use]
    pub fn new(tag: ComponentTag, universe: u32, capacity: usize) -> Self {
        Self {
            tag,
            set: SparseSet::new(universe),
            payload: Vec::with_capacity(capacity.min(universe as usize)),
            sink: Sink::new(),
        }
    }

    /// Number of entities holding the component.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.set.len()
    }

    /// Checks if no entity holds the component.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Checks if `entity` holds the component. O(1).
    #[inline]
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.set.contains(entity.raw())
    }

    /// Gets the entity's component.
    #[inline]
    #[must_use]
    pub fn get(&self, entity: EntityId) -> Option<&C> {
        self.set.index(entity.raw()).map(|slot| &self.payload[slot])
    }

    /// Gets the entity's component mutably.
    #[inline]
    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut C> {
        self.set.index(entity.raw()).map(|slot| &mut self.payload[slot])
    }

    /// Entity stored at dense `slot`.
    #[inline]
    #[must_use]
    pub fn entity_at(&self, slot: usize) -> Option<EntityId> {
        self.set.as_slice().get(slot).copied().map(EntityId::new)
    }

    /// Iterates over live entity ids in dense order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.set.iter().map(EntityId::new)
    }

    /// Iterates over `(entity, component)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &C)> + '_ {
        self.entities().zip(self.payload.iter())
    }

    /// Iterates mutably over `(entity, component)` pairs in dense order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (EntityId, &mut C)> + '_ {
        self.set.iter().map(EntityId::new).zip(self.payload.iter_mut())
    }

    /// Adds a component, failing if the entity already has one.
    ///
    /// # Returns
    ///
    /// `Ok(true)` if membership changed. `Ok(false)` only for ids outside
    /// the universe, which are ignored.
    pub(crate) fn insert(&mut self, entity: EntityId, value: C) -> EcsResult<bool> {
        if self.contains(entity) {
            return Err(EcsError::DuplicateComponent {
                entity,
                component: C::component_name(),
            });
        }
        Ok(self.push(entity, value))
    }

    /// Adds or overwrites a component.
    ///
    /// # Returns
    ///
    /// `true` if membership changed; overwriting returns `false`.
    pub(crate) fn insert_or_replace(&mut self, entity: EntityId, value: C) -> bool {
        match self.set.index(entity.raw()) {
            Some(slot) => {
                self.payload[slot] = value;
                false
            }
            None => self.push(entity, value),
        }
    }

    /// Swap-removes the entity's component from both arrays.
    pub(crate) fn remove(&mut self, entity: EntityId) -> Option<C> {
        let slot = self.set.swap_remove(entity.raw())?;
        let value = self.payload.swap_remove(slot);
        debug_assert_eq!(self.set.len(), self.payload.len(), "payload out of sync");
        Some(value)
    }

    fn push(&mut self, entity: EntityId, value: C) -> bool {
        debug_assert!(
            entity.index() < self.set.capacity(),
            "entity {entity} outside universe of {} store",
            C::component_name()
        );
        if !self.set.insert(entity.raw()) {
            return false;
        }
        self.payload.push(value);
        true
    }
}

impl<C: Component> ErasedStore for ComponentStore<C> {
    fn tag(&self) -> ComponentTag {
        self.tag
    }

    fn len(&self) -> usize {
        self.set.len()
    }

    fn contains(&self, entity: EntityId) -> bool {
        self.set.contains(entity.raw())
    }

    fn entity_ids(&self) -> &[u32] {
        self.set.as_slice()
    }

    fn sink(&self) -> &Sink {
        &self.sink
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<C: Component> StoreSlot for ComponentStore<C> {
    fn discard(&mut self, entity: EntityId) -> bool {
        self.remove(entity).is_some()
    }

    fn sink_mut(&mut self) -> &mut Sink {
        &mut self.sink
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_erased(&self) -> &dyn ErasedStore {
        self
    }
}

/// Every component store of a registry, indexed by [`ComponentTag`].
///
/// All membership changes go through here so that each one is followed by
/// its store's notifications.
pub struct StoreTable {
    types: ComponentTypes,
    stores: Vec<Box<dyn StoreSlot>>,
    /// Entity universe shared by every store.
    universe: u32,
    /// Payload slots reserved per new store.
    initial_capacity: usize,
}

impl StoreTable {
    /// Creates an empty table.
    ///
    /// # Arguments
    ///
    /// * `universe` - Exclusive upper bound of entity ids
    /// * `initial_capacity` - Payload slots reserved per store
    #[must_use]
    pub fn new(universe: u32, initial_capacity: usize) -> Self {
        Self {
            types: ComponentTypes::new(),
            stores: Vec::new(),
            universe,
            initial_capacity,
        }
    }

    /// Registered component types.
    #[inline]
    #[must_use]
    pub fn types(&self) -> &ComponentTypes {
        &self.types
    }

    /// Number of stores.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// Checks if no store exists yet.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// Returns the tag of `C`, creating its store on first use.
    pub fn assure<C: Component>(&mut self) -> ComponentTag {
        let (tag, fresh) = self.types.register::<C>();
        if fresh {
            debug_assert_eq!(tag.index(), self.stores.len(), "tags must stay dense");
            self.stores.push(Box::new(ComponentStore::<C>::new(
                tag,
                self.universe,
                self.initial_capacity,
            )));
            debug!(
                component = C::component_name(),
                tag = %tag,
                universe = self.universe,
                "component store created"
            );
        }
        tag
    }

    /// Returns the store of `C`, creating it on first use.
    ///
    /// # Panics
    ///
    /// Never in practice: the store under a type's tag is always of that type.
    pub fn assure_store<C: Component>(&mut self) -> &mut ComponentStore<C> {
        let tag = self.assure::<C>();
        self.typed_mut(tag)
    }

    /// Returns the store of `C`, if it exists.
    #[must_use]
    pub fn get<C: Component>(&self) -> Option<&ComponentStore<C>> {
        let tag = self.types.get::<C>()?;
        self.stores.get(tag.index())?.as_any().downcast_ref()
    }

    /// Returns the store of `C` mutably, if it exists.
    pub fn get_mut<C: Component>(&mut self) -> Option<&mut ComponentStore<C>> {
        let tag = self.types.get::<C>()?;
        self.stores.get_mut(tag.index())?.as_any_mut().downcast_mut()
    }

    /// Returns the type-erased store under `tag`.
    ///
    /// # Panics
    ///
    /// Panics if `tag` was not issued by this table.
    #[inline]
    #[must_use]
    pub fn erased(&self, tag: ComponentTag) -> &dyn ErasedStore {
        self.stores[tag.index()].as_erased()
    }

    /// Iterates over every store.
    pub fn iter(&self) -> impl Iterator<Item = &dyn ErasedStore> + '_ {
        self.stores.iter().map(|store| store.as_erased())
    }

    /// Borrows the stores under `tags` mutably at the same time.
    ///
    /// Unknown tags yield `None` in their position.
    ///
    /// # Panics
    ///
    /// Panics if a tag appears twice: two mutable borrows of one store.
    pub(crate) fn disjoint_mut<const N: usize>(
        &mut self,
        tags: [ComponentTag; N],
    ) -> [Option<&mut dyn StoreSlot>; N] {
        for (i, tag) in tags.iter().enumerate() {
            assert!(
                !tags[i + 1..].contains(tag),
                "component {tag} requested mutably twice in one signature"
            );
        }
        let mut out: [Option<&mut dyn StoreSlot>; N] = std::array::from_fn(|_| None);
        for (index, store) in self.stores.iter_mut().enumerate() {
            if let Some(pos) = tags.iter().position(|tag| tag.index() == index) {
                out[pos] = Some(&mut **store);
            }
        }
        out
    }

    /// Attaches `subscriber` to the store under `tag`.
    pub fn subscribe(&mut self, tag: ComponentTag, event: StoreEvent, subscriber: Subscriber) {
        self.stores[tag.index()].sink_mut().connect(event, subscriber);
    }

    /// Adds a component, failing on duplicates, then fires `Added`.
    ///
    /// # Errors
    ///
    /// [`EcsError::DuplicateComponent`] if the entity already has `C`.
    pub fn insert<C: Component>(&mut self, entity: EntityId, value: C) -> EcsResult<()> {
        let tag = self.assure::<C>();
        if self.typed_mut::<C>(tag).insert(entity, value)? {
            self.publish(tag, StoreEvent::Added, entity);
        }
        Ok(())
    }

    /// Adds or overwrites a component. Fires `Added` only for new members.
    pub fn insert_or_replace<C: Component>(&mut self, entity: EntityId, value: C) {
        let tag = self.assure::<C>();
        if self.typed_mut::<C>(tag).insert_or_replace(entity, value) {
            self.publish(tag, StoreEvent::Added, entity);
        }
    }

    /// Removes the entity's `C` if present, then fires `Removed`.
    pub fn remove<C: Component>(&mut self, entity: EntityId) -> Option<C> {
        let tag = self.types.get::<C>()?;
        let value = self.get_mut::<C>()?.remove(entity)?;
        self.publish(tag, StoreEvent::Removed, entity);
        Some(value)
    }

    /// Removes the entity from every store, firing `Removed` where it was a
    /// member.
    ///
    /// # Returns
    ///
    /// Number of components removed.
    pub fn remove_all(&mut self, entity: EntityId) -> usize {
        let mut removed = 0;
        for index in 0..self.stores.len() {
            if self.stores[index].discard(entity) {
                let tag = self.stores[index].tag();
                self.publish(tag, StoreEvent::Removed, entity);
                removed += 1;
            }
        }
        removed
    }

    fn typed_mut<C: Component>(&mut self, tag: ComponentTag) -> &mut ComponentStore<C> {
        self.stores[tag.index()]
            .as_any_mut()
            .downcast_mut::<ComponentStore<C>>()
            .expect("component tag resolves to a store of its own type")
    }

    fn publish(&self, tag: ComponentTag, event: StoreEvent, entity: EntityId) {
        self.erased(tag).sink().publish(event, entity, self);
    }
}

impl std::fmt::Debug for StoreTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreTable")
            .field("stores", &self.stores.len())
            .field("universe", &self.universe)
            .finish()
    }
}
