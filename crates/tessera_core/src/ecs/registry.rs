//! # Registry
//!
//! The central container: entity ids, one store per component type, and the
//! cached groups.
//!
//! ## Ownership
//!
//! ```text
//! Registry
//! ├── EntityAllocator      monotonic ids, never recycled
//! ├── alive: SparseSet     O(1) liveness
//! ├── StoreTable           ComponentTag -> ComponentStore<T> (+ signals)
//! └── groups               type-set hash -> GroupCache
//! ```
//!
//! Dropping the registry drops every store and group it owns.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, trace, warn};

use super::component::{Component, ComponentTag};
use super::entity::{EntityAllocator, EntityId};
use super::group::{Group, GroupCache};
use super::query::{GroupQuery, Query};
use super::sparse_set::SparseSet;
use super::storage::{ComponentStore, StoreTable};
use super::view::{View, ViewMut};
use crate::config::RegistryConfig;
use crate::error::{EcsError, EcsResult};

/// Entity/component registry of one scene.
///
/// # Example
///
/// ```rust
/// use tessera_core::{Component, Registry};
///
/// struct Position(f32, f32);
/// impl Component for Position {}
///
/// struct Velocity(f32, f32);
/// impl Component for Velocity {}
///
/// let mut registry = Registry::new();
/// let ship = registry.create()?;
/// registry.add_component(ship, Position(0.0, 0.0))?;
/// registry.add_component(ship, Velocity(1.0, 0.5))?;
///
/// registry.view_mut::<(Position, Velocity)>().each(|_, pos, vel| {
///     pos.0 += vel.0;
///     pos.1 += vel.1;
/// });
///
/// assert_eq!(registry.get_component::<Position>(ship)?.0, 1.0);
/// # Ok::<(), tessera_core::EcsError>(())
/// ```
pub struct Registry {
    /// Process-unique identity, checked by group handles.
    id: u64,
    config: RegistryConfig,
    entities: EntityAllocator,
    alive: SparseSet,
    stores: StoreTable,
    /// Groups bucketed by the hash of their ordered tag list.
    groups: HashMap<u64, Vec<Rc<GroupCache>>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates a registry with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::from_valid_config(RegistryConfig::default())
    }

    /// Creates a registry sized by `config`.
    ///
    /// # Errors
    ///
    /// [`EcsError::InvalidConfig`] if the config fails validation.
    pub fn with_config(config: RegistryConfig) -> EcsResult<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: RegistryConfig) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            entities: EntityAllocator::new(config.max_entities),
            alive: SparseSet::new(config.max_entities),
            stores: StoreTable::new(config.max_entities, config.initial_component_capacity),
            groups: HashMap::new(),
            config,
        }
    }

    /// Returns the configuration this registry was built with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // =========================================================================
    // Entities
    // =========================================================================

    /// Creates a new entity with a never-used id.
    ///
    /// # Errors
    ///
    /// [`EcsError::EntityLimitReached`] once `max_entities` ids were issued.
    pub fn create(&mut self) -> EcsResult<EntityId> {
        let Some(entity) = self.entities.allocate() else {
            warn!(limit = self.entities.limit(), "entity limit reached");
            return Err(EcsError::EntityLimitReached {
                limit: self.entities.limit(),
            });
        };
        self.alive.insert(entity.raw());
        Ok(entity)
    }

    /// Destroys an entity, removing it from every store.
    ///
    /// Unknown and already destroyed entities are ignored. Cost is linear in
    /// the number of component types, not in the entity's component count.
    pub fn destroy(&mut self, entity: EntityId) {
        let was_alive = self.alive.remove(entity.raw());
        let removed = self.stores.remove_all(entity);
        trace!(entity = entity.raw(), was_alive, removed, "entity destroyed");
    }

    /// Checks if `entity` was created and not destroyed.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.alive.contains(entity.raw())
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.alive.len()
    }

    /// Number of ids issued over the registry's lifetime.
    #[inline]
    #[must_use]
    pub fn issued_count(&self) -> u32 {
        self.entities.issued()
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Returns the store of `C`, creating it on first use.
    ///
    /// The store is read-only: membership changes go through the registry
    /// so that groups see them.
    ///
    /// ```rust,compile_fail
    /// use tessera_core::{Component, Registry};
    ///
    /// struct Tag;
    /// impl Component for Tag {}
    ///
    /// let mut registry = Registry::new();
    /// let e = registry.create().unwrap();
    /// registry.assure::<Tag>().discard(e);
    /// ```
    pub fn assure<C: Component>(&mut self) -> &ComponentStore<C> {
        self.stores.assure_store::<C>()
    }

    /// Returns the store of `C`, if one was created.
    #[must_use]
    pub fn store<C: Component>(&self) -> Option<&ComponentStore<C>> {
        self.stores.get::<C>()
    }

    /// Adds a component to an entity.
    ///
    /// # Errors
    ///
    /// - [`EcsError::DeadEntity`] if the entity was never created or was
    ///   destroyed
    /// - [`EcsError::DuplicateComponent`] if the entity already has `C`; use
    ///   [`Registry::insert_or_replace_component`] to overwrite
    pub fn add_component<C: Component>(&mut self, entity: EntityId, component: C) -> EcsResult<()> {
        self.ensure_alive(entity)?;
        self.stores.insert(entity, component)
    }

    /// Adds a component, overwriting the current one if present.
    ///
    /// # Errors
    ///
    /// [`EcsError::DeadEntity`] if the entity was never created or was
    /// destroyed.
    pub fn insert_or_replace_component<C: Component>(
        &mut self,
        entity: EntityId,
        component: C,
    ) -> EcsResult<()> {
        self.ensure_alive(entity)?;
        self.stores.insert_or_replace(entity, component);
        Ok(())
    }

    fn ensure_alive(&self, entity: EntityId) -> EcsResult<()> {
        if self.is_alive(entity) {
            Ok(())
        } else {
            Err(EcsError::DeadEntity { entity })
        }
    }

    /// Gets an entity's component.
    ///
    /// # Errors
    ///
    /// [`EcsError::MissingComponent`] if the entity has no `C`.
    pub fn get_component<C: Component>(&self, entity: EntityId) -> EcsResult<&C> {
        self.try_get_component(entity)
            .ok_or_else(|| missing::<C>(entity))
    }

    /// Gets an entity's component mutably.
    ///
    /// # Errors
    ///
    /// [`EcsError::MissingComponent`] if the entity has no `C`.
    pub fn get_component_mut<C: Component>(&mut self, entity: EntityId) -> EcsResult<&mut C> {
        self.stores
            .get_mut::<C>()
            .and_then(|store| store.get_mut(entity))
            .ok_or_else(|| missing::<C>(entity))
    }

    /// Gets an entity's component, if it has one.
    #[must_use]
    pub fn try_get_component<C: Component>(&self, entity: EntityId) -> Option<&C> {
        self.stores.get::<C>()?.get(entity)
    }

    /// Checks if an entity has a component. O(1).
    #[must_use]
    pub fn has_component<C: Component>(&self, entity: EntityId) -> bool {
        self.stores.get::<C>().is_some_and(|store| store.contains(entity))
    }

    /// Removes an entity's component, returning it.
    ///
    /// Removing an absent component does nothing and notifies no one.
    pub fn remove_component<C: Component>(&mut self, entity: EntityId) -> Option<C> {
        self.stores.remove::<C>(entity)
    }

    /// Number of component types with a store.
    #[inline]
    #[must_use]
    pub fn component_type_count(&self) -> usize {
        self.stores.len()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Builds a read-only view over every entity holding all of `Q`.
    #[must_use]
    pub fn view<Q: Query>(&self) -> View<'_, Q> {
        View::new(&self.stores)
    }

    /// Builds a view yielding mutable components.
    #[must_use]
    pub fn view_mut<Q: Query>(&mut self) -> ViewMut<'_, Q> {
        ViewMut::new(&mut self.stores)
    }

    /// Returns the group over `Q`, building it on first request.
    ///
    /// The first request seeds the cache from an equivalent view and wires it
    /// to every participating store. Later requests return a handle onto the
    /// same cache.
    pub fn group<Q: GroupQuery>(&mut self) -> Group<Q> {
        let tags = Q::assure(&mut self.stores);
        let tags = tags.as_ref();
        let key = signature_hash(tags);

        let bucket = self.groups.entry(key).or_default();
        if let Some(cache) = bucket.iter().find(|cache| cache.tags() == tags) {
            return Group::new(Rc::clone(cache));
        }

        let cache = Rc::new(GroupCache::build(
            self.id,
            &self.stores,
            tags,
            self.config.max_entities,
        ));
        GroupCache::connect(&cache, &mut self.stores);
        debug!(
            signature = ?tags,
            backfilled = cache.len(),
            "group built"
        );
        bucket.push(Rc::clone(&cache));
        Group::new(cache)
    }

    /// Number of distinct groups built so far.
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn stores(&self) -> &StoreTable {
        &self.stores
    }

    pub(crate) fn stores_mut(&mut self) -> &mut StoreTable {
        &mut self.stores
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("alive", &self.alive.len())
            .field("issued", &self.entities.issued())
            .field("stores", &self.stores)
            .field("groups", &self.group_count())
            .finish_non_exhaustive()
    }
}

fn missing<C: Component>(entity: EntityId) -> EcsError {
    EcsError::MissingComponent {
        entity,
        component: C::component_name(),
    }
}

/// Hash of an ordered type-set.
fn signature_hash(tags: &[ComponentTag]) -> u64 {
    let mut hasher = DefaultHasher::new();
    tags.hash(&mut hasher);
    hasher.finish()
}
