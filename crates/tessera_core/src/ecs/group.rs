//! # Groups
//!
//! A group is a view that is materialized once and then kept in sync by the
//! participating stores' signals instead of being recomputed.
//!
//! ## Lifecycle
//!
//! ```text
//! Created --(backfill from an equivalent view)--> Live
//! ```
//!
//! While live, the group listens to every participating store:
//!
//! - `Added(id)`: cache `id` if every participating store now holds it.
//!   Components attached one call at a time only qualify on the last one,
//!   whatever the order.
//! - `Removed(id)`: evict `id`. Losing any one component disqualifies.
//!
//! There is no teardown: a group lives as long as its registry.

use std::cell::{Ref, RefCell, RefMut};
use std::marker::PhantomData;
use std::rc::Rc;

use super::component::{Component, ComponentTag};
use super::entity::EntityId;
use super::query::GroupQuery;
use super::signal::{StoreEvent, Subscriber};
use super::sparse_set::SparseSet;
use super::storage::{ComponentStore, StoreTable};
use crate::Registry;

/// State shared between a group's handles and its subscribers.
pub(crate) struct GroupCache {
    /// Identity of the registry whose stores feed this cache.
    owner: u64,
    tags: Box<[ComponentTag]>,
    members: RefCell<SparseSet>,
}

impl GroupCache {
    /// Builds the cache and seeds it from the current stores.
    pub(crate) fn build(
        owner: u64,
        stores: &StoreTable,
        tags: &[ComponentTag],
        universe: u32,
    ) -> Self {
        let mut members = SparseSet::new(universe);
        let (driver, len) = super::query::smallest(stores, tags);
        if len > 0 {
            for &raw in stores.erased(tags[driver]).entity_ids() {
                let entity = EntityId::new(raw);
                if tags.iter().all(|tag| stores.erased(*tag).contains(entity)) {
                    members.insert(raw);
                }
            }
        }
        Self {
            owner,
            tags: tags.into(),
            members: RefCell::new(members),
        }
    }

    pub(crate) fn tags(&self) -> &[ComponentTag] {
        &self.tags
    }

    pub(crate) fn len(&self) -> usize {
        self.members.borrow().len()
    }

    fn check_owner(&self, registry: &Registry) {
        assert_eq!(
            self.owner,
            registry.id(),
            "group used with a registry that did not build it"
        );
    }

    fn members_mut(&self) -> RefMut<'_, SparseSet> {
        match self.members.try_borrow_mut() {
            Ok(members) => members,
            Err(_) => panic!(
                "structural mutation of a group's component while the group is being iterated"
            ),
        }
    }

    fn on_added(&self, entity: EntityId, stores: &StoreTable) {
        if self.tags.iter().all(|tag| stores.erased(*tag).contains(entity)) {
            self.members_mut().insert(entity.raw());
        }
    }

    fn on_removed(&self, entity: EntityId) {
        self.members_mut().remove(entity.raw());
    }

    /// Wires the cache to every participating store.
    pub(crate) fn connect(cache: &Rc<Self>, stores: &mut StoreTable) {
        for &tag in cache.tags.iter() {
            stores.subscribe(tag, StoreEvent::Added, added_subscriber(Rc::clone(cache)));
            stores.subscribe(tag, StoreEvent::Removed, removed_subscriber(Rc::clone(cache)));
        }
    }
}

fn added_subscriber(cache: Rc<GroupCache>) -> Subscriber {
    Box::new(move |entity: EntityId, stores: &StoreTable| cache.on_added(entity, stores))
}

fn removed_subscriber(cache: Rc<GroupCache>) -> Subscriber {
    Box::new(move |entity: EntityId, _: &StoreTable| cache.on_removed(entity))
}

/// Handle onto a cached, incrementally maintained set of the entities
/// holding all of `Q`.
///
/// Handles are cheap to clone; every handle for one signature of one
/// registry shares the same cache.
///
/// # Panics
///
/// Adding or removing a participating component while an iterator of this
/// group is alive panics: a swap-remove under the cursor could skip or
/// repeat entities.
pub struct Group<Q: GroupQuery> {
    cache: Rc<GroupCache>,
    _marker: PhantomData<Q>,
}

impl<Q: GroupQuery> Clone for Group<Q> {
    fn clone(&self) -> Self {
        Self::new(Rc::clone(&self.cache))
    }
}

impl<Q: GroupQuery> std::fmt::Debug for Group<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("tags", &self.cache.tags)
            .field("len", &self.cache.len())
            .finish()
    }
}

impl<Q: GroupQuery> Group<Q> {
    pub(crate) fn new(cache: Rc<GroupCache>) -> Self {
        Self {
            cache,
            _marker: PhantomData,
        }
    }

    /// Number of cached entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Checks if no entity is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checks if `entity` is cached.
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.cache.members.borrow().contains(entity.raw())
    }

    /// Checks if both handles share one cache.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cache, &other.cache)
    }

    /// Iterates over cached entities.
    ///
    /// The iterator holds a read borrow on the cache until dropped.
    #[must_use]
    pub fn iter(&self) -> GroupIter<'_> {
        GroupIter {
            members: self.cache.members.borrow(),
            cursor: 0,
        }
    }

    /// Collects the cached entities.
    #[must_use]
    pub fn to_vec(&self) -> Vec<EntityId> {
        self.iter().collect()
    }
}

impl<'g, Q: GroupQuery> IntoIterator for &'g Group<Q> {
    type Item = EntityId;
    type IntoIter = GroupIter<'g>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entities of a [`Group`].
pub struct GroupIter<'g> {
    members: Ref<'g, SparseSet>,
    cursor: usize,
}

impl Iterator for GroupIter<'_> {
    type Item = EntityId;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let raw = *self.members.as_slice().get(self.cursor)?;
        self.cursor += 1;
        Some(EntityId::new(raw))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.members.len() - self.cursor;
        (left, Some(left))
    }
}

impl ExactSizeIterator for GroupIter<'_> {}

macro_rules! impl_group_each {
    ($($name:ident $var:ident),+) => {
        impl<$($name: Component),+> Group<($($name,)+)> {
            /// Calls `f` with every cached entity and its components.
            ///
            /// # Panics
            ///
            /// Panics if `registry` is not the one that built this group.
            pub fn each<F>(&self, registry: &Registry, mut f: F)
            where
                F: FnMut(EntityId, $(&$name),+),
            {
                self.cache.check_owner(registry);
                let stores = registry.stores();
                let ($(Some($var),)+) = ($(stores.get::<$name>(),)+) else {
                    return;
                };
                for entity in self.iter() {
                    if let ($(Some($var),)+) = ($($var.get(entity),)+) {
                        f(entity, $($var),+);
                    }
                }
            }

            /// Calls `f` with every cached entity and mutable access to its
            /// components.
            ///
            /// # Panics
            ///
            /// Panics if `registry` is not the one that built this group.
            pub fn each_mut<F>(&self, registry: &mut Registry, mut f: F)
            where
                F: FnMut(EntityId, $(&mut $name),+),
            {
                self.cache.check_owner(registry);
                let stores = registry.stores_mut();
                let tags = [$(stores.assure::<$name>()),+];
                let [$($var),+] = stores.disjoint_mut(tags);
                let ($(Some($var),)+) = ($(
                    $var.and_then(|store| store.as_any_mut().downcast_mut::<ComponentStore<$name>>()),
                )+) else {
                    return;
                };
                for entity in self.iter() {
                    if let ($(Some($var),)+) = ($($var.get_mut(entity),)+) {
                        f(entity, $($var),+);
                    }
                }
            }
        }
    };
}

impl_group_each!(A a, B b);
impl_group_each!(A a, B b, C c);

#[cfg(test)]
mod tests {
    use super::*;

    struct A;
    impl Component for A {}
    struct B;
    impl Component for B {}

    fn e(raw: u32) -> EntityId {
        EntityId::new(raw)
    }

    fn live_cache(stores: &mut StoreTable) -> Rc<GroupCache> {
        let tags = [stores.assure::<A>(), stores.assure::<B>()];
        let cache = Rc::new(GroupCache::build(0, stores, &tags, 16));
        GroupCache::connect(&cache, stores);
        cache
    }

    #[test]
    fn test_backfill_matches_intersection() {
        let mut stores = StoreTable::new(16, 0);
        for raw in [1, 2, 3] {
            stores.insert(e(raw), A).unwrap();
        }
        for raw in [2, 3, 4] {
            stores.insert(e(raw), B).unwrap();
        }
        let group = Group::<(A, B)>::new(live_cache(&mut stores));
        let mut members = group.to_vec();
        members.sort();
        assert_eq!(members, vec![e(2), e(3)]);
    }

    #[test]
    fn test_signals_keep_cache_in_sync() {
        let mut stores = StoreTable::new(16, 0);
        let group = Group::<(A, B)>::new(live_cache(&mut stores));

        stores.insert(e(5), B).unwrap();
        assert!(!group.contains(e(5)));
        stores.insert(e(5), A).unwrap();
        assert!(group.contains(e(5)));

        stores.remove::<B>(e(5));
        assert!(!group.contains(e(5)));
        assert!(group.is_empty());
    }

    #[test]
    #[should_panic(expected = "while the group is being iterated")]
    fn test_mutation_during_iteration_panics() {
        let mut stores = StoreTable::new(16, 0);
        let group = Group::<(A, B)>::new(live_cache(&mut stores));
        stores.insert(e(1), A).unwrap();
        stores.insert(e(1), B).unwrap();

        for entity in &group {
            stores.remove::<A>(entity);
        }
    }

    #[test]
    fn test_clones_share_cache() {
        let mut stores = StoreTable::new(16, 0);
        let group = Group::<(A, B)>::new(live_cache(&mut stores));
        let other = group.clone();
        assert!(group.ptr_eq(&other));

        stores.insert(e(0), A).unwrap();
        stores.insert(e(0), B).unwrap();
        assert_eq!(other.len(), 1);
        assert_eq!(group.iter().len(), 1);
    }
}
