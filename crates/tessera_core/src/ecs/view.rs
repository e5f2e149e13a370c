//! # Views
//!
//! Uncached queries. Every iteration recomputes the intersection:
//!
//! 1. Pick the participating store with the fewest members (the driver).
//! 2. Walk the driver's dense ids as candidates.
//! 3. Yield a candidate only if every other participating store holds it.
//!
//! The outer loop is bounded by the smallest store, which dominates the cost
//! of sparse multi-component queries. Results follow the driver's current
//! dense order and are not stable across ticks.
//!
//! A view borrows the registry for its whole lifetime, so adding or removing
//! components while a view is being walked does not compile.

use std::marker::PhantomData;

use super::component::Component;
use super::entity::EntityId;
use super::query::{smallest, Query};
use super::storage::{ComponentStore, ErasedStore, StoreTable};

/// Read-only query over every entity holding all of `Q`.
///
/// # Example
///
/// ```rust,ignore
/// for entity in registry.view::<(Position, Velocity)>() {
///     // ...
/// }
///
/// registry.view::<(Position, Velocity)>().each(|entity, pos, vel| {
///     // ...
/// });
/// ```
pub struct View<'r, Q: Query> {
    stores: &'r StoreTable,
    /// `None` when a participating type has no store: nothing can match.
    tags: Option<Q::Tags>,
    _marker: PhantomData<Q>,
}

impl<'r, Q: Query> View<'r, Q> {
    pub(crate) fn new(stores: &'r StoreTable) -> Self {
        Self {
            stores,
            tags: Q::tags(stores.types()),
            _marker: PhantomData,
        }
    }

    /// Iterates over matching entities.
    #[must_use]
    pub fn iter(&self) -> ViewIter<'r, Q> {
        let candidates: &'r [u32] = match self.tags {
            Some(tags) => {
                let tags = tags.as_ref();
                let (driver, len) = smallest(self.stores, tags);
                if len == 0 {
                    &[]
                } else {
                    self.stores.erased(tags[driver]).entity_ids()
                }
            }
            None => &[],
        };
        ViewIter {
            stores: self.stores,
            tags: self.tags,
            candidates: candidates.iter(),
        }
    }

    /// Checks if `entity` holds every component of the signature.
    #[must_use]
    pub fn contains(&self, entity: EntityId) -> bool {
        self.tags.is_some_and(|tags| {
            tags.as_ref()
                .iter()
                .all(|tag| self.stores.erased(*tag).contains(entity))
        })
    }

    /// Collects the matching entities.
    #[must_use]
    pub fn to_vec(&self) -> Vec<EntityId> {
        self.iter().collect()
    }
}

impl<'r, Q: Query> IntoIterator for View<'r, Q> {
    type Item = EntityId;
    type IntoIter = ViewIter<'r, Q>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'r, Q: Query> IntoIterator for &View<'r, Q> {
    type Item = EntityId;
    type IntoIter = ViewIter<'r, Q>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the entities of a [`View`].
pub struct ViewIter<'r, Q: Query> {
    stores: &'r StoreTable,
    tags: Option<Q::Tags>,
    /// Dense ids of the driver store.
    candidates: std::slice::Iter<'r, u32>,
}

impl<Q: Query> Iterator for ViewIter<'_, Q> {
    type Item = EntityId;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let tags = self.tags?;
        for &raw in self.candidates.by_ref() {
            let entity = EntityId::new(raw);
            // The driver trivially passes its own membership check.
            if tags
                .as_ref()
                .iter()
                .all(|tag| self.stores.erased(*tag).contains(entity))
            {
                return Some(entity);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.candidates.len()))
    }
}

/// Query yielding mutable components, built by
/// [`Registry::view_mut`](super::Registry::view_mut).
///
/// # Panics
///
/// `each` panics if the signature names the same type twice.
pub struct ViewMut<'r, Q: Query> {
    stores: &'r mut StoreTable,
    _marker: PhantomData<Q>,
}

impl<'r, Q: Query> ViewMut<'r, Q> {
    pub(crate) fn new(stores: &'r mut StoreTable) -> Self {
        Self {
            stores,
            _marker: PhantomData,
        }
    }
}

macro_rules! impl_each {
    ($($name:ident $var:ident),+) => {
        impl<'r, $($name: Component),+> View<'r, ($($name,)+)> {
            /// Calls `f` with every matching entity and its components.
            pub fn each<F>(&self, mut f: F)
            where
                F: FnMut(EntityId, $(&$name),+),
            {
                let Some(tags) = self.tags else { return };
                let (driver, len) = smallest(self.stores, &tags);
                if len == 0 {
                    return;
                }
                let ($(Some($var),)+) = ($(self.stores.get::<$name>(),)+) else {
                    return;
                };
                for &raw in self.stores.erased(tags[driver]).entity_ids() {
                    let entity = EntityId::new(raw);
                    if let ($(Some($var),)+) = ($($var.get(entity),)+) {
                        f(entity, $($var),+);
                    }
                }
            }
        }

        impl<'r, $($name: Component),+> ViewMut<'r, ($($name,)+)> {
            /// Calls `f` with every matching entity and mutable access to its
            /// components.
            pub fn each<F>(self, mut f: F)
            where
                F: FnMut(EntityId, $(&mut $name),+),
            {
                let Some(tags) = <($($name,)+) as Query>::tags(self.stores.types()) else {
                    return;
                };
                let (driver, len) = smallest(self.stores, &tags);
                if len == 0 {
                    return;
                }
                let [$($var),+] = self.stores.disjoint_mut(tags);
                let ($(Some($var),)+) = ($(
                    $var.and_then(|store| store.as_any_mut().downcast_mut::<ComponentStore<$name>>()),
                )+) else {
                    return;
                };
                for slot in 0..len {
                    let raw = {
                        let erased: &[&dyn ErasedStore] = &[$(&*$var),+];
                        erased[driver].entity_ids()[slot]
                    };
                    let entity = EntityId::new(raw);
                    if let ($(Some($var),)+) = ($($var.get_mut(entity),)+) {
                        f(entity, $($var),+);
                    }
                }
            }
        }
    };
}

impl_each!(A a);
impl_each!(A a, B b);
impl_each!(A a, B b, C c);
impl_each!(A a, B b, C c, D d);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Position(i32);
    impl Component for Position {}

    #[derive(Debug, PartialEq)]
    struct Velocity(i32);
    impl Component for Velocity {}

    #[derive(Debug, PartialEq)]
    struct Frozen;
    impl Component for Frozen {}

    fn e(raw: u32) -> EntityId {
        EntityId::new(raw)
    }

    fn sorted(mut ids: Vec<EntityId>) -> Vec<EntityId> {
        ids.sort();
        ids
    }

    fn populated() -> StoreTable {
        let mut stores = StoreTable::new(32, 0);
        for raw in 0..10 {
            stores.insert(e(raw), Position(raw as i32)).unwrap();
        }
        for raw in [2, 4, 6, 11] {
            stores.insert(e(raw), Velocity(1)).unwrap();
        }
        stores
    }

    #[test]
    fn test_view_yields_intersection() {
        let stores = populated();
        let view = View::<(Position, Velocity)>::new(&stores);
        assert_eq!(sorted(view.to_vec()), vec![e(2), e(4), e(6)]);
        assert!(view.contains(e(4)));
        assert!(!view.contains(e(11)));
        assert!(!view.contains(e(3)));
    }

    #[test]
    fn test_view_signature_order_does_not_matter() {
        let stores = populated();
        let ab = sorted(View::<(Position, Velocity)>::new(&stores).to_vec());
        let ba = sorted(View::<(Velocity, Position)>::new(&stores).to_vec());
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_view_without_store_is_empty() {
        let stores = populated();
        let view = View::<(Position, Frozen)>::new(&stores);
        assert_eq!(view.iter().next(), None);
        assert!(!view.contains(e(1)));
    }

    #[test]
    fn test_view_with_empty_driver_short_circuits() {
        let mut stores = populated();
        stores.assure::<Frozen>();
        let view = View::<(Position, Frozen)>::new(&stores);
        assert_eq!(view.iter().size_hint(), (0, Some(0)));
        assert_eq!(view.to_vec(), vec![]);
    }

    #[test]
    fn test_view_is_recomputed_each_time() {
        let mut stores = populated();
        assert_eq!(View::<(Velocity, Position)>::new(&stores).iter().count(), 3);

        stores.remove::<Position>(e(4));
        stores.insert(e(11), Position(11)).unwrap();
        assert_eq!(
            sorted(View::<(Velocity, Position)>::new(&stores).to_vec()),
            vec![e(2), e(6), e(11)]
        );
    }

    #[test]
    fn test_each_passes_components() {
        let stores = populated();
        let mut seen = Vec::new();
        View::<(Position, Velocity)>::new(&stores).each(|entity, pos, vel| {
            seen.push((entity.raw(), pos.0, vel.0));
        });
        seen.sort_unstable();
        assert_eq!(seen, vec![(2, 2, 1), (4, 4, 1), (6, 6, 1)]);
    }

    #[test]
    fn test_each_mut_edits_in_place() {
        let mut stores = populated();
        ViewMut::<(Position, Velocity)>::new(&mut stores).each(|_, pos, vel| {
            pos.0 += vel.0 * 100;
            vel.0 = 0;
        });

        let positions = stores.get::<Position>().unwrap();
        assert_eq!(positions.get(e(2)), Some(&Position(102)));
        assert_eq!(positions.get(e(3)), Some(&Position(3)));
        assert_eq!(stores.get::<Velocity>().unwrap().get(e(11)), Some(&Velocity(1)));
    }

    #[test]
    fn test_single_type_view_walks_whole_store() {
        let stores = populated();
        assert_eq!(View::<(Velocity,)>::new(&stores).iter().count(), 4);
    }

    #[test]
    #[should_panic(expected = "requested mutably twice")]
    fn test_each_mut_rejects_repeated_type() {
        let mut stores = populated();
        ViewMut::<(Position, Position)>::new(&mut stores).each(|_, _, _| {});
    }
}
