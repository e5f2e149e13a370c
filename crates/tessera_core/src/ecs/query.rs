//! # Query Signatures
//!
//! A signature is a tuple of component types, e.g. `(Position, Velocity)`.
//! Views accept tuples of one to four types, groups two or three.

use super::component::{Component, ComponentTag, ComponentTypes};
use super::storage::StoreTable;

/// Tuple of component types a view or group matches against.
pub trait Query: 'static {
    /// Number of component types in the signature.
    const COUNT: usize;

    /// Tags of the signature, in signature order.
    type Tags: AsRef<[ComponentTag]> + Copy + std::fmt::Debug;

    /// Resolves the tags, or `None` if some type has no store yet.
    fn tags(types: &ComponentTypes) -> Option<Self::Tags>;

    /// Resolves the tags, creating missing stores.
    fn assure(stores: &mut StoreTable) -> Self::Tags;
}

/// Signatures a [`Group`](super::Group) can be built over.
pub trait GroupQuery: Query {}

macro_rules! impl_query {
    ($count:literal; $($name:ident),+) => {
        impl<$($name: Component),+> Query for ($($name,)+) {
            const COUNT: usize = $count;

            type Tags = [ComponentTag; $count];

            #[inline]
            fn tags(types: &ComponentTypes) -> Option<Self::Tags> {
                Some([$(types.get::<$name>()?),+])
            }

            fn assure(stores: &mut StoreTable) -> Self::Tags {
                [$(stores.assure::<$name>()),+]
            }
        }
    };
}

impl_query!(1; A);
impl_query!(2; A, B);
impl_query!(3; A, B, C);
impl_query!(4; A, B, C, D);

impl<A: Component, B: Component> GroupQuery for (A, B) {}
impl<A: Component, B: Component, C: Component> GroupQuery for (A, B, C) {}

/// Picks the store with the fewest members as the candidate stream.
///
/// # Returns
///
/// Position of the driver within `tags` and its cardinality. Ties go to the
/// earliest tag, which nothing may rely on.
#[inline]
pub(crate) fn smallest(stores: &StoreTable, tags: &[ComponentTag]) -> (usize, usize) {
    tags.iter()
        .enumerate()
        .map(|(pos, tag)| (pos, stores.erased(*tag).len()))
        .min_by_key(|&(_, len)| len)
        .unwrap_or((0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct A;
    impl Component for A {}
    struct B;
    impl Component for B {}

    #[test]
    fn test_tags_require_every_store() {
        let mut stores = StoreTable::new(8, 0);
        stores.assure::<A>();
        assert!(<(A, B)>::tags(stores.types()).is_none());

        let assured = <(A, B)>::assure(&mut stores);
        assert_eq!(<(A, B)>::tags(stores.types()), Some(assured));
        assert_eq!(<(B, A)>::tags(stores.types()), Some([assured[1], assured[0]]));
        assert_eq!(<(A, B)>::COUNT, 2);
    }

    #[test]
    fn test_smallest_picks_fewest_members() {
        let mut stores = StoreTable::new(8, 0);
        let [a, b] = <(A, B)>::assure(&mut stores);
        for raw in 0..3 {
            stores.insert(crate::ecs::EntityId::new(raw), A).unwrap();
        }
        stores.insert(crate::ecs::EntityId::new(1), B).unwrap();

        assert_eq!(smallest(&stores, &[a, b]), (1, 1));
        assert_eq!(smallest(&stores, &[b, a]), (0, 1));
    }
}
