//! # Component Types
//!
//! Components are plain data records with no behavior. Each concrete type
//! is assigned a [`ComponentTag`] the first time a registry sees it; the tag
//! indexes the registry's table of type-erased stores, so store lookup is a
//! single hash of the `TypeId` followed by a vector index.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;

/// Marker trait for ECS components.
///
/// Any `'static` type can be a component; there is no size, `Copy` or
/// default-value requirement since stores only hold live payloads.
///
/// # Example
///
/// ```rust
/// use tessera_core::Component;
///
/// #[derive(Debug)]
/// struct Health(u32);
///
/// impl Component for Health {}
/// ```
pub trait Component: 'static {
    /// Human-readable name used in errors and logs.
    #[must_use]
    fn component_name() -> &'static str {
        type_name::<Self>()
    }
}

/// Dense per-registry identifier of a component type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComponentTag(u32);

impl ComponentTag {
    pub(crate) const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the tag as an index into the store table.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ComponentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Maps component types to tags, handing out tags in registration order.
#[derive(Debug, Default)]
pub struct ComponentTypes {
    tags: HashMap<TypeId, ComponentTag>,
    names: Vec<&'static str>,
}

impl ComponentTypes {
    /// Creates an empty type table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tag of `C`, if it was registered.
    #[inline]
    #[must_use]
    pub fn get<C: Component>(&self) -> Option<ComponentTag> {
        self.tags.get(&TypeId::of::<C>()).copied()
    }

    /// Returns the tag of `C`, registering it on first use.
    ///
    /// # Returns
    ///
    /// The tag and whether it was freshly assigned.
    pub fn register<C: Component>(&mut self) -> (ComponentTag, bool) {
        if let Some(tag) = self.get::<C>() {
            return (tag, false);
        }
        // Component type count is small and static; it never nears u32::MAX.
        let tag = ComponentTag::new(self.names.len() as u32);
        self.tags.insert(TypeId::of::<C>(), tag);
        self.names.push(C::component_name());
        (tag, true)
    }

    /// Name of the type registered under `tag`.
    #[must_use]
    pub fn name(&self, tag: ComponentTag) -> Option<&'static str> {
        self.names.get(tag.index()).copied()
    }

    /// Number of registered types.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Checks if no type is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Position;
    impl Component for Position {}

    struct Velocity;
    impl Component for Velocity {}

    #[test]
    fn test_tags_are_dense_and_stable() {
        let mut types = ComponentTypes::new();
        assert_eq!(types.get::<Position>(), None);

        let (pos, fresh) = types.register::<Position>();
        assert!(fresh);
        let (vel, fresh) = types.register::<Velocity>();
        assert!(fresh);
        assert_eq!(pos.index(), 0);
        assert_eq!(vel.index(), 1);

        let (again, fresh) = types.register::<Position>();
        assert!(!fresh);
        assert_eq!(again, pos);
        assert_eq!(types.len(), 2);
    }

    #[test]
    fn test_names_follow_tags() {
        let mut types = ComponentTypes::new();
        let (tag, _) = types.register::<Velocity>();
        assert!(types.name(tag).is_some_and(|n| n.ends_with("Velocity")));
    }
}
