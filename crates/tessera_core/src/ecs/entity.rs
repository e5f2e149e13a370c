//! # Entity Management
//!
//! Entities are plain integer handles. They carry no data of their own and
//! are never recycled: the allocator hands out ids from a monotonic counter
//! until the registry's universe is exhausted.

use std::fmt;

/// Unique identifier for an entity.
///
/// The value doubles as the entity's slot in every sparse set of the
/// owning registry, so it is always below the registry's `max_entities`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct EntityId(u32);

impl EntityId {
    /// Null/invalid entity ID. Lies outside every universe.
    pub const NULL: Self = Self(u32::MAX);

    /// Wraps a raw id.
    #[inline]
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the id as an index into sparse arrays.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Checks if this entity ID is null/invalid.
    #[inline]
    #[must_use]
    pub const fn is_null(self) -> bool {
        self.0 == u32::MAX
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::NULL
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic id source.
///
/// Ids are issued in order `0, 1, 2, ..` and the counter never moves
/// backwards, so a destroyed id can never alias a newer entity.
#[derive(Debug)]
pub struct EntityAllocator {
    next: u32,
    limit: u32,
}

impl EntityAllocator {
    /// Creates an allocator issuing ids in `[0, limit)`.
    #[must_use]
    pub const fn new(limit: u32) -> Self {
        Self { next: 0, limit }
    }

    /// Issues the next id, or `None` once the universe is exhausted.
    #[inline]
    pub fn allocate(&mut self) -> Option<EntityId> {
        if self.next >= self.limit {
            return None;
        }
        let id = EntityId(self.next);
        self.next += 1;
        Some(id)
    }

    /// Number of ids issued so far.
    #[inline]
    #[must_use]
    pub const fn issued(&self) -> u32 {
        self.next
    }

    /// Exclusive upper bound of issued ids.
    #[inline]
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }
}
