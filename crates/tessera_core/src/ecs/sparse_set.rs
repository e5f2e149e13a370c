//! # Sparse Set
//!
//! Bounded-universe integer set with O(1) insert, remove and membership.
//!
//! ```text
//! sparse: [ 2 | . | 0 | 1 ]      value -> dense index
//! dense:  [ 2 | 3 | 0 ]          live window = dense[..len]
//! ```
//!
//! A value `v` is a member iff `sparse[v] < len && dense[sparse[v]] == v`.
//! Stale entries in `sparse` are never cleared; the check above makes them
//! harmless, which is what lets [`SparseSet::clear`] run in O(1).
//!
//! Removal swaps the last live value into the vacated slot, so the dense
//! order is **not** stable across removals. Nothing may depend on iteration
//! order between ticks.

/// Set of `u32` values drawn from `[0, capacity)`.
///
/// Both backing arrays are allocated once at construction; inserting never
/// allocates.
#[derive(Clone, Debug)]
pub struct SparseSet {
    /// Live values in `[..len]`, stale values past it.
    dense: Box<[u32]>,
    /// Value -> dense index. Only meaningful when it round-trips.
    sparse: Box<[u32]>,
    /// Size of the live window.
    len: usize,
}

impl SparseSet {
    /// Creates an empty set over the universe `[0, capacity)`.
    #[must_use]
    pub fn new(capacity: u32) -> Self {
        let capacity = capacity as usize;
        Self {
            dense: vec![0; capacity].into_boxed_slice(),
            sparse: vec![0; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    /// Returns the universe bound.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.dense.len()
    }

    /// Returns the number of live values.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Checks if the set has no live values.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Checks membership.
    ///
    /// Values outside the universe are never members.
    #[inline]
    #[must_use]
    pub fn contains(&self, value: u32) -> bool {
        self.index(value).is_some()
    }

    /// Returns the dense index of `value`, if it is a member.
    #[inline]
    #[must_use]
    pub fn index(&self, value: u32) -> Option<usize> {
        let slot = *self.sparse.get(value as usize)? as usize;
        (slot < self.len && self.dense[slot] == value).then_some(slot)
    }

    /// Inserts `value` at the end of the live window.
    ///
    /// Values outside the universe and values already present are ignored.
    ///
    /// # Returns
    ///
    /// `true` if the set changed.
    #[inline]
    pub fn insert(&mut self, value: u32) -> bool {
        if value as usize >= self.capacity() || self.contains(value) {
            return false;
        }
        let slot = self.len;
        self.dense[slot] = value;
        // `slot < capacity`, and capacity came from a `u32`.
        self.sparse[value as usize] = slot as u32;
        self.len += 1;
        true
    }

    /// Swap-removes `value`.
    ///
    /// The last live value moves into the vacated slot.
    ///
    /// # Returns
    ///
    /// `true` if the set changed.
    #[inline]
    pub fn remove(&mut self, value: u32) -> bool {
        self.swap_remove(value).is_some()
    }

    /// Swap-removes `value` and reports the dense slot it occupied.
    ///
    /// Stores with a parallel payload array replay the same swap on it.
    #[inline]
    pub(crate) fn swap_remove(&mut self, value: u32) -> Option<usize> {
        let slot = self.index(value)?;
        let last = self.len - 1;
        let moved = self.dense[last];
        self.dense[slot] = moved;
        self.sparse[moved as usize] = slot as u32;
        self.len = last;
        Some(slot)
    }

    /// Empties the live window. Backing arrays are left untouched.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }

    /// Live values in current dense order.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u32] {
        &self.dense[..self.len]
    }

    /// Iterates over live values in current dense order.
    #[inline]
    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'_, u32>> {
        self.as_slice().iter().copied()
    }
}

impl<'a> IntoIterator for &'a SparseSet {
    type Item = u32;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, u32>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
