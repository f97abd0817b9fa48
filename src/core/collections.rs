//! Collection aliases used throughout the crate.
//!
//! Centralising these keeps the storage backend and hasher choices in one
//! place: simplex storage is a slotmap, scratch maps use `FxHash`, and
//! per-facet data lives in stack-allocated `SmallVec` buffers.

use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use smallvec::SmallVec;

#[cfg(not(feature = "dense-slotmap"))]
use slotmap::SlotMap;

#[cfg(feature = "dense-slotmap")]
use slotmap::DenseSlotMap;

pub use uuid::Uuid;


// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Storage backend for simplices.
///
/// `DenseSlotMap` by default; build with `--no-default-features` to use
/// `SlotMap` instead. Public APIs hand out
/// [`SimplexKey`](crate::core::triangulation::SimplexKey)s and iterators, never
/// the map itself.
#[cfg(not(feature = "dense-slotmap"))]
pub type StorageMap<K, V> = SlotMap<K, V>;

/// Storage backend for simplices.
///
/// `DenseSlotMap` by default; build with `--no-default-features` to use
/// `SlotMap` instead. Public APIs hand out
/// [`SimplexKey`](crate::core::triangulation::SimplexKey)s and iterators, never
/// the map itself.
#[cfg(feature = "dense-slotmap")]
pub type StorageMap<K, V> = DenseSlotMap<K, V>;

// =============================================================================
// HASHING
// =============================================================================

/// `HashMap` keyed with `FxHasher`.
///
/// Not DoS-resistant; only used with internal keys.
///
/// # Examples
///
/// ```rust
/// use gluing::core::collections::FastHashMap;
///
/// let mut map: FastHashMap<u64, usize> = FastHashMap::default();
/// map.insert(7, 3);
/// assert_eq!(map[&7], 3);
/// ```
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// `HashSet` keyed with `FxHasher`.
pub type FastHashSet<T> = FxHashSet<T>;

/// Build hasher behind [`FastHashMap`] and [`FastHashSet`].
pub type FastBuildHasher = FxBuildHasher;

/// Creates a [`FastHashMap`] with room for `capacity` entries.
#[must_use]
pub fn fast_hash_map_with_capacity<K, V>(capacity: usize) -> FastHashMap<K, V> {
    FastHashMap::with_capacity_and_hasher(capacity, FastBuildHasher::default())
}

/// Creates a [`FastHashSet`] with room for `capacity` entries.
#[must_use]
pub fn fast_hash_set_with_capacity<T>(capacity: usize) -> FastHashSet<T> {
    FastHashSet::with_capacity_and_hasher(capacity, FastBuildHasher::default())
}

// =============================================================================
// SMALL BUFFERS
// =============================================================================

/// Largest supported number of vertices per simplex.
///
/// Triangulations are supported up to dimension `MAX_PRACTICAL_DIMENSION_SIZE - 1`.
pub const MAX_PRACTICAL_DIMENSION_SIZE: usize = 8;

/// Stack-first vector; spills to the heap past `N` elements.
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

/// One entry per facet (or per vertex) of a simplex.
pub type FacetBuffer<T> = SmallBuffer<T, MAX_PRACTICAL_DIMENSION_SIZE>;

/// Embeddings of a facet in the skeleton: one for boundary facets, two for
/// internal ones.
pub type FacetEmbeddingBuffer<T> = SmallBuffer<T, 2>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_helpers_reserve() {
        let map = fast_hash_map_with_capacity::<u64, usize>(64);
        assert!(map.capacity() >= 64);
        let set = fast_hash_set_with_capacity::<u64>(32);
        assert!(set.capacity() >= 32);
    }

    #[test]
    fn facet_buffer_stays_inline_up_to_capacity() {
        let mut buffer: FacetBuffer<usize> = FacetBuffer::new();
        for i in 0..MAX_PRACTICAL_DIMENSION_SIZE {
            buffer.push(i);
        }
        assert!(!buffer.spilled());
        buffer.push(99);
        assert!(buffer.spilled());
    }
}
