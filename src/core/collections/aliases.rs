use rustc_hash::{FxBuildHasher, FxHashMap, FxHashSet};
use smallvec::SmallVec;

#[cfg(not(feature = "dense-slotmap"))]
use slotmap::SlotMap;

#[cfg(feature = "dense-slotmap")]
use slotmap::DenseSlotMap;

/// Largest hull dimension supported by the engine.
///
/// Delaunay triangulations of 3D input run the hull engine on 4D lifted
/// points, so every per-face buffer is sized for four entries.
pub const MAX_DIMENSION: usize = 4;

// =============================================================================
// STORAGE BACKEND
// =============================================================================

/// Internal storage backend for the working-object pools.
///
/// This type alias abstracts over the concrete storage implementation,
/// allowing the choice between `DenseSlotMap` (**default**) and `SlotMap`
/// (when built with `--no-default-features`) without exposing the choice
/// in public APIs.
///
/// # Feature Flags
///
/// - **default**: Uses `DenseSlotMap` (enabled via the default `dense-slotmap` feature)
/// - **--no-default-features**: Uses `SlotMap` for comparison and experimentation
#[cfg(not(feature = "dense-slotmap"))]
pub type StorageMap<K, V> = SlotMap<K, V>;

/// Internal storage backend for the working-object pools (`DenseSlotMap`).
#[cfg(feature = "dense-slotmap")]
pub type StorageMap<K, V> = DenseSlotMap<K, V>;

// =============================================================================
// CORE OPTIMIZED TYPES
// =============================================================================

/// Optimized `HashMap` type for performance-critical operations.
/// Uses `rustc_hash::FxHasher` for faster hashing in non-cryptographic contexts.
///
/// # Security Warning
///
/// ⚠️ **Not DoS-resistant**: Do not use with attacker-controlled keys.
///
/// # Examples
///
/// ```rust
/// use hull_diagrams::core::collections::FastHashMap;
///
/// let mut map: FastHashMap<u64, usize> = FastHashMap::default();
/// map.insert(123, 456);
/// ```
pub type FastHashMap<K, V> = FxHashMap<K, V>;

/// Build hasher for the Fx-hashed collections.
pub type FastBuildHasher = FxBuildHasher;

/// Optimized `HashSet` type for membership tests in the hot loops.
///
/// # Examples
///
/// ```rust
/// use hull_diagrams::core::collections::FastHashSet;
///
/// let mut set: FastHashSet<usize> = FastHashSet::default();
/// set.insert(7);
/// assert!(set.contains(&7));
/// ```
pub type FastHashSet<T> = FxHashSet<T>;

/// Small-optimized Vec that uses stack allocation for small collections.
///
/// # Size Guidelines
///
/// - **N=4** ([`MAX_DIMENSION`]): per-face vertex tuples and horizon slots
/// - **N=8**: cells incident to one vertex in 2D
/// - **N=16**: cells incident to one vertex in 3D
///
/// # Examples
///
/// ```rust
/// use hull_diagrams::core::collections::SmallBuffer;
///
/// let mut buffer: SmallBuffer<usize, 4> = SmallBuffer::new();
/// buffer.push(3);
/// assert_eq!(buffer.len(), 1);
/// ```
pub type SmallBuffer<T, const N: usize> = SmallVec<[T; N]>;

// =============================================================================
// DOMAIN-SPECIFIC TYPES
// =============================================================================

/// Vertex ids of one facet with the edge slot removed (D-1 entries).
pub type FacetVertexBuffer = SmallBuffer<usize, MAX_DIMENSION>;

/// Cells incident to a single input vertex.
pub type IncidentCellBuffer = SmallBuffer<usize, 16>;

/// Maps input vertex ids to the Delaunay cells that contain them.
pub type VertexToCellsMap = FastHashMap<usize, IncidentCellBuffer>;

// =============================================================================
// CAPACITY HELPERS
// =============================================================================

/// Creates a [`FastHashMap`] with at least the given capacity.
///
/// # Examples
///
/// ```rust
/// use hull_diagrams::core::collections::fast_hash_map_with_capacity;
///
/// let map = fast_hash_map_with_capacity::<u64, usize>(64);
/// assert!(map.capacity() >= 64);
/// ```
#[must_use]
pub fn fast_hash_map_with_capacity<K, V>(capacity: usize) -> FastHashMap<K, V> {
    FastHashMap::with_capacity_and_hasher(capacity, FastBuildHasher::default())
}

/// Creates a [`FastHashSet`] with at least the given capacity.
///
/// # Examples
///
/// ```rust
/// use hull_diagrams::core::collections::fast_hash_set_with_capacity;
///
/// let set = fast_hash_set_with_capacity::<u64>(32);
/// assert!(set.capacity() >= 32);
/// ```
#[must_use]
pub fn fast_hash_set_with_capacity<T>(capacity: usize) -> FastHashSet<T> {
    FastHashSet::with_capacity_and_hasher(capacity, FastBuildHasher::default())
}
