//! Recycling pools for the hull engine's short-lived working objects.
//!
//! A hull build churns through many faces, edge connectors, beyond-vertex
//! buffers and deferred-face records, most of which live for a single
//! iteration. [`Pool`] keeps live objects in a generation-tagged slot map
//! (so a stale handle can never alias a newer object) and parks released
//! objects on a free stack for reuse, keeping their heap buffers.
//!
//! # Examples
//!
//! ```rust
//! use hull_diagrams::core::pool::{Pool, Recycle};
//! use slotmap::DefaultKey;
//!
//! #[derive(Default)]
//! struct Scratch(Vec<u32>);
//!
//! impl Recycle for Scratch {
//!     fn recycle(&mut self) {
//!         self.0.clear();
//!     }
//! }
//!
//! let mut pool: Pool<DefaultKey, Scratch> = Pool::new();
//! let a = pool.acquire();
//! pool[a].0.push(7);
//! assert!(pool.release(a));
//! assert!(!pool.release(a)); // stale handle
//!
//! let b = pool.acquire();
//! assert!(pool[b].0.is_empty());
//! assert_eq!(pool.stats().reused, 1);
//! ```

#![forbid(unsafe_code)]

use std::ops::{Index, IndexMut};

use slotmap::{Key, new_key_type};

use crate::core::collections::{FacetVertexBuffer, StorageMap};

/// Objects that can be reset and handed out again.
pub trait Recycle: Default {
    /// Clears transient state, keeping allocated capacity where possible.
    fn recycle(&mut self);
}

/// Counters describing how a pool satisfied its requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Fresh objects created because the free stack was empty.
    pub allocated: usize,
    /// Requests served from the free stack.
    pub reused: usize,
    /// Objects returned to the pool.
    pub released: usize,
}

impl PoolStats {
    /// Total number of `acquire` calls.
    #[must_use]
    pub const fn acquired(&self) -> usize {
        self.allocated + self.reused
    }
}

/// Generation-tagged arena with a free list of recycled instances.
#[derive(Debug)]
pub struct Pool<K: Key, T: Recycle> {
    live: StorageMap<K, T>,
    free: Vec<T>,
    stats: PoolStats,
}

impl<K: Key, T: Recycle> Default for Pool<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Key, T: Recycle> Pool<K, T> {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty pool with room for `capacity` live objects.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            live: StorageMap::with_capacity_and_key(capacity),
            free: Vec::new(),
            stats: PoolStats::default(),
        }
    }

    /// Hands out a recycled object, or a default one when none is parked.
    pub fn acquire(&mut self) -> K {
        let value = if let Some(value) = self.free.pop() {
            self.stats.reused += 1;
            value
        } else {
            self.stats.allocated += 1;
            T::default()
        };
        self.live.insert(value)
    }

    /// Returns an object to the pool. Stale or unknown handles are rejected.
    pub fn release(&mut self, key: K) -> bool {
        let Some(mut value) = self.live.remove(key) else {
            return false;
        };
        value.recycle();
        self.free.push(value);
        self.stats.released += 1;
        true
    }

    /// Live object behind `key`, if the handle is current.
    #[inline]
    #[must_use]
    pub fn get(&self, key: K) -> Option<&T> {
        self.live.get(key)
    }

    /// Mutable access to the live object behind `key`.
    #[inline]
    pub fn get_mut(&mut self, key: K) -> Option<&mut T> {
        self.live.get_mut(key)
    }

    /// Whether `key` refers to a live object.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: K) -> bool {
        self.live.contains_key(key)
    }

    /// Number of live objects.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// Whether no objects are live.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Number of parked objects waiting for reuse.
    #[inline]
    #[must_use]
    pub fn parked(&self) -> usize {
        self.free.len()
    }

    /// Request counters.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> PoolStats {
        self.stats
    }
}

impl<K: Key, T: Recycle> Index<K> for Pool<K, T> {
    type Output = T;

    #[inline]
    fn index(&self, key: K) -> &T {
        &self.live[key]
    }
}

impl<K: Key, T: Recycle> IndexMut<K> for Pool<K, T> {
    #[inline]
    fn index_mut(&mut self, key: K) -> &mut T {
        &mut self.live[key]
    }
}

// =============================================================================
// HULL WORKING OBJECTS
// =============================================================================

new_key_type! {
    /// Handle to a working face.
    pub struct FaceKey;
    /// Handle to an edge connector.
    pub struct ConnectorKey;
    /// Handle to a beyond-vertex buffer.
    pub struct BeyondKey;
    /// Handle to a deferred cone face.
    pub struct DeferredKey;
}

/// A hull face while the build is running.
#[derive(Clone, Debug)]
pub(crate) struct FaceWrap<const D: usize> {
    pub(crate) vertices: [usize; D],
    pub(crate) normal: [f64; D],
    pub(crate) offset: f64,
    pub(crate) is_normal_flipped: bool,
    pub(crate) adjacent: [Option<FaceKey>; D],
    pub(crate) beyond: Option<BeyondKey>,
    pub(crate) furthest: Option<usize>,
    pub(crate) prev: Option<FaceKey>,
    pub(crate) next: Option<FaceKey>,
    pub(crate) in_list: bool,
    pub(crate) finalized: bool,
}

impl<const D: usize> Default for FaceWrap<D> {
    fn default() -> Self {
        Self {
            vertices: [0; D],
            normal: [0.0; D],
            offset: 0.0,
            is_normal_flipped: false,
            adjacent: [None; D],
            beyond: None,
            furthest: None,
            prev: None,
            next: None,
            in_list: false,
            finalized: false,
        }
    }
}

impl<const D: usize> Recycle for FaceWrap<D> {
    fn recycle(&mut self) {
        *self = Self::default();
    }
}

/// Half of a pending adjacency link between two new cone faces.
#[derive(Clone, Debug, Default)]
pub(crate) struct Connector {
    pub(crate) face: Option<FaceKey>,
    pub(crate) edge_index: usize,
    pub(crate) vertices: FacetVertexBuffer,
    pub(crate) hash: u64,
}

impl Recycle for Connector {
    fn recycle(&mut self) {
        self.face = None;
        self.edge_index = 0;
        self.vertices.clear();
        self.hash = 0;
    }
}

/// Input vertex ids lying beyond a face.
#[derive(Clone, Debug, Default)]
pub(crate) struct BeyondBuffer(pub(crate) Vec<usize>);

impl Recycle for BeyondBuffer {
    fn recycle(&mut self) {
        self.0.clear();
    }
}

/// A cone face waiting for the commit step.
#[derive(Clone, Debug, Default)]
pub(crate) struct DeferredFace {
    pub(crate) face: Option<FaceKey>,
    pub(crate) face_index: usize,
    pub(crate) pivot: Option<FaceKey>,
    pub(crate) pivot_index: usize,
    pub(crate) old_face: Option<FaceKey>,
}

impl Recycle for DeferredFace {
    fn recycle(&mut self) {
        *self = Self::default();
    }
}

/// Per-pool counters of one hull build.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ObjectPoolStats {
    /// Working faces.
    pub faces: PoolStats,
    /// Edge connectors.
    pub connectors: PoolStats,
    /// Beyond-vertex buffers.
    pub beyond: PoolStats,
    /// Deferred cone faces.
    pub deferred: PoolStats,
}

/// The four typed pools owned by one hull build.
#[derive(Debug)]
pub(crate) struct ObjectPool<const D: usize> {
    pub(crate) faces: Pool<FaceKey, FaceWrap<D>>,
    pub(crate) connectors: Pool<ConnectorKey, Connector>,
    pub(crate) beyond: Pool<BeyondKey, BeyondBuffer>,
    pub(crate) deferred: Pool<DeferredKey, DeferredFace>,
}

impl<const D: usize> ObjectPool<D> {
    pub(crate) fn with_vertex_count(vertex_count: usize) -> Self {
        Self {
            faces: Pool::with_capacity(vertex_count.saturating_mul(D)),
            connectors: Pool::new(),
            beyond: Pool::with_capacity(vertex_count),
            deferred: Pool::new(),
        }
    }

    pub(crate) const fn stats(&self) -> ObjectPoolStats {
        ObjectPoolStats {
            faces: self.faces.stats(),
            connectors: self.connectors.stats(),
            beyond: self.beyond.stats(),
            deferred: self.deferred.stats(),
        }
    }

    /// Releases a face together with its beyond buffer.
    pub(crate) fn release_face(&mut self, key: FaceKey) {
        if let Some(beyond) = self.faces.get_mut(key).and_then(|f| f.beyond.take()) {
            self.beyond.release(beyond);
        }
        self.faces.release(key);
    }
}
