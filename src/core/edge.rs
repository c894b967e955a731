//! Canonical edge identifiers.
//!
//! Edges are never stored explicitly; they are inferred from Delaunay cells
//! (vertex pairs) or Voronoi regions (cell pairs). `EdgeKey` identifies an
//! undirected edge by its two integer endpoints with `v0 <= v1`, so `(a, b)`
//! and `(b, a)` map to the same key.

/// Canonical identifier for an (undirected) edge between two ids.
///
/// # Examples
///
/// ```rust
/// use hull_diagrams::core::edge::EdgeKey;
///
/// let edge = EdgeKey::new(7, 2);
/// assert_eq!(edge.endpoints(), (2, 7));
/// assert_eq!(edge, EdgeKey::new(2, 7));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    v0: usize,
    v1: usize,
}

impl EdgeKey {
    /// Creates a new canonical edge key; endpoints are reordered so `v0 <= v1`.
    #[must_use]
    pub const fn new(a: usize, b: usize) -> Self {
        if a <= b {
            Self { v0: a, v1: b }
        } else {
            Self { v0: b, v1: a }
        }
    }

    /// Returns the smaller endpoint.
    #[inline]
    #[must_use]
    pub const fn v0(self) -> usize {
        self.v0
    }

    /// Returns the larger endpoint.
    #[inline]
    #[must_use]
    pub const fn v1(self) -> usize {
        self.v1
    }

    /// Returns the two endpoints as a tuple.
    #[inline]
    #[must_use]
    pub const fn endpoints(self) -> (usize, usize) {
        (self.v0, self.v1)
    }

    /// Whether `id` is one of the endpoints.
    #[inline]
    #[must_use]
    pub const fn touches(self, id: usize) -> bool {
        self.v0 == id || self.v1 == id
    }

    /// Packs the key as `v0 << 32 | v1`, or `None` when an endpoint does not
    /// fit in 32 bits.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hull_diagrams::core::edge::EdgeKey;
    ///
    /// let packed = EdgeKey::new(3, 1).to_u64().unwrap();
    /// assert_eq!(packed, (1 << 32) | 3);
    /// assert_eq!(EdgeKey::from_u64(packed), EdgeKey::new(1, 3));
    /// ```
    #[must_use]
    pub fn to_u64(self) -> Option<u64> {
        let hi = u32::try_from(self.v0).ok()?;
        let lo = u32::try_from(self.v1).ok()?;
        Some((u64::from(hi) << 32) | u64::from(lo))
    }

    /// Unpacks a key produced by [`EdgeKey::to_u64`]. The halves are
    /// re-canonicalized, so any `u64` yields a valid key.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_u64(packed: u64) -> Self {
        let hi = (packed >> 32) as u32;
        let lo = (packed & u64::from(u32::MAX)) as u32;
        Self::new(hi as usize, lo as usize)
    }
}

impl From<(usize, usize)> for EdgeKey {
    #[inline]
    fn from((a, b): (usize, usize)) -> Self {
        Self::new(a, b)
    }
}
