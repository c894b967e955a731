//! Hull vertices.
//!
//! A [`HullVertex`] is an input position tagged with its index in the
//! caller's array and a flag recording whether it ended up on the hull.
//! Algorithms refer to vertices by that id rather than by reference.
//!
//! # Examples
//!
//! ```rust
//! use hull_diagrams::core::vertex::HullVertex;
//!
//! let v = HullVertex::new(3, [1.0, 2.0]);
//! assert_eq!(v.id(), 3);
//! assert!(!v.is_on_hull());
//! ```

#![forbid(unsafe_code)]

use crate::geometry::util::squared_distance;

/// An input position with its id and hull-membership flag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HullVertex<const D: usize> {
    position: [f64; D],
    id: usize,
    is_on_hull: bool,
}

impl<const D: usize> HullVertex<D> {
    /// Creates a vertex that is not (yet) on the hull.
    #[must_use]
    pub const fn new(id: usize, position: [f64; D]) -> Self {
        Self {
            position,
            id,
            is_on_hull: false,
        }
    }

    /// Wraps a whole position list, assigning ids by index.
    #[must_use]
    pub fn from_positions(positions: &[[f64; D]]) -> Vec<Self> {
        positions
            .iter()
            .enumerate()
            .map(|(id, &p)| Self::new(id, p))
            .collect()
    }

    /// Index into the caller's input array.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> usize {
        self.id
    }

    /// Coordinates.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> &[f64; D] {
        &self.position
    }

    /// Whether the vertex belongs to at least one final hull simplex.
    #[inline]
    #[must_use]
    pub const fn is_on_hull(&self) -> bool {
        self.is_on_hull
    }

    pub(crate) const fn set_on_hull(&mut self, on_hull: bool) {
        self.is_on_hull = on_hull;
    }

    /// Squared distance to another vertex.
    #[inline]
    #[must_use]
    pub fn squared_distance_to(&self, other: &Self) -> f64 {
        squared_distance(&self.position, &other.position)
    }
}

impl<const D: usize> From<HullVertex<D>> for [f64; D] {
    #[inline]
    fn from(vertex: HullVertex<D>) -> Self {
        vertex.position
    }
}

impl<const D: usize> From<&HullVertex<D>> for [f64; D] {
    #[inline]
    fn from(vertex: &HullVertex<D>) -> Self {
        vertex.position
    }
}
