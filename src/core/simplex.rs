//! Final hull simplices.
//!
//! A [`Simplex`] is one facet of a completed hull: `D` vertex ids sorted
//! ascending, the supporting hyperplane with its outward unit normal, and the
//! dense indices of the `D` neighbouring simplices. Adjacency slot `i` holds
//! the neighbour across the facet that excludes `vertices[i]`.

#![forbid(unsafe_code)]

use crate::geometry::util::dot;

/// A facet of a completed convex hull.
#[derive(Clone, Debug, PartialEq)]
pub struct Simplex<const D: usize> {
    pub(crate) vertices: [usize; D],
    pub(crate) normal: [f64; D],
    pub(crate) offset: f64,
    pub(crate) is_normal_flipped: bool,
    pub(crate) adjacent: [Option<usize>; D],
    pub(crate) centroid: [f64; D],
}

impl<const D: usize> Simplex<D> {
    /// Vertex ids, ascending.
    #[inline]
    #[must_use]
    pub const fn vertices(&self) -> &[usize; D] {
        &self.vertices
    }

    /// Outward unit normal.
    #[inline]
    #[must_use]
    pub const fn normal(&self) -> &[f64; D] {
        &self.normal
    }

    /// Plane offset such that `distance(p) = normal · p + offset`.
    #[inline]
    #[must_use]
    pub const fn offset(&self) -> f64 {
        self.offset
    }

    /// Whether the normal was negated to point away from the interior.
    #[inline]
    #[must_use]
    pub const fn is_normal_flipped(&self) -> bool {
        self.is_normal_flipped
    }

    /// Neighbour indices; slot `i` is across the facet opposite `vertices[i]`.
    #[inline]
    #[must_use]
    pub const fn adjacent(&self) -> &[Option<usize>; D] {
        &self.adjacent
    }

    /// Average of the vertex positions.
    #[inline]
    #[must_use]
    pub const fn centroid(&self) -> &[f64; D] {
        &self.centroid
    }

    /// Signed distance from the supporting hyperplane, positive outside.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hull_diagrams::core::algorithms::quickhull::ConvexHull;
    ///
    /// let hull = ConvexHull::<2>::generate(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]).unwrap();
    /// for s in hull.simplices() {
    ///     assert!(s.distance(&[5.0, 5.0]) > 0.0 || s.distance(&[-5.0, -5.0]) > 0.0);
    ///     assert!(s.distance(&[0.2, 0.2]) < 0.0);
    /// }
    /// ```
    #[inline]
    #[must_use]
    pub fn distance(&self, point: &[f64; D]) -> f64 {
        dot(&self.normal, point) + self.offset
    }

    /// Whether `id` is one of the simplex vertices.
    #[inline]
    #[must_use]
    pub fn contains_vertex(&self, id: usize) -> bool {
        self.vertices.contains(&id)
    }

    /// Slot of `id` within [`Simplex::vertices`].
    #[inline]
    #[must_use]
    pub fn vertex_slot(&self, id: usize) -> Option<usize> {
        self.vertices.iter().position(|&v| v == id)
    }

    /// Ids shared by both simplices.
    #[must_use]
    pub fn shared_vertex_count(&self, other: &Self) -> usize {
        self.vertices
            .iter()
            .filter(|v| other.vertices.contains(v))
            .count()
    }
}
