//! Delaunay triangulation by paraboloid lifting.
//!
//! Every input point `p` is lifted to `(p, |p|²)` in `D + 1` dimensions and
//! the convex hull of the lifted points is built with
//! [`ConvexHull`](crate::core::algorithms::quickhull::ConvexHull). The
//! downward-facing hull simplices project back to the Delaunay cells.
//!
//! The struct is generic over the input dimension `D` and the lifted
//! dimension `L`, which must equal `D + 1`; use the [`Delaunay2`] and
//! [`Delaunay3`] aliases.
//!
//! # Examples
//!
//! ```rust
//! use hull_diagrams::core::delaunay_triangulation::Delaunay2;
//!
//! let square = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
//! let dt = Delaunay2::process(&square).unwrap();
//!
//! assert_eq!(dt.number_of_cells(), 2);
//! assert_eq!(dt.edges().len(), 5);
//! assert_eq!(dt.hull_vertices(), &[0, 1, 2, 3]);
//! assert!(dt.validate_empty_circumsphere().is_ok());
//! ```

#![forbid(unsafe_code)]

use thiserror::Error;

use crate::core::algorithms::quickhull::{ConvexHull, HULL_TOLERANCE, HullError};
use crate::core::collections::{VertexToCellsMap, fast_hash_map_with_capacity};
use crate::core::edge::EdgeKey;
use crate::geometry::matrix::AffineSpan;
use crate::geometry::traits::coordinate::{CoordinateConversionError, CoordinateScalar};
use crate::geometry::util::{
    Bounds, Circumsphere, CircumsphereStrategy, Dimension, centroid, distance, safe_points_to_f64,
    squared_norm,
};

/// Relative slack used by [`Delaunay::validate_empty_circumsphere`].
const EMPTY_SPHERE_TOLERANCE: f64 = 1e-9;

/// Affine rank of `corners` when it falls short of `D`.
///
/// Uses the same absolute distance as the hull engine, so a cell is flat
/// exactly when one of its vertices lies within [`HULL_TOLERANCE`] of the
/// span of the others.
fn deficient_rank<const D: usize>(corners: &[[f64; D]]) -> Option<usize> {
    let (first, rest) = corners.split_first()?;
    let mut span = AffineSpan::new(*first);
    for p in rest {
        span.push(p, HULL_TOLERANCE * HULL_TOLERANCE);
    }
    (span.rank() < D).then_some(span.rank())
}

/// Largest circumradius accepted for inputs spanning `extent`.
fn max_circumradius(extent: f64) -> f64 {
    extent / HULL_TOLERANCE
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while building a Delaunay triangulation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DelaunayError {
    /// Fewer points than a single cell needs.
    #[error("Insufficient points for triangulation: found {found}, need at least {required}")]
    InsufficientPoints {
        /// Number of input points.
        found: usize,
        /// Minimum number of points (D + 1).
        required: usize,
    },
    /// The points do not admit a full-dimensional triangulation.
    #[error(
        "Degenerate input for Delaunay triangulation: {message} (try the {fallback_dimension}D variant)"
    )]
    DegenerateGeometry {
        /// Description of the degeneracy.
        message: String,
        /// Dimension of the variant that may still triangulate the input.
        fallback_dimension: usize,
    },
    /// The lifted hull failed for a reason other than degeneracy.
    #[error("Lifted hull construction failed: {0}")]
    Hull(#[from] HullError),
    /// An input coordinate was NaN, infinite or not representable as `f64`.
    #[error("Coordinate conversion error: {0}")]
    CoordinateConversion(#[from] CoordinateConversionError),
}

/// A violation of the empty-circumsphere property.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum DelaunayValidationError {
    /// An input vertex lies strictly inside a cell's circumsphere.
    #[error("Vertex {vertex} lies inside the circumsphere of cell {cell} (depth {depth})")]
    EmptyCircumsphereViolation {
        /// Index of the offending cell.
        cell: usize,
        /// Id of the vertex inside its circumsphere.
        vertex: usize,
        /// How far inside the sphere the vertex lies.
        depth: f64,
    },
}

// =============================================================================
// CELLS
// =============================================================================

/// One simplex of a Delaunay triangulation.
#[derive(Clone, Debug, PartialEq)]
pub struct DelaunayCell<const D: usize, const L: usize> {
    vertices: [usize; L],
    circumsphere: Circumsphere<D>,
    centroid: [f64; D],
    neighbors: [Option<usize>; L],
    is_on_hull: bool,
}

impl<const D: usize, const L: usize> DelaunayCell<D, L> {
    /// Vertex ids, ascending.
    #[inline]
    #[must_use]
    pub const fn vertices(&self) -> &[usize; L] {
        &self.vertices
    }

    /// Center of the circumscribed circle or sphere.
    #[inline]
    #[must_use]
    pub const fn circumcenter(&self) -> &[f64; D] {
        &self.circumsphere.center
    }

    /// Radius of the circumscribed circle or sphere.
    #[inline]
    #[must_use]
    pub const fn circumradius(&self) -> f64 {
        self.circumsphere.radius
    }

    /// Circumscribed circle or sphere.
    #[inline]
    #[must_use]
    pub const fn circumsphere(&self) -> &Circumsphere<D> {
        &self.circumsphere
    }

    /// Average of the vertex positions.
    #[inline]
    #[must_use]
    pub const fn centroid(&self) -> &[f64; D] {
        &self.centroid
    }

    /// Neighbouring cells; slot `i` is across the facet opposite `vertices[i]`.
    #[inline]
    #[must_use]
    pub const fn neighbors(&self) -> &[Option<usize>; L] {
        &self.neighbors
    }

    /// Whether every vertex of the cell lies on the convex hull of the input.
    #[inline]
    #[must_use]
    pub const fn is_on_hull(&self) -> bool {
        self.is_on_hull
    }

    /// Whether `id` is one of the cell vertices.
    #[inline]
    #[must_use]
    pub fn contains_vertex(&self, id: usize) -> bool {
        self.vertices.contains(&id)
    }

    /// The `L * (L - 1) / 2` edges of the cell.
    pub fn edges(&self) -> impl Iterator<Item = EdgeKey> + '_ {
        (0..L).flat_map(move |i| {
            (i + 1..L).map(move |j| EdgeKey::new(self.vertices[i], self.vertices[j]))
        })
    }

    /// Vertex ids of the facet shared with `neighbor`, if the two cells are
    /// linked as neighbours.
    #[must_use]
    pub fn shared_facet(&self, neighbor: usize) -> Option<Vec<usize>> {
        let slot = self.neighbors.iter().position(|&n| n == Some(neighbor))?;
        Some(
            self.vertices
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != slot)
                .map(|(_, &v)| v)
                .collect(),
        )
    }
}

// =============================================================================
// TRIANGULATION
// =============================================================================

/// Delaunay triangulation of a `D`-dimensional point set, built from a hull
/// in `L = D + 1` dimensions.
#[derive(Clone, Debug)]
pub struct Delaunay<const D: usize, const L: usize> {
    positions: Vec<[f64; D]>,
    cells: Vec<DelaunayCell<D, L>>,
    edges: Vec<EdgeKey>,
    hull_vertices: Vec<usize>,
    on_hull: Vec<bool>,
    singular: Vec<usize>,
}

/// Planar Delaunay triangulation.
pub type Delaunay2 = Delaunay<2, 3>;

/// Spatial Delaunay triangulation.
pub type Delaunay3 = Delaunay<3, 4>;

impl<const D: usize, const L: usize> Delaunay<D, L>
where
    Dimension<D>: CircumsphereStrategy<D>,
{
    /// Triangulates `points`.
    ///
    /// Exactly `D + 1` points form a single cell without going through the
    /// lifted hull.
    ///
    /// # Errors
    ///
    /// - [`DelaunayError::CoordinateConversion`] for non-finite coordinates.
    /// - [`DelaunayError::InsufficientPoints`] for fewer than `D + 1` points.
    /// - [`DelaunayError::DegenerateGeometry`] when the points are flat,
    ///   co-spherical throughout, or a cell is flat within [`HULL_TOLERANCE`]
    ///   or has a circumradius beyond `extent / HULL_TOLERANCE`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hull_diagrams::core::delaunay_triangulation::{Delaunay2, Delaunay3, DelaunayError};
    ///
    /// let coplanar = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]];
    /// let err = Delaunay3::process(&coplanar).unwrap_err();
    /// assert!(matches!(err, DelaunayError::DegenerateGeometry { fallback_dimension: 2, .. }));
    ///
    /// let flat = coplanar.map(|[x, y, _]| [x, y]);
    /// assert_eq!(Delaunay2::process(&flat).unwrap().number_of_cells(), 2);
    /// ```
    pub fn process<T: CoordinateScalar>(points: &[[T; D]]) -> Result<Self, DelaunayError> {
        const {
            assert!(L == D + 1, "lifted dimension must be D + 1");
        }

        let positions = safe_points_to_f64(points)?;
        let n = positions.len();
        if n < D + 1 {
            return Err(DelaunayError::InsufficientPoints {
                found: n,
                required: D + 1,
            });
        }

        let dt = if n == D + 1 {
            Self::single_cell(positions)?
        } else {
            Self::from_lifted_hull(positions)?
        };

        tracing::debug!(
            dimension = D,
            points = dt.positions.len(),
            cells = dt.cells.len(),
            edges = dt.edges.len(),
            hull_vertices = dt.hull_vertices.len(),
            "Delaunay triangulation built"
        );
        Ok(dt)
    }

    fn degenerate(message: impl Into<String>) -> DelaunayError {
        DelaunayError::DegenerateGeometry {
            message: message.into(),
            fallback_dimension: D - 1,
        }
    }

    fn make_cell(
        positions: &[[f64; D]],
        vertices: [usize; L],
        neighbors: [Option<usize>; L],
        max_radius: f64,
    ) -> Result<DelaunayCell<D, L>, DelaunayError> {
        let corners: Vec<[f64; D]> = vertices.iter().map(|&v| positions[v]).collect();
        if let Some(rank) = deficient_rank(&corners) {
            tracing::warn!(dimension = D, ?vertices, rank, "flat Delaunay cell");
            return Err(Self::degenerate(format!(
                "cell {vertices:?} spans only {rank} of {D} dimensions"
            )));
        }
        let Some(circumsphere) = Dimension::<D>::circumsphere(&corners) else {
            return Err(Self::degenerate(format!("cell {vertices:?} has no circumsphere")));
        };
        if circumsphere.radius > max_radius {
            tracing::warn!(
                dimension = D,
                ?vertices,
                radius = circumsphere.radius,
                max_radius,
                "sliver Delaunay cell"
            );
            return Err(Self::degenerate(format!(
                "cell {vertices:?} has circumradius {:e} for inputs spanning {:e}",
                circumsphere.radius,
                max_radius * HULL_TOLERANCE
            )));
        }
        Ok(DelaunayCell {
            vertices,
            circumsphere,
            centroid: centroid(&corners).unwrap_or([0.0; D]),
            neighbors,
            is_on_hull: false,
        })
    }

    /// Circumradius bound derived from the diagonal of the input box.
    fn radius_bound(positions: &[[f64; D]]) -> f64 {
        Bounds::from_points(positions).map_or(0.0, |b| max_circumradius(distance(&b.min, &b.max)))
    }

    fn single_cell(positions: Vec<[f64; D]>) -> Result<Self, DelaunayError> {
        let vertices = std::array::from_fn(|i| i);
        let max_radius = Self::radius_bound(&positions);
        let cell = Self::make_cell(&positions, vertices, [None; L], max_radius)?;
        Ok(Self::assemble(positions, vec![cell], vec![true; L], Vec::new()))
    }

    fn from_lifted_hull(positions: Vec<[f64; D]>) -> Result<Self, DelaunayError> {
        let lifted: Vec<[f64; L]> = positions
            .iter()
            .map(|p| std::array::from_fn(|i| if i < D { p[i] } else { squared_norm(p) }))
            .collect();

        let hull = ConvexHull::<L>::generate_from_f64(lifted).map_err(|e| match e {
            HullError::DegenerateGeometry { message } => Self::degenerate(message),
            other => DelaunayError::Hull(other),
        })?;

        let simplices = hull.simplices();
        let mut cell_index = vec![None; simplices.len()];
        let mut lower = Vec::new();
        for (i, s) in simplices.iter().enumerate() {
            if s.normal()[D] < 0.0 {
                cell_index[i] = Some(lower.len());
                lower.push(i);
            }
        }
        if lower.is_empty() {
            return Err(Self::degenerate("lifted hull has no lower simplices"));
        }

        let max_radius = Self::radius_bound(&positions);
        let mut on_hull = vec![false; positions.len()];
        let mut cells = Vec::with_capacity(lower.len());
        for &i in &lower {
            let s = &simplices[i];
            let neighbors = s.adjacent().map(|a| a.and_then(|j| cell_index[j]));
            for (slot, neighbor) in neighbors.iter().enumerate() {
                if neighbor.is_none() {
                    for (k, &v) in s.vertices().iter().enumerate() {
                        if k != slot {
                            on_hull[v] = true;
                        }
                    }
                }
            }
            cells.push(Self::make_cell(&positions, *s.vertices(), neighbors, max_radius)?);
        }

        let singular = hull.singular_vertices().to_vec();
        if !singular.is_empty() {
            tracing::warn!(
                dimension = D,
                singular = singular.len(),
                "lifted hull quarantined vertices; they are missing from the triangulation"
            );
        }
        Ok(Self::assemble(positions, cells, on_hull, singular))
    }

    fn assemble(
        positions: Vec<[f64; D]>,
        mut cells: Vec<DelaunayCell<D, L>>,
        on_hull: Vec<bool>,
        singular: Vec<usize>,
    ) -> Self {
        for cell in &mut cells {
            cell.is_on_hull = cell.vertices.iter().all(|&v| on_hull[v]);
        }

        let mut edges: Vec<EdgeKey> = cells.iter().flat_map(DelaunayCell::edges).collect();
        edges.sort_unstable();
        edges.dedup();

        let hull_vertices = on_hull
            .iter()
            .enumerate()
            .filter_map(|(id, &flag)| flag.then_some(id))
            .collect();

        Self {
            positions,
            cells,
            edges,
            hull_vertices,
            on_hull,
            singular,
        }
    }
}

impl<const D: usize, const L: usize> Delaunay<D, L> {
    /// Cells in construction order.
    #[inline]
    #[must_use]
    pub fn cells(&self) -> &[DelaunayCell<D, L>] {
        &self.cells
    }

    /// Cell by index.
    #[inline]
    #[must_use]
    pub fn cell(&self, index: usize) -> Option<&DelaunayCell<D, L>> {
        self.cells.get(index)
    }

    /// Number of cells.
    #[inline]
    #[must_use]
    pub fn number_of_cells(&self) -> usize {
        self.cells.len()
    }

    /// Unique edges, ascending.
    #[inline]
    #[must_use]
    pub fn edges(&self) -> &[EdgeKey] {
        &self.edges
    }

    /// Whether `edge` joins two vertices of some cell.
    #[must_use]
    pub fn contains_edge(&self, edge: EdgeKey) -> bool {
        self.edges.binary_search(&edge).is_ok()
    }

    /// Ids of the input vertices on the convex hull, ascending.
    #[inline]
    #[must_use]
    pub fn hull_vertices(&self) -> &[usize] {
        &self.hull_vertices
    }

    /// Whether input vertex `id` lies on the convex hull.
    #[inline]
    #[must_use]
    pub fn is_on_hull(&self, id: usize) -> bool {
        self.on_hull.get(id).copied().unwrap_or(false)
    }

    /// Input positions converted to `f64`.
    #[inline]
    #[must_use]
    pub fn positions(&self) -> &[[f64; D]] {
        &self.positions
    }

    /// Vertices the lifted hull could not incorporate.
    #[inline]
    #[must_use]
    pub fn singular_vertices(&self) -> &[usize] {
        &self.singular
    }

    /// For every vertex, the cells containing it.
    #[must_use]
    pub fn vertex_to_cells(&self) -> VertexToCellsMap {
        let mut map: VertexToCellsMap = fast_hash_map_with_capacity(self.positions.len());
        for (index, cell) in self.cells.iter().enumerate() {
            for &v in &cell.vertices {
                map.entry(v).or_default().push(index);
            }
        }
        map
    }

    /// Brute-force check that no input vertex lies strictly inside any
    /// cell's circumsphere. Quadratic; meant for tests and debugging.
    ///
    /// # Errors
    ///
    /// Returns the first [`DelaunayValidationError`] found.
    pub fn validate_empty_circumsphere(&self) -> Result<(), DelaunayValidationError> {
        for (index, cell) in self.cells.iter().enumerate() {
            let sphere = &cell.circumsphere;
            let tolerance = EMPTY_SPHERE_TOLERANCE * sphere.radius.max(1.0);
            for (vertex, p) in self.positions.iter().enumerate() {
                if cell.contains_vertex(vertex) || !sphere.strictly_contains(p, tolerance) {
                    continue;
                }
                return Err(DelaunayValidationError::EmptyCircumsphereViolation {
                    cell: index,
                    vertex,
                    depth: sphere.radius - crate::geometry::util::distance(&sphere.center, p),
                });
            }
        }
        Ok(())
    }
}
