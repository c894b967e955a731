//! Incremental QuickHull for 2D, 3D and 4D point sets.
//!
//! The builder starts from an initial simplex spanned by extreme points,
//! assigns every remaining input vertex to the faces it lies beyond, and
//! then repeatedly pops the face with the largest beyond set from a
//! worklist, lifts its furthest vertex (the apex) onto the hull and replaces
//! every face visible from the apex by a cone of new faces around the
//! horizon.
//!
//! Apexes whose cone cannot be built consistently (degenerate or
//! numerically ambiguous configurations) are quarantined as *singular*
//! together with the beyond sets of the faces they illuminated. They are
//! reported through [`ConvexHull::singular_vertices`], never dropped
//! silently, and the faces they would have replaced are kept as final.
//!
//! All plane tests use the absolute tolerance [`HULL_TOLERANCE`]. It is not
//! scaled to the extent of the input, so coordinates far from unit scale
//! lose precision in the visibility tests.
//!
//! # Examples
//!
//! ```rust
//! use hull_diagrams::core::algorithms::quickhull::ConvexHull;
//!
//! let points = [[0.0, 0.0], [2.0, 0.0], [0.0, 2.0], [2.0, 2.0], [1.0, 1.0]];
//! let hull = ConvexHull::<2>::generate(&points).unwrap();
//!
//! assert_eq!(hull.number_of_simplices(), 4);
//! assert_eq!(hull.hull_vertex_ids(), &[0, 1, 2, 3]);
//! assert!(!hull.is_on_hull(4));
//! assert!(hull.validate().is_ok());
//! ```

#![forbid(unsafe_code)]

use std::collections::VecDeque;

use thiserror::Error;

use crate::core::collections::{
    FacetVertexBuffer, FastHashMap, FastHashSet, MAX_DIMENSION, fast_hash_map_with_capacity,
};
use crate::core::pool::{ConnectorKey, DeferredKey, FaceKey, ObjectPool, ObjectPoolStats};
use crate::core::simplex::Simplex;
use crate::core::vertex::HullVertex;
use crate::geometry::matrix::{AffineSpan, hyperplane_normal, simplex_orientation};
use crate::geometry::traits::coordinate::{CoordinateConversionError, CoordinateScalar};
use crate::geometry::util::conversions::count_to_f64;
use crate::geometry::util::{centroid, dot, safe_points_to_f64, squared_distance};

/// Absolute distance above which a vertex counts as beyond a face.
pub const HULL_TOLERANCE: f64 = 1e-7;

/// Number of buckets in the connector table that pairs up new cone faces.
const CONNECTOR_TABLE_SIZE: usize = 2017;

/// Minimum summed squared distance for an extreme point to join the initial simplex.
const MIN_INITIAL_SPREAD: f64 = 1e-6;

/// Environment variable enabling per-iteration debug events.
const DEBUG_ENV: &str = "HULL_DIAGRAMS_DEBUG_HULL";

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur while building a convex hull.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HullError {
    /// An input coordinate was NaN, infinite or not representable as `f64`.
    #[error("Coordinate conversion error: {0}")]
    CoordinateConversion(#[from] CoordinateConversionError),
    /// The input does not span a full-dimensional simplex.
    #[error("Geometric degeneracy encountered during convex hull construction: {message}")]
    DegenerateGeometry {
        /// Description of the degeneracy.
        message: String,
    },
}

/// Structural defects reported by [`ConvexHull::validate`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HullValidationError {
    /// An adjacency slot is empty.
    #[error("Simplex {simplex} has no neighbour in slot {slot}")]
    MissingNeighbor {
        /// Index of the simplex.
        simplex: usize,
        /// Empty adjacency slot.
        slot: usize,
    },
    /// A neighbour does not point back.
    #[error("Simplex {simplex} lists {neighbor} as a neighbour, but not vice versa")]
    AsymmetricAdjacency {
        /// Index of the simplex.
        simplex: usize,
        /// Index of the neighbour that lacks the back link.
        neighbor: usize,
    },
    /// Two neighbours do not share exactly the facet opposite the slot.
    #[error(
        "Simplex {simplex} and neighbour {neighbor} share {shared} vertices across slot {slot}, expected {expected}"
    )]
    SharedFacetMismatch {
        /// Index of the simplex.
        simplex: usize,
        /// Index of the neighbour.
        neighbor: usize,
        /// Adjacency slot being checked.
        slot: usize,
        /// Number of vertices the two simplices share.
        shared: usize,
        /// Expected number of shared vertices (D - 1).
        expected: usize,
    },
}

// =============================================================================
// CONVEX HULL
// =============================================================================

/// A completed convex hull.
///
/// Simplices are stored densely; adjacency refers to indices in
/// [`ConvexHull::simplices`].
#[derive(Clone, Debug)]
pub struct ConvexHull<const D: usize> {
    vertices: Vec<HullVertex<D>>,
    simplices: Vec<Simplex<D>>,
    hull_vertex_ids: Vec<usize>,
    singular: Vec<usize>,
    centroid: [f64; D],
    pool_stats: ObjectPoolStats,
}

impl<const D: usize> ConvexHull<D> {
    /// Builds the hull of `points`, converting them to `f64` first.
    ///
    /// Fewer than `D + 1` points yield an empty hull rather than an error.
    ///
    /// # Errors
    ///
    /// - [`HullError::CoordinateConversion`] for NaN or infinite coordinates.
    /// - [`HullError::DegenerateGeometry`] when the points do not span `D`
    ///   dimensions (except for exactly `D + 1` points, which are accepted as
    ///   a flat two-sided simplex).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hull_diagrams::core::algorithms::quickhull::{ConvexHull, HullError};
    ///
    /// let few = ConvexHull::<3>::generate(&[[0.0f32, 0.0, 0.0]]).unwrap();
    /// assert!(few.is_empty());
    ///
    /// let flat = [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]];
    /// assert!(matches!(
    ///     ConvexHull::<2>::generate(&flat),
    ///     Err(HullError::DegenerateGeometry { .. })
    /// ));
    /// ```
    pub fn generate<T: CoordinateScalar>(points: &[[T; D]]) -> Result<Self, HullError> {
        let positions = safe_points_to_f64(points)?;
        Self::generate_from_f64(positions)
    }

    /// Builds the hull of already validated `f64` positions.
    ///
    /// # Errors
    ///
    /// Returns [`HullError::DegenerateGeometry`] as described for
    /// [`ConvexHull::generate`].
    pub fn generate_from_f64(positions: Vec<[f64; D]>) -> Result<Self, HullError> {
        const {
            assert!(D >= 2 && D <= MAX_DIMENSION, "hull dimension must be in 2..=4");
        }

        if positions.len() < D + 1 {
            tracing::debug!(
                points = positions.len(),
                dimension = D,
                "too few points for a hull; returning an empty hull"
            );
            return Ok(Self {
                vertices: HullVertex::from_positions(&positions),
                simplices: Vec::new(),
                hull_vertex_ids: Vec::new(),
                singular: Vec::new(),
                centroid: [0.0; D],
                pool_stats: ObjectPoolStats::default(),
            });
        }

        let mut builder = HullBuilder::new(positions);
        builder.build()?;
        Ok(builder.finish())
    }

    /// Final simplices.
    #[inline]
    #[must_use]
    pub fn simplices(&self) -> &[Simplex<D>] {
        &self.simplices
    }

    /// Every input vertex, in input order, with its hull flag.
    #[inline]
    #[must_use]
    pub fn vertices(&self) -> &[HullVertex<D>] {
        &self.vertices
    }

    /// Whether input vertex `id` lies on the hull. Unknown ids are not.
    #[inline]
    #[must_use]
    pub fn is_on_hull(&self, id: usize) -> bool {
        self.vertices.get(id).is_some_and(HullVertex::is_on_hull)
    }

    /// Ids of the vertices on the hull, ascending.
    #[inline]
    #[must_use]
    pub fn hull_vertex_ids(&self) -> &[usize] {
        &self.hull_vertex_ids
    }

    /// Vertices quarantined during the build, in quarantine order.
    #[inline]
    #[must_use]
    pub fn singular_vertices(&self) -> &[usize] {
        &self.singular
    }

    /// Number of final simplices.
    #[inline]
    #[must_use]
    pub fn number_of_simplices(&self) -> usize {
        self.simplices.len()
    }

    /// Average of the vertices incorporated into the hull.
    #[inline]
    #[must_use]
    pub const fn centroid(&self) -> &[f64; D] {
        &self.centroid
    }

    /// Whether the hull has no simplices.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.simplices.is_empty()
    }

    /// How the working-object pools served the build.
    #[inline]
    #[must_use]
    pub const fn pool_stats(&self) -> ObjectPoolStats {
        self.pool_stats
    }

    /// Whether `point` lies inside or on the hull, within [`HULL_TOLERANCE`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use hull_diagrams::core::algorithms::quickhull::ConvexHull;
    ///
    /// let hull = ConvexHull::<2>::generate(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]]).unwrap();
    /// assert!(hull.contains(&[0.25, 0.25]));
    /// assert!(!hull.contains(&[1.0, 1.0]));
    /// ```
    #[must_use]
    pub fn contains(&self, point: &[f64; D]) -> bool {
        !self.is_empty()
            && self
                .simplices
                .iter()
                .all(|s| s.distance(point) < HULL_TOLERANCE)
    }

    /// Checks that adjacency is complete, symmetric and shares whole facets.
    ///
    /// # Errors
    ///
    /// Returns the first [`HullValidationError`] found.
    pub fn validate(&self) -> Result<(), HullValidationError> {
        for (index, simplex) in self.simplices.iter().enumerate() {
            for (slot, neighbor) in simplex.adjacent.iter().enumerate() {
                let Some(neighbor) = *neighbor else {
                    return Err(HullValidationError::MissingNeighbor {
                        simplex: index,
                        slot,
                    });
                };
                let other = &self.simplices[neighbor];
                if !other.adjacent.contains(&Some(index)) {
                    return Err(HullValidationError::AsymmetricAdjacency {
                        simplex: index,
                        neighbor,
                    });
                }
                let shared = simplex.shared_vertex_count(other);
                if shared != D - 1 || other.contains_vertex(simplex.vertices[slot]) {
                    return Err(HullValidationError::SharedFacetMismatch {
                        simplex: index,
                        neighbor,
                        slot,
                        shared,
                        expected: D - 1,
                    });
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// Running maximum used while classifying beyond vertices.
struct Furthest {
    distance: f64,
    vertex: Option<usize>,
}

impl Furthest {
    const fn new() -> Self {
        Self {
            distance: f64::NEG_INFINITY,
            vertex: None,
        }
    }
}

/// Appends `vertex` to `beyond` when it lies at least [`HULL_TOLERANCE`] in
/// front of the plane, tracking the furthest such vertex.
#[inline]
fn classify<const D: usize>(
    normal: &[f64; D],
    offset: f64,
    position: &[f64; D],
    vertex: usize,
    beyond: &mut Vec<usize>,
    furthest: &mut Furthest,
) {
    let distance = dot(normal, position) + offset;
    if distance >= HULL_TOLERANCE {
        if distance > furthest.distance {
            furthest.distance = distance;
            furthest.vertex = Some(vertex);
        }
        beyond.push(vertex);
    }
}

/// `h = 31; h += 23 * h + id` over the facet ids, wrapping.
fn facet_hash(ids: &[usize]) -> u64 {
    ids.iter().fold(31u64, |h, &id| {
        h.wrapping_add(h.wrapping_mul(23)).wrapping_add(id as u64)
    })
}

/// All mutable state of one hull build.
struct HullBuilder<const D: usize> {
    positions: Vec<[f64; D]>,
    pool: ObjectPool<D>,
    /// Input vertices not part of the initial simplex.
    unprocessed: Vec<usize>,
    hull_vertices: Vec<usize>,
    centroid: [f64; D],
    worklist_head: Option<FaceKey>,
    worklist_tail: Option<FaceKey>,
    /// Finalized faces in finalization order; may hold since-released keys.
    convex: Vec<FaceKey>,
    singular: Vec<usize>,
    singular_set: FastHashSet<usize>,
    affected: Vec<FaceKey>,
    affected_set: FastHashSet<FaceKey>,
    traversal: VecDeque<FaceKey>,
    cone: Vec<DeferredKey>,
    connector_table: Vec<Vec<ConnectorKey>>,
    touched_buckets: Vec<usize>,
    beyond_marks: FastHashSet<usize>,
    beyond_scratch: Vec<usize>,
    debug_iterations: bool,
}

impl<const D: usize> HullBuilder<D> {
    fn new(positions: Vec<[f64; D]>) -> Self {
        let n = positions.len();
        Self {
            pool: ObjectPool::with_vertex_count(n),
            positions,
            unprocessed: Vec::with_capacity(n),
            hull_vertices: Vec::with_capacity(n),
            centroid: [0.0; D],
            worklist_head: None,
            worklist_tail: None,
            convex: Vec::new(),
            singular: Vec::new(),
            singular_set: FastHashSet::default(),
            affected: Vec::new(),
            affected_set: FastHashSet::default(),
            traversal: VecDeque::new(),
            cone: Vec::new(),
            connector_table: vec![Vec::new(); CONNECTOR_TABLE_SIZE],
            touched_buckets: Vec::new(),
            beyond_marks: FastHashSet::default(),
            beyond_scratch: Vec::new(),
            debug_iterations: std::env::var_os(DEBUG_ENV).is_some(),
        }
    }

    fn build(&mut self) -> Result<(), HullError> {
        self.initialize()?;
        self.run();
        Ok(())
    }

    fn initialize(&mut self) -> Result<(), HullError> {
        let initial = self.select_initial_points()?;
        self.create_initial_simplex(&initial)
    }

    /// Drains the worklist. Every iteration removes the head face, either by
    /// replacing it with a cone or by finalizing it after a quarantine.
    fn run(&mut self) {
        let mut iteration = 0usize;
        while let Some(head) = self.worklist_head {
            iteration += 1;
            let Some(apex) = self.pool.faces[head].furthest else {
                self.finalize(head);
                self.worklist_remove(head);
                continue;
            };

            self.update_centroid(apex);
            self.collect_affected(head, apex);
            if self.debug_iterations {
                tracing::debug!(
                    iteration,
                    apex,
                    affected = self.affected.len(),
                    hull_vertices = self.hull_vertices.len(),
                    "hull iteration"
                );
            }

            if !self.singular_set.contains(&apex) && self.create_cone(apex) {
                self.commit_cone(apex);
            } else {
                self.handle_singular(apex);
            }
        }

        tracing::debug!(
            dimension = D,
            iterations = iteration,
            hull_vertices = self.hull_vertices.len(),
            singular = self.singular.len(),
            "hull build finished"
        );
    }

    // -------------------------------------------------------------------------
    // Initial simplex
    // -------------------------------------------------------------------------

    /// Min and max vertex per axis, first seen wins, without duplicates.
    fn extreme_vertices(&self) -> Vec<usize> {
        let mut extremes = Vec::with_capacity(2 * D);
        for axis in 0..D {
            let (mut min_id, mut max_id) = (0, 0);
            let (mut min_value, mut max_value) = (f64::INFINITY, f64::NEG_INFINITY);
            for (id, p) in self.positions.iter().enumerate() {
                if p[axis] < min_value {
                    min_value = p[axis];
                    min_id = id;
                }
                if p[axis] > max_value {
                    max_value = p[axis];
                    max_id = id;
                }
            }
            for id in [min_id, max_id] {
                if !extremes.contains(&id) {
                    extremes.push(id);
                }
            }
        }
        extremes
    }

    fn select_initial_points(&self) -> Result<Vec<usize>, HullError> {
        let extremes = self.extreme_vertices();
        let position = |id: usize| &self.positions[id];

        let mut best_pair = None;
        let mut max_distance = 0.0;
        for (i, &a) in extremes.iter().enumerate() {
            for &b in &extremes[i + 1..] {
                let d = squared_distance(position(a), position(b));
                if d > max_distance {
                    max_distance = d;
                    best_pair = Some((a, b));
                }
            }
        }
        let Some((a, b)) = best_pair else {
            return Err(HullError::DegenerateGeometry {
                message: "all input points coincide".to_string(),
            });
        };

        let mut chosen = vec![a, b];
        let mut span = AffineSpan::new(*position(a));
        span.push(position(b), 0.0);
        let min_residual = HULL_TOLERANCE * HULL_TOLERANCE;

        while chosen.len() < D + 1 {
            let mut best = None;
            let mut best_spread = MIN_INITIAL_SPREAD;
            for &e in &extremes {
                if chosen.contains(&e) || span.residual_squared(position(e)) < min_residual {
                    continue;
                }
                let spread: f64 = chosen
                    .iter()
                    .map(|&q| squared_distance(position(e), position(q)))
                    .sum();
                if spread > best_spread {
                    best_spread = spread;
                    best = Some(e);
                }
            }

            if best.is_none() {
                let mut best_residual = min_residual;
                for id in 0..self.positions.len() {
                    if chosen.contains(&id) {
                        continue;
                    }
                    let residual = span.residual_squared(position(id));
                    if residual > best_residual {
                        best_residual = residual;
                        best = Some(id);
                    }
                }
            }

            let Some(next) = best else { break };
            chosen.push(next);
            span.push(position(next), 0.0);
        }

        if chosen.len() < D + 1 {
            if self.positions.len() == D + 1 {
                tracing::debug!(
                    dimension = D,
                    rank = span.rank(),
                    "accepting flat input of exactly D + 1 points as a two-sided simplex"
                );
                chosen = (0..=D).collect();
            } else {
                tracing::warn!(
                    dimension = D,
                    rank = span.rank(),
                    points = self.positions.len(),
                    "input does not span a full-dimensional simplex"
                );
                return Err(HullError::DegenerateGeometry {
                    message: format!("input spans only {} of {D} dimensions", span.rank()),
                });
            }
        }

        chosen.sort_unstable();
        Ok(chosen)
    }

    fn create_initial_simplex(&mut self, chosen: &[usize]) -> Result<(), HullError> {
        for &v in chosen {
            self.update_centroid(v);
            self.hull_vertices.push(v);
        }
        self.unprocessed = (0..self.positions.len())
            .filter(|id| !chosen.contains(id))
            .collect();

        let corners: Vec<[f64; D]> = chosen.iter().map(|&v| self.positions[v]).collect();
        let volume = simplex_orientation(&corners).map_err(|e| HullError::DegenerateGeometry {
            message: e.to_string(),
        })?;
        let positive = volume >= 0.0;

        let mut faces = Vec::with_capacity(D + 1);
        for skip in 0..=D {
            let mut vertices = [0usize; D];
            for (slot, &v) in chosen.iter().filter(|&&v| v != chosen[skip]).enumerate() {
                vertices[slot] = v;
            }
            let points: Vec<[f64; D]> = vertices.iter().map(|&v| self.positions[v]).collect();
            let Ok(Some(normal)) = hyperplane_normal(&points) else {
                return Err(HullError::DegenerateGeometry {
                    message: format!("initial face {vertices:?} has no defined normal"),
                });
            };

            // A flat simplex leaves the centroid on every plane; orientation
            // parity decides there.
            let offset = dot(&normal, &points[0]);
            let centroid_side = dot(&normal, &self.centroid) - offset;
            let flip = if centroid_side.abs() > HULL_TOLERANCE {
                centroid_side > 0.0
            } else {
                ((D - skip) % 2 == 0) == positive
            };

            let key = self.pool.faces.acquire();
            let face = &mut self.pool.faces[key];
            face.vertices = vertices;
            if flip {
                face.normal = normal.map(|x| -x);
                face.offset = offset;
                face.is_normal_flipped = true;
            } else {
                face.normal = normal;
                face.offset = -offset;
            }
            faces.push(key);
        }

        for (i, &left) in faces.iter().enumerate() {
            for &right in &faces[i + 1..] {
                self.update_adjacency(left, right);
            }
        }

        tracing::debug!(dimension = D, initial = ?chosen, "initial simplex created");

        for &face in &faces {
            let beyond = self.pool.beyond.acquire();
            let mut furthest = Furthest::new();
            let (normal, offset) = {
                let f = &self.pool.faces[face];
                (f.normal, f.offset)
            };
            let buffer = &mut self.pool.beyond[beyond].0;
            for &v in &self.unprocessed {
                classify(&normal, offset, &self.positions[v], v, buffer, &mut furthest);
            }

            if buffer.is_empty() {
                self.pool.beyond.release(beyond);
                self.finalize(face);
            } else {
                let f = &mut self.pool.faces[face];
                f.beyond = Some(beyond);
                f.furthest = furthest.vertex;
                self.worklist_add(face);
            }
        }
        Ok(())
    }

    /// Links two faces that differ in exactly one vertex.
    fn update_adjacency(&mut self, left: FaceKey, right: FaceKey) {
        let lv = self.pool.faces[left].vertices;
        let rv = self.pool.faces[right].vertices;
        let mut left_missing = (0..D).filter(|&i| !rv.contains(&lv[i]));
        let mut right_missing = (0..D).filter(|&i| !lv.contains(&rv[i]));
        if let (Some(l), None, Some(r), None) = (
            left_missing.next(),
            left_missing.next(),
            right_missing.next(),
            right_missing.next(),
        ) {
            self.pool.faces[left].adjacent[l] = Some(right);
            self.pool.faces[right].adjacent[r] = Some(left);
        }
    }

    // -------------------------------------------------------------------------
    // Centroid
    // -------------------------------------------------------------------------

    fn update_centroid(&mut self, vertex: usize) {
        let k = count_to_f64(self.hull_vertices.len());
        let p = self.positions[vertex];
        for (c, x) in self.centroid.iter_mut().zip(p) {
            *c = c.mul_add(k, x) / (k + 1.0);
        }
    }

    fn rollback_centroid(&mut self, vertex: usize) {
        let k = count_to_f64(self.hull_vertices.len());
        let p = self.positions[vertex];
        for (c, x) in self.centroid.iter_mut().zip(p) {
            *c = c.mul_add(k + 1.0, -x) / k;
        }
    }

    // -------------------------------------------------------------------------
    // Worklist
    // -------------------------------------------------------------------------

    fn beyond_len(&self, face: FaceKey) -> usize {
        self.pool.faces[face]
            .beyond
            .and_then(|b| self.pool.beyond.get(b))
            .map_or(0, |b| b.0.len())
    }

    fn unlink(&mut self, face: FaceKey) {
        let (prev, next) = {
            let f = &self.pool.faces[face];
            (f.prev, f.next)
        };
        match prev {
            Some(p) => self.pool.faces[p].next = next,
            None => self.worklist_head = next,
        }
        match next {
            Some(n) => self.pool.faces[n].prev = prev,
            None => self.worklist_tail = prev,
        }
        let f = &mut self.pool.faces[face];
        f.prev = None;
        f.next = None;
        f.in_list = false;
    }

    fn push_front(&mut self, face: FaceKey) {
        let old_head = self.worklist_head;
        {
            let f = &mut self.pool.faces[face];
            f.prev = None;
            f.next = old_head;
            f.in_list = true;
        }
        match old_head {
            Some(h) => self.pool.faces[h].prev = Some(face),
            None => self.worklist_tail = Some(face),
        }
        self.worklist_head = Some(face);
    }

    fn push_back(&mut self, face: FaceKey) {
        let old_tail = self.worklist_tail;
        {
            let f = &mut self.pool.faces[face];
            f.prev = old_tail;
            f.next = None;
            f.in_list = true;
        }
        match old_tail {
            Some(t) => self.pool.faces[t].next = Some(face),
            None => self.worklist_head = Some(face),
        }
        self.worklist_tail = Some(face);
    }

    /// Largest beyond sets go first; ties keep arrival order.
    fn worklist_add(&mut self, face: FaceKey) {
        let beats_head = self
            .worklist_head
            .is_some_and(|h| self.beyond_len(h) < self.beyond_len(face));

        if self.pool.faces[face].in_list {
            if beats_head {
                self.unlink(face);
                self.push_front(face);
            }
            return;
        }
        if beats_head {
            self.push_front(face);
        } else {
            self.push_back(face);
        }
    }

    fn worklist_remove(&mut self, face: FaceKey) {
        if self.pool.faces.get(face).is_some_and(|f| f.in_list) {
            self.unlink(face);
        }
    }

    fn finalize(&mut self, face: FaceKey) {
        let f = &mut self.pool.faces[face];
        if !f.finalized {
            f.finalized = true;
            self.convex.push(face);
        }
    }

    // -------------------------------------------------------------------------
    // Iteration
    // -------------------------------------------------------------------------

    fn face_distance(&self, face: FaceKey, vertex: usize) -> f64 {
        let f = &self.pool.faces[face];
        dot(&f.normal, &self.positions[vertex]) + f.offset
    }

    /// Breadth-first search from the head over faces visible from the apex.
    fn collect_affected(&mut self, head: FaceKey, apex: usize) {
        self.affected.clear();
        self.affected_set.clear();
        self.traversal.clear();

        self.affected.push(head);
        self.affected_set.insert(head);
        self.traversal.push_back(head);

        while let Some(face) = self.traversal.pop_front() {
            let adjacent = self.pool.faces[face].adjacent;
            for neighbor in adjacent.into_iter().flatten() {
                if !self.affected_set.contains(&neighbor)
                    && self.face_distance(neighbor, apex) >= HULL_TOLERANCE
                {
                    self.affected.push(neighbor);
                    self.affected_set.insert(neighbor);
                    self.traversal.push_back(neighbor);
                }
            }
        }
    }

    /// Recomputes the plane of a new face, oriented away from the centroid.
    fn set_face_plane(&mut self, face: FaceKey) -> bool {
        let vertices = self.pool.faces[face].vertices;
        let points: Vec<[f64; D]> = vertices.iter().map(|&v| self.positions[v]).collect();
        let Ok(Some(normal)) = hyperplane_normal(&points) else {
            return false;
        };
        let offset = dot(&normal, &points[0]);
        let centroid_side = dot(&normal, &self.centroid) - offset;

        let f = &mut self.pool.faces[face];
        if centroid_side > 0.0 {
            f.normal = normal.map(|x| -x);
            f.offset = offset;
            f.is_normal_flipped = true;
        } else {
            f.normal = normal;
            f.offset = -offset;
            f.is_normal_flipped = false;
        }
        true
    }

    /// Replaces `vertices[forbidden]` by the apex, keeping ids ascending.
    /// Returns the slot the apex ended up in.
    fn insert_apex(vertices: &mut [usize; D], forbidden: usize, apex: usize) -> usize {
        let mut pivot;
        if apex < vertices[forbidden] {
            pivot = 0;
            for j in (0..forbidden).rev() {
                if vertices[j] > apex {
                    vertices[j + 1] = vertices[j];
                } else {
                    pivot = j + 1;
                    break;
                }
            }
        } else {
            pivot = D - 1;
            for j in forbidden + 1..D {
                if vertices[j] < apex {
                    vertices[j - 1] = vertices[j];
                } else {
                    pivot = j - 1;
                    break;
                }
            }
        }
        vertices[pivot] = apex;
        pivot
    }

    /// Builds the cone of new faces around the horizon. On failure every
    /// half-built face and connector is released and `false` is returned.
    fn create_cone(&mut self, apex: usize) -> bool {
        self.cone.clear();

        for index in 0..self.affected.len() {
            let old = self.affected[index];
            let (old_vertices, old_adjacent) = {
                let f = &self.pool.faces[old];
                (f.vertices, f.adjacent)
            };
            if old_adjacent.iter().any(Option::is_none) {
                self.discard_cone();
                return false;
            }

            for (forbidden, neighbor) in old_adjacent.iter().enumerate() {
                let Some(neighbor) = *neighbor else { continue };
                if self.affected_set.contains(&neighbor) {
                    continue;
                }
                let Some(pivot_index) = self.pool.faces[neighbor]
                    .adjacent
                    .iter()
                    .position(|&a| a == Some(old))
                else {
                    self.discard_cone();
                    return false;
                };

                let mut vertices = old_vertices;
                let face_index = Self::insert_apex(&mut vertices, forbidden, apex);

                let face = self.pool.faces.acquire();
                self.pool.faces[face].vertices = vertices;
                let deferred = self.pool.deferred.acquire();
                {
                    let d = &mut self.pool.deferred[deferred];
                    d.face = Some(face);
                    d.face_index = face_index;
                    d.pivot = Some(neighbor);
                    d.pivot_index = pivot_index;
                    d.old_face = Some(old);
                }
                self.cone.push(deferred);

                if !self.set_face_plane(face) {
                    self.discard_cone();
                    return false;
                }
            }
        }

        self.connect_cone()
    }

    /// Pairs the side facets of the new faces through the connector table.
    fn connect_cone(&mut self) -> bool {
        for index in 0..self.cone.len() {
            let deferred = self.cone[index];
            let (face, face_index) = {
                let d = &self.pool.deferred[deferred];
                (d.face, d.face_index)
            };
            let Some(face) = face else { continue };
            let vertices = self.pool.faces[face].vertices;

            for edge_index in (0..D).filter(|&j| j != face_index) {
                let ids: FacetVertexBuffer = (0..D)
                    .filter(|&k| k != edge_index)
                    .map(|k| vertices[k])
                    .collect();
                let hash = facet_hash(&ids);
                let bucket = usize::try_from(hash % CONNECTOR_TABLE_SIZE as u64).unwrap_or(0);

                let matched = self.connector_table[bucket].iter().position(|&c| {
                    let connector = &self.pool.connectors[c];
                    connector.hash == hash && connector.vertices == ids
                });

                if let Some(position) = matched {
                    let other = self.connector_table[bucket].swap_remove(position);
                    let (other_face, other_edge) = {
                        let c = &self.pool.connectors[other];
                        (c.face, c.edge_index)
                    };
                    if let Some(other_face) = other_face {
                        self.pool.faces[other_face].adjacent[other_edge] = Some(face);
                        self.pool.faces[face].adjacent[edge_index] = Some(other_face);
                    }
                    self.pool.connectors.release(other);
                } else {
                    let key = self.pool.connectors.acquire();
                    {
                        let c = &mut self.pool.connectors[key];
                        c.face = Some(face);
                        c.edge_index = edge_index;
                        c.vertices = ids;
                        c.hash = hash;
                    }
                    if self.connector_table[bucket].is_empty() {
                        self.touched_buckets.push(bucket);
                    }
                    self.connector_table[bucket].push(key);
                }
            }
        }

        let leftovers = self.clear_connectors();
        if leftovers > 0 {
            tracing::debug!(leftovers, "cone facets failed to pair up");
            self.discard_cone();
            return false;
        }
        true
    }

    /// Releases every pending connector, returning how many were left.
    fn clear_connectors(&mut self) -> usize {
        let mut leftovers = 0;
        for bucket in std::mem::take(&mut self.touched_buckets) {
            for key in self.connector_table[bucket].drain(..) {
                leftovers += 1;
                self.pool.connectors.release(key);
            }
        }
        leftovers
    }

    fn discard_cone(&mut self) {
        self.clear_connectors();
        for deferred in std::mem::take(&mut self.cone) {
            if let Some(face) = self.pool.deferred[deferred].face {
                self.pool.release_face(face);
            }
            self.pool.deferred.release(deferred);
        }
    }

    fn commit_cone(&mut self, apex: usize) {
        self.hull_vertices.push(apex);

        for deferred in std::mem::take(&mut self.cone) {
            let record = self.pool.deferred[deferred].clone();
            self.pool.deferred.release(deferred);
            let (Some(face), Some(pivot), Some(old)) = (record.face, record.pivot, record.old_face)
            else {
                continue;
            };

            self.pool.faces[face].adjacent[record.face_index] = Some(pivot);
            self.pool.faces[pivot].adjacent[record.pivot_index] = Some(face);

            let (smaller, larger) = if self.beyond_len(pivot) < self.beyond_len(old) {
                (pivot, old)
            } else {
                (old, pivot)
            };
            let furthest = self.merge_beyond(face, smaller, larger, apex);

            if self.beyond_scratch.is_empty() {
                self.finalize(face);
                self.worklist_remove(face);
            } else {
                let beyond = self.pool.beyond.acquire();
                std::mem::swap(&mut self.pool.beyond[beyond].0, &mut self.beyond_scratch);
                let f = &mut self.pool.faces[face];
                f.beyond = Some(beyond);
                f.furthest = furthest;
                self.worklist_add(face);
            }
        }

        for index in 0..self.affected.len() {
            let old = self.affected[index];
            self.worklist_remove(old);
            self.pool.release_face(old);
        }
    }

    /// Fills the scratch buffer with the union of both parents' beyond sets
    /// (apex excluded, each vertex once) that lie beyond `face`.
    fn merge_beyond(
        &mut self,
        face: FaceKey,
        smaller: FaceKey,
        larger: FaceKey,
        apex: usize,
    ) -> Option<usize> {
        let Self {
            pool,
            positions,
            beyond_marks,
            beyond_scratch,
            ..
        } = self;
        let (normal, offset) = {
            let f = &pool.faces[face];
            (f.normal, f.offset)
        };
        let empty = Vec::new();
        let set_of = |key: FaceKey| {
            pool.faces[key]
                .beyond
                .and_then(|b| pool.beyond.get(b))
                .map_or(&empty, |b| &b.0)
        };

        beyond_scratch.clear();
        beyond_marks.clear();
        let mut furthest = Furthest::new();

        for &v in set_of(smaller) {
            if v == apex {
                continue;
            }
            beyond_marks.insert(v);
            classify(&normal, offset, &positions[v], v, beyond_scratch, &mut furthest);
        }
        for &v in set_of(larger) {
            if v == apex || beyond_marks.contains(&v) {
                continue;
            }
            classify(&normal, offset, &positions[v], v, beyond_scratch, &mut furthest);
        }
        furthest.vertex
    }

    /// Records `vertex` as singular once; later apex picks skip it.
    fn quarantine(&mut self, vertex: usize) {
        if self.singular_set.insert(vertex) {
            self.singular.push(vertex);
        }
    }

    fn handle_singular(&mut self, apex: usize) {
        self.rollback_centroid(apex);
        self.discard_cone();

        self.quarantine(apex);
        for index in 0..self.affected.len() {
            let face = self.affected[index];
            if let Some(beyond) = self.pool.faces[face].beyond.take() {
                if let Some(buffer) = self.pool.beyond.get(beyond) {
                    for &v in &buffer.0 {
                        if self.singular_set.insert(v) {
                            self.singular.push(v);
                        }
                    }
                }
                self.pool.beyond.release(beyond);
            }
            self.pool.faces[face].furthest = None;
            self.finalize(face);
            self.worklist_remove(face);
        }

        tracing::debug!(
            apex,
            affected = self.affected.len(),
            quarantined = self.singular.len(),
            "apex quarantined as singular"
        );
    }

    // -------------------------------------------------------------------------
    // Output
    // -------------------------------------------------------------------------

    fn finish(self) -> ConvexHull<D> {
        let mut index: FastHashMap<FaceKey, usize> = fast_hash_map_with_capacity(self.convex.len());
        let mut live = Vec::with_capacity(self.convex.len());
        for &face in &self.convex {
            if self.pool.faces.contains(face) && !index.contains_key(&face) {
                index.insert(face, live.len());
                live.push(face);
            }
        }

        let mut vertices = HullVertex::from_positions(&self.positions);
        let simplices: Vec<Simplex<D>> = live
            .iter()
            .map(|&key| {
                let f = &self.pool.faces[key];
                for &v in &f.vertices {
                    vertices[v].set_on_hull(true);
                }
                Simplex {
                    vertices: f.vertices,
                    normal: f.normal,
                    offset: f.offset,
                    is_normal_flipped: f.is_normal_flipped,
                    adjacent: f.adjacent.map(|a| a.and_then(|k| index.get(&k).copied())),
                    centroid: centroid(f.vertices.iter().map(|&v| &self.positions[v]))
                        .unwrap_or([0.0; D]),
                }
            })
            .collect();

        let hull_vertex_ids = vertices
            .iter()
            .filter(|v| v.is_on_hull())
            .map(HullVertex::id)
            .collect();

        ConvexHull {
            vertices,
            simplices,
            hull_vertex_ids,
            singular: self.singular,
            centroid: self.centroid,
            pool_stats: self.pool.stats(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::util::{generate_grid_points, generate_random_points_seeded};
    use approx::assert_relative_eq;

    fn assert_encloses<const D: usize>(hull: &ConvexHull<D>, points: &[[f64; D]]) {
        for p in points {
            assert!(hull.contains(p), "{p:?} lies outside the hull");
        }
    }

    #[test]
    fn unit_square_has_four_edges() {
        let hull = ConvexHull::<2>::generate(&[[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]])
            .unwrap();
        assert_eq!(hull.number_of_simplices(), 4);
        assert_eq!(hull.hull_vertex_ids(), &[0, 1, 2, 3]);
        assert!(hull.singular_vertices().is_empty());
        hull.validate().unwrap();
    }

    #[test]
    fn interior_point_is_not_on_hull() {
        let points = [[0.0, 0.0], [4.0, 0.0], [0.0, 4.0], [1.0, 1.0]];
        let hull = ConvexHull::<2>::generate(&points).unwrap();
        assert_eq!(hull.number_of_simplices(), 3);
        assert!(!hull.is_on_hull(3));
        assert!(!hull.is_on_hull(99));
        assert_encloses(&hull, &points);
    }

    #[test]
    fn tetrahedron_has_four_faces() {
        let hull = ConvexHull::<3>::generate(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ])
        .unwrap();
        assert_eq!(hull.number_of_simplices(), 4);
        assert_eq!(hull.hull_vertex_ids(), &[0, 1, 2, 3]);
        hull.validate().unwrap();
        for s in hull.simplices() {
            assert!(s.vertices().windows(2).all(|w| w[0] < w[1]));
            assert!(s.distance(hull.centroid()) < 0.0);
        }
    }

    #[test]
    fn cube_with_center_triangulates_faces() {
        let mut points: Vec<[f64; 3]> = generate_grid_points(2, 1.0, [0.0; 3]).unwrap();
        points.push([0.5, 0.5, 0.5]);
        let hull = ConvexHull::<3>::generate(&points).unwrap();
        assert_eq!(hull.number_of_simplices(), 12);
        assert!(!hull.is_on_hull(8));
        hull.validate().unwrap();
        assert_encloses(&hull, &points);
    }

    #[test]
    fn four_dimensional_simplex() {
        let mut points = vec![[0.0; 4]];
        for axis in 0..4 {
            let mut p = [0.0; 4];
            p[axis] = 1.0;
            points.push(p);
        }
        let hull = ConvexHull::<4>::generate(&points).unwrap();
        assert_eq!(hull.number_of_simplices(), 5);
        hull.validate().unwrap();
    }

    #[test]
    fn too_few_points_give_an_empty_hull() {
        let hull = ConvexHull::<2>::generate(&[[0.0, 0.0], [1.0, 0.0]]).unwrap();
        assert!(hull.is_empty());
        assert_eq!(hull.vertices().len(), 2);
        assert!(!hull.contains(&[0.0, 0.0]));
    }

    #[test]
    fn coincident_points_are_degenerate() {
        let err = ConvexHull::<2>::generate(&[[1.0, 1.0]; 3]).unwrap_err();
        assert!(matches!(err, HullError::DegenerateGeometry { .. }));
    }

    #[test]
    fn coplanar_cloud_is_degenerate_in_3d() {
        let points: Vec<[f64; 3]> = generate_grid_points::<2>(4, 1.0, [0.0, 0.0])
            .unwrap()
            .into_iter()
            .map(|[x, y]| [x, y, 0.0])
            .collect();
        assert!(matches!(
            ConvexHull::<3>::generate(&points),
            Err(HullError::DegenerateGeometry { .. })
        ));
    }

    #[test]
    fn exactly_d_plus_one_flat_points_form_a_pillow() {
        let hull = ConvexHull::<2>::generate(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]).unwrap();
        assert_eq!(hull.number_of_simplices(), 3);
        hull.validate().unwrap();
    }

    #[test]
    fn non_finite_input_is_rejected() {
        let err =
            ConvexHull::<2>::generate(&[[0.0, 0.0], [f64::NAN, 1.0], [1.0, 0.0]]).unwrap_err();
        assert!(matches!(err, HullError::CoordinateConversion(_)));
    }

    #[test]
    fn f32_input_is_accepted() {
        let hull = ConvexHull::<2>::generate(&[[0.0f32, 0.0], [1.0, 0.0], [0.0, 1.0]]).unwrap();
        assert_eq!(hull.number_of_simplices(), 3);
    }

    #[test]
    fn centroid_averages_hull_vertices() {
        let hull = ConvexHull::<2>::generate(&[[0.0, 0.0], [3.0, 0.0], [0.0, 3.0]]).unwrap();
        assert_relative_eq!(hull.centroid()[0], 1.0, epsilon = 1e-12);
        assert_relative_eq!(hull.centroid()[1], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn apex_insertion_keeps_ids_sorted() {
        let mut v = [2, 5, 9];
        let slot = HullBuilder::<3>::insert_apex(&mut v, 2, 4);
        assert_eq!((v, slot), ([2, 4, 5], 1));

        let mut v = [2, 5, 9];
        let slot = HullBuilder::<3>::insert_apex(&mut v, 0, 7);
        assert_eq!((v, slot), ([5, 7, 9], 1));

        let mut v = [2, 5, 9];
        let slot = HullBuilder::<3>::insert_apex(&mut v, 1, 12);
        assert_eq!((v, slot), ([2, 9, 12], 2));

        let mut v = [2, 5, 9];
        let slot = HullBuilder::<3>::insert_apex(&mut v, 1, 0);
        assert_eq!((v, slot), ([0, 2, 9], 0));
    }

    #[test]
    fn facet_hash_depends_on_order_and_ids() {
        assert_eq!(facet_hash(&[]), 31);
        assert_eq!(facet_hash(&[1]), 31 + 23 * 31 + 1);
        assert_ne!(facet_hash(&[1, 2]), facet_hash(&[2, 1]));
    }

    #[test]
    fn initial_faces_keep_the_centroid_inside() {
        let tetra = [[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 2.0]];
        let mut swapped = tetra;
        swapped.swap(1, 2);
        for points in [tetra, swapped] {
            let mut builder = HullBuilder::new(points.to_vec());
            builder.initialize().unwrap();
            assert_eq!(builder.convex.len(), 4);
            for &key in &builder.convex {
                let face = &builder.pool.faces[key];
                assert!(dot(&face.normal, &builder.centroid) + face.offset < 0.0);
                for &v in &face.vertices {
                    assert_relative_eq!(
                        dot(&face.normal, &points[v]) + face.offset,
                        0.0,
                        epsilon = 1e-12
                    );
                }
            }
        }
    }

    /// Right triangle with two points beyond its hypotenuse; (6, 6) is the
    /// furthest.
    fn triangle_with_outliers() -> HullBuilder<2> {
        let points = vec![[0.0, 0.0], [10.0, 0.0], [0.0, 10.0], [6.0, 6.0], [5.5, 5.0]];
        let mut builder = HullBuilder::new(points);
        builder.initialize().unwrap();
        builder
    }

    #[test]
    fn singular_apex_quarantines_its_beyond_set() {
        let mut builder = triangle_with_outliers();
        let head = builder.worklist_head.unwrap();
        assert_eq!(builder.pool.faces[head].furthest, Some(3));
        let centroid_before = builder.centroid;

        builder.quarantine(3);
        builder.run();
        assert!(builder.worklist_head.is_none());
        assert_relative_eq!(builder.centroid[0], centroid_before[0], epsilon = 1e-12);
        assert_relative_eq!(builder.centroid[1], centroid_before[1], epsilon = 1e-12);

        let hull = builder.finish();
        assert_eq!(hull.singular_vertices(), &[3, 4]);
        assert_eq!(hull.hull_vertex_ids(), &[0, 1, 2]);
        assert_eq!(hull.number_of_simplices(), 3);
        assert!(!hull.contains(&[6.0, 6.0]));
        hull.validate().unwrap();
    }

    #[test]
    fn quarantine_leaves_other_apexes_alone() {
        let mut builder = triangle_with_outliers();
        builder.quarantine(4);
        builder.run();

        let hull = builder.finish();
        assert_eq!(hull.singular_vertices(), &[4]);
        assert_eq!(hull.hull_vertex_ids(), &[0, 1, 2, 3]);
        assert_eq!(hull.number_of_simplices(), 4);
        hull.validate().unwrap();
    }

    macro_rules! gen_random_hull_tests {
        ($d:literal, $n:literal) => {
            pastey::paste! {
                #[test]
                fn [<random_hull_is_closed_and_encloses_input_ $d d>]() {
                    for seed in 0..5 {
                        let points = generate_random_points_seeded::<f64, $d>($n, (-10.0, 10.0), seed)
                            .unwrap();
                        let hull = ConvexHull::<$d>::generate(&points).unwrap();
                        hull.validate().unwrap();
                        assert_encloses(&hull, &points);
                        for s in hull.simplices() {
                            for &v in s.vertices() {
                                assert!(hull.is_on_hull(v));
                            }
                        }
                        let stats = hull.pool_stats();
                        assert!(stats.faces.acquired() >= hull.number_of_simplices());
                    }
                }
            }
        };
    }

    gen_random_hull_tests!(2, 60);
    gen_random_hull_tests!(3, 60);
    gen_random_hull_tests!(4, 40);
}
