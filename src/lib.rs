//! # hull-diagrams
//!
//! Incremental convex hulls in 2, 3 and 4 dimensions, and the diagrams
//! derived from them: Delaunay triangulations (by paraboloid lifting),
//! Urquhart graphs and Voronoi duals for planar and spatial point sets.
//!
//! # Features
//!
//! - QuickHull-style incremental hull builder with fully linked simplex
//!   adjacency and explicit reporting of vertices it could not incorporate
//! - Delaunay triangulation of 2D and 3D points via the lifted hull
//! - Urquhart pruning with optional site merging
//! - Voronoi regions, edges and bounded-ness per input vertex
//! - Generic input coordinates (`f32`, `f64`, anything implementing
//!   [`CoordinateScalar`](geometry::traits::coordinate::CoordinateScalar))
//!
//! # Convex hulls
//!
//! ```rust
//! use hull_diagrams::prelude::*;
//!
//! let points = [
//!     [0.0, 0.0, 0.0],
//!     [1.0, 0.0, 0.0],
//!     [0.0, 1.0, 0.0],
//!     [0.0, 0.0, 1.0],
//!     [0.1, 0.1, 0.1],
//! ];
//! let hull = ConvexHull::<3>::generate(&points).unwrap();
//!
//! assert_eq!(hull.number_of_simplices(), 4);
//! assert_eq!(hull.hull_vertex_ids(), &[0, 1, 2, 3]);
//! assert!(hull.contains(&[0.2, 0.2, 0.2]));
//! assert!(hull.validate().is_ok());
//! ```
//!
//! # Delaunay, Urquhart and Voronoi
//!
//! ```rust
//! use hull_diagrams::prelude::*;
//!
//! let points = [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [1.0, 1.0]];
//! let dt = Delaunay2::process(&points).unwrap();
//! assert_eq!(dt.number_of_cells(), 4);
//! assert!(!dt.is_on_hull(4));
//!
//! let urquhart = Urquhart::from_delaunay(&dt);
//! assert_eq!(urquhart.edges().len(), 4);
//!
//! let voronoi = Voronoi::from_delaunay(&dt, &VoronoiOptions::default()).unwrap();
//! assert_eq!(voronoi.region(4).unwrap().cells.len(), 4);
//! ```
//!
//! # Numerical caveats
//!
//! Visibility tests use the absolute tolerance
//! [`HULL_TOLERANCE`](core::algorithms::quickhull::HULL_TOLERANCE); inputs far
//! from unit scale should be normalized first. Point sets that are flat
//! (all collinear in 2D, coplanar in 3D) or, for Delaunay, entirely
//! co-circular or co-spherical are rejected as degenerate. A Delaunay cell
//! that is flat within that tolerance, or whose circumradius dwarfs the input
//! extent, is rejected the same way.
//!
//! # Logging
//!
//! The crate emits `tracing` events (build summaries at `debug`,
//! degeneracies at `warn`) and never installs a subscriber. Set
//! `HULL_DIAGRAMS_DEBUG_HULL` to get one `debug` event per hull iteration.

#![forbid(unsafe_code)]

#[macro_use]
extern crate derive_builder;

/// Hull engine, diagrams built on it, and their supporting data structures.
pub mod core {
    /// Construction algorithms.
    pub mod algorithms {
        /// Incremental convex hull construction.
        pub mod quickhull;
        /// Urquhart graph pruning and site merging.
        pub mod urquhart;
        pub use quickhull::*;
        pub use urquhart::*;
    }
    /// High-performance collection types used by the hull engine and diagrams
    pub mod collections;
    pub mod delaunay_triangulation;
    pub mod edge;
    pub mod pool;
    pub mod simplex;
    pub mod util;
    pub mod vertex;
    pub mod voronoi;
    // Re-export the `core` modules.
    pub use delaunay_triangulation::*;
    pub use edge::*;
    pub use simplex::*;
    pub use vertex::*;
    pub use voronoi::*;
    // Note: collections and pool are not re-exported here to avoid namespace pollution
}

/// Numeric building blocks: coordinate scalars, small determinants, norms,
/// circumspheres and point generators.
pub mod geometry {
    /// Stack-allocated determinants, hyperplane normals and affine spans.
    pub mod matrix;
    /// Traits module containing coordinate abstractions.
    ///
    /// [`CoordinateScalar`](traits::coordinate::CoordinateScalar) bounds every
    /// public input type; [`FiniteCheck`](traits::coordinate::FiniteCheck)
    /// backs the conversion checks.
    pub mod traits {
        pub mod coordinate;
        pub use coordinate::*;
    }
    /// Geometric utility functions
    pub mod util;
    pub use matrix::*;
    pub use traits::*;
    pub use util::*;
}

/// A prelude module that re-exports commonly used types.
/// This makes it easier to import the most commonly used items from the crate.
pub mod prelude {
    pub use crate::core::{
        algorithms::{quickhull::*, urquhart::*},
        delaunay_triangulation::*,
        edge::*,
        simplex::*,
        vertex::*,
        voronoi::*,
    };

    // Re-export commonly used collection types from core::collections
    pub use crate::core::collections::{
        FastHashMap, FastHashSet, SmallBuffer, VertexToCellsMap, fast_hash_map_with_capacity,
        fast_hash_set_with_capacity,
    };

    pub use crate::geometry::{
        traits::coordinate::*,
        util::{
            Bounds, Circumsphere, CircumsphereStrategy, Dimension, generate_circle_points,
            generate_grid_points, generate_random_points_seeded,
        },
    };
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{
        core::{
            algorithms::{quickhull::ConvexHull, urquhart::Urquhart},
            delaunay_triangulation::{Delaunay2, Delaunay3},
            voronoi::Voronoi,
        },
        is_normal,
    };

    // =============================================================================
    // TYPE SAFETY TESTS
    // =============================================================================

    #[test]
    fn normal_types() {
        assert!(is_normal::<ConvexHull<2>>());
        assert!(is_normal::<ConvexHull<4>>());
        assert!(is_normal::<Delaunay2>());
        assert!(is_normal::<Delaunay3>());
        assert!(is_normal::<Urquhart<3>>());
        assert!(is_normal::<Voronoi<2>>());
    }

    #[test]
    fn test_prelude_collections_exports() {
        use crate::prelude::*;

        let mut map: FastHashMap<u64, usize> = FastHashMap::default();
        map.insert(123, 456);
        assert_eq!(map.get(&123), Some(&456));

        let mut set: FastHashSet<EdgeKey> = FastHashSet::default();
        set.insert(EdgeKey::new(2, 1));
        assert!(set.contains(&EdgeKey::new(1, 2)));

        let mut buffer: SmallBuffer<i32, 8> = SmallBuffer::new();
        buffer.push(42);
        assert_eq!(buffer.len(), 1);

        let map_with_cap = fast_hash_map_with_capacity::<u64, usize>(100);
        assert!(map_with_cap.capacity() >= 100);

        let set_with_cap = fast_hash_set_with_capacity::<u64>(50);
        assert!(set_with_cap.capacity() >= 50);

        let _vertex_cells: VertexToCellsMap = VertexToCellsMap::default();
    }

    #[test]
    fn test_prelude_pipeline_exports() {
        use crate::prelude::*;

        let points = generate_random_points_seeded::<f64, 2>(40, (-1.0, 1.0), 11).unwrap();
        let dt = Delaunay2::process(&points).unwrap();
        let urquhart = Urquhart::from_delaunay(&dt);
        assert!(urquhart.edges().len() < dt.edges().len());

        let options = VoronoiOptions {
            cell_center: CellCenter::Balanced,
            ..VoronoiOptions::default()
        };
        let voronoi = Voronoi::from_delaunay(&dt, &options).unwrap();
        assert_eq!(voronoi.cell_centers().len(), dt.number_of_cells());
    }

    // =============================================================================
    // ALLOCATION COUNTING TESTS
    // =============================================================================

    /// Run these with `cargo test allocation_counting --features count-allocations`
    #[cfg(feature = "count-allocations")]
    #[test]
    fn test_allocation_counting_hull_build() {
        use allocation_counter::measure;

        let points = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let result = measure(|| {
            let hull = ConvexHull::<2>::generate(&points).unwrap();
            assert_eq!(hull.number_of_simplices(), 4);
        });

        assert!(
            result.count_total > 0,
            "Expected the hull build to allocate, found: {}",
            result.count_total
        );
        assert_eq!(
            result.count_current, 0,
            "Expected zero current allocations after the hull is dropped, found: {}",
            result.count_current
        );
    }
}
