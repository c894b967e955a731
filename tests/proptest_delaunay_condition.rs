//! Property-based tests for the Delaunay layer and its duals.
//!
//! Verified properties:
//! - No input vertex lies strictly inside any cell's circumsphere
//! - Planar triangulations satisfy Euler's formula
//! - Delaunay hull flags agree with the direct convex hull
//! - Voronoi edges are exactly the adjacent cell pairs
//! - The Urquhart graph removes exactly the longest edge of each cell

use hull_diagrams::core::algorithms::quickhull::ConvexHull;
use hull_diagrams::core::algorithms::urquhart::Urquhart;
use hull_diagrams::core::delaunay_triangulation::{Delaunay, Delaunay2};
use hull_diagrams::core::edge::EdgeKey;
use hull_diagrams::core::voronoi::{Voronoi, VoronoiOptions};
use hull_diagrams::geometry::util::squared_distance;
use proptest::prelude::*;

/// Strategy for generating finite f64 coordinates
fn finite_coordinate() -> impl Strategy<Value = f64> {
    (-10.0..10.0).prop_filter("must be finite", |x: &f64| x.is_finite())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Adjacent cell pairs as recorded by the triangulation.
fn adjacent_pairs<const D: usize, const L: usize>(dt: &Delaunay<D, L>) -> Vec<EdgeKey> {
    let mut pairs: Vec<EdgeKey> = dt
        .cells()
        .iter()
        .enumerate()
        .flat_map(|(i, c)| c.neighbors().iter().flatten().map(move |&n| EdgeKey::new(i, n)))
        .collect();
    pairs.sort_unstable();
    pairs.dedup();
    pairs
}

macro_rules! test_delaunay_properties {
    ($dim:literal, $lifted:literal, $min_vertices:literal, $max_vertices:literal) => {
        pastey::paste! {
            proptest! {
                /// Property: circumspheres are empty
                #[test]
                fn [<prop_empty_circumsphere_ $dim d>](
                    points in prop::collection::vec(
                        prop::array::[<uniform $dim>](finite_coordinate()),
                        $min_vertices..=$max_vertices
                    )
                ) {
                    init_tracing();
                    if let Ok(dt) = Delaunay::<$dim, $lifted>::process(&points) {
                        prop_assume!(dt.singular_vertices().is_empty());
                        prop_assert!(
                            dt.validate_empty_circumsphere().is_ok(),
                            "{}D: {:?}",
                            $dim,
                            dt.validate_empty_circumsphere().err()
                        );
                    }
                }

                /// Property: neighbours are mutual and share a full facet
                #[test]
                fn [<prop_cell_adjacency_is_mutual_ $dim d>](
                    points in prop::collection::vec(
                        prop::array::[<uniform $dim>](finite_coordinate()),
                        $min_vertices..=$max_vertices
                    )
                ) {
                    if let Ok(dt) = Delaunay::<$dim, $lifted>::process(&points) {
                        for (i, cell) in dt.cells().iter().enumerate() {
                            for &n in cell.neighbors().iter().flatten() {
                                let other = &dt.cells()[n];
                                prop_assert!(other.neighbors().contains(&Some(i)));
                                let shared = cell
                                    .vertices()
                                    .iter()
                                    .filter(|v| other.contains_vertex(**v))
                                    .count();
                                prop_assert_eq!(shared, $dim);
                            }
                        }
                    }
                }

                /// Property: Voronoi edges are dual to shared Delaunay facets
                #[test]
                fn [<prop_voronoi_duality_ $dim d>](
                    points in prop::collection::vec(
                        prop::array::[<uniform $dim>](finite_coordinate()),
                        $min_vertices..=$max_vertices
                    )
                ) {
                    if let Ok(dt) = Delaunay::<$dim, $lifted>::process(&points) {
                        let voronoi = Voronoi::from_delaunay(&dt, &VoronoiOptions::default()).unwrap();
                        let expected = adjacent_pairs(&dt);
                        prop_assert_eq!(voronoi.edges(), expected.as_slice());
                        for region in voronoi.regions() {
                            for &c in &region.cells {
                                prop_assert!(dt.cells()[c].contains_vertex(region.site));
                            }
                        }
                    }
                }

                /// Property: Urquhart drops exactly each cell's longest edge
                #[test]
                fn [<prop_urquhart_removes_longest_edges_ $dim d>](
                    points in prop::collection::vec(
                        prop::array::[<uniform $dim>](finite_coordinate()),
                        $min_vertices..=$max_vertices
                    )
                ) {
                    if let Ok(dt) = Delaunay::<$dim, $lifted>::process(&points) {
                        let graph = Urquhart::from_delaunay(&dt);
                        for (cell, longest) in dt.cells().iter().zip(graph.longest_edges()) {
                            let p = dt.positions();
                            let max = cell
                                .edges()
                                .map(|e| squared_distance(&p[e.v0()], &p[e.v1()]))
                                .fold(f64::NEG_INFINITY, f64::max);
                            prop_assert_eq!(
                                squared_distance(&p[longest.v0()], &p[longest.v1()]),
                                max
                            );
                            prop_assert!(!graph.contains(*longest));
                        }
                        for edge in graph.edges() {
                            prop_assert!(dt.contains_edge(*edge));
                        }
                        prop_assert_eq!(
                            graph.edges().len() + graph.removed_edges().len(),
                            dt.edges().len()
                        );
                    }
                }
            }
        }
    };
}

test_delaunay_properties!(2, 3, 4, 30);
test_delaunay_properties!(3, 4, 5, 20);

proptest! {
    /// Property: V - E + F = 1 for a planar triangulation using every vertex
    #[test]
    fn prop_planar_euler_characteristic(
        points in prop::collection::vec(prop::array::uniform2(finite_coordinate()), 4..=30)
    ) {
        if let Ok(dt) = Delaunay2::process(&points) {
            let mut used: Vec<usize> = dt.cells().iter().flat_map(|c| c.vertices().iter().copied()).collect();
            used.sort_unstable();
            used.dedup();
            prop_assume!(used.len() == points.len());
            let v = i64::try_from(used.len()).unwrap();
            let e = i64::try_from(dt.edges().len()).unwrap();
            let f = i64::try_from(dt.number_of_cells()).unwrap();
            prop_assert_eq!(v - e + f, 1);
        }
    }

    /// Property: Delaunay hull vertices are the convex hull vertices
    #[test]
    fn prop_hull_flags_agree_with_convex_hull(
        points in prop::collection::vec(prop::array::uniform2(finite_coordinate()), 4..=30)
    ) {
        if let (Ok(dt), Ok(hull)) = (Delaunay2::process(&points), ConvexHull::<2>::generate(&points)) {
            prop_assume!(dt.singular_vertices().is_empty() && hull.singular_vertices().is_empty());
            prop_assert_eq!(dt.hull_vertices(), hull.hull_vertex_ids());
        }
    }
}
