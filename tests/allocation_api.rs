//! Allocation and pool-reuse checks for hull and diagram builds.
//!
//! Allocation counts are only available with
//! `cargo test --features count-allocations`; without the feature the
//! measurements still run and report pool counters and timings.

use hull_diagrams::core::algorithms::quickhull::ConvexHull;
use hull_diagrams::core::delaunay_triangulation::Delaunay3;
use hull_diagrams::core::pool::{Pool, PoolStats, Recycle};
use hull_diagrams::core::util::{AllocationInfo, measure_hull, measure_with_result};
use hull_diagrams::geometry::util::generate_random_points_seeded;
use slotmap::DefaultKey;

/// Common helpers for allocation tests
pub mod test_helpers {
    use super::AllocationInfo;

    /// Print memory allocation summary
    #[cfg(feature = "count-allocations")]
    pub fn print_alloc_summary(info: &AllocationInfo, operation: &str) {
        println!("\n=== Memory Allocation Summary for {operation} ===");
        println!("Total allocations: {}", info.count_total);
        println!("Current allocations: {}", info.count_current);
        println!("Max allocations: {}", info.count_max);
        println!("Total bytes allocated: {}", info.bytes_total);
        println!("Max bytes allocated: {}", info.bytes_max);
    }

    /// Print memory allocation summary (allocation counting disabled)
    #[cfg(not(feature = "count-allocations"))]
    pub fn print_alloc_summary(_info: &AllocationInfo, operation: &str) {
        println!("\n=== Memory Allocation Summary for {operation} ===");
        println!("Allocation counting not enabled");
    }
}

use test_helpers::print_alloc_summary;

#[derive(Default)]
struct Scratch {
    items: Vec<u64>,
    recycled: usize,
}

impl Recycle for Scratch {
    fn recycle(&mut self) {
        self.items.clear();
        self.recycled += 1;
    }
}

#[test]
fn pool_recycles_released_objects() {
    let mut pool: Pool<DefaultKey, Scratch> = Pool::with_capacity(4);
    let a = pool.acquire();
    pool[a].items.extend([1, 2, 3]);
    let capacity = pool[a].items.capacity();
    assert!(pool.release(a));
    assert!(!pool.contains(a));
    assert_eq!(pool.parked(), 1);

    let b = pool.acquire();
    assert!(pool[b].items.is_empty());
    assert_eq!(pool[b].items.capacity(), capacity);
    assert_eq!(pool[b].recycled, 1);
    assert_eq!(
        pool.stats(),
        PoolStats {
            allocated: 1,
            reused: 1,
            released: 1
        }
    );
    assert_eq!(pool.stats().acquired(), 2);
}

#[test]
fn stale_handles_are_rejected() {
    let mut pool: Pool<DefaultKey, Scratch> = Pool::new();
    let a = pool.acquire();
    assert!(pool.release(a));
    let _b = pool.acquire();
    assert!(!pool.release(a));
    assert!(pool.get(a).is_none());
    assert_eq!(pool.len(), 1);
}

#[test]
fn hull_builds_reuse_pooled_faces() {
    let points = generate_random_points_seeded::<f64, 3>(500, (-1.0, 1.0), 77).unwrap();
    let hull = ConvexHull::<3>::generate(&points).unwrap();
    let stats = hull.pool_stats();

    assert!(stats.faces.acquired() >= hull.number_of_simplices());
    assert!(stats.faces.reused > 0);
    assert!(stats.faces.released > 0);
    assert!(stats.beyond.acquired() > 0);
}

#[test]
fn measured_hull_matches_plain_build() {
    let points = generate_random_points_seeded::<f64, 4>(200, (-1.0, 1.0), 5).unwrap();
    let (hull, metrics) = measure_hull(&points).unwrap();
    let plain = ConvexHull::<4>::generate(&points).unwrap();

    assert_eq!(hull.simplices(), plain.simplices());
    assert_eq!(metrics.pools, plain.pool_stats());
    assert!(metrics.reuse_ratio() > 0.0);
    print_alloc_summary(&metrics.allocations, "4D hull of 200 points");
}

#[test]
fn measured_triangulation_workflow() {
    let points = generate_random_points_seeded::<f64, 3>(100, (-5.0, 5.0), 19).unwrap();
    let (result, info) = measure_with_result(|| {
        let dt = Delaunay3::process(&points).unwrap();
        (dt.number_of_cells(), dt.edges().len())
    });
    assert!(result.0 > 0);
    assert!(result.1 > 0);
    print_alloc_summary(&info, "3D Delaunay of 100 points");
}

#[cfg(feature = "count-allocations")]
#[test]
fn hull_allocations_are_counted() {
    let points = generate_random_points_seeded::<f64, 2>(300, (-1.0, 1.0), 1).unwrap();
    let (simplices, info) = measure_with_result(|| {
        let hull = ConvexHull::<2>::generate(&points).unwrap();
        hull.number_of_simplices()
    });
    assert!(simplices >= 3);
    assert!(info.count_total > 0);
    assert!(info.bytes_max >= info.bytes_current);
}
