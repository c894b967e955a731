//! Allocation and timing measurement for diagram builds.
//!
//! Allocation counting needs the `count-allocations` feature; without it the
//! allocation slot is `()` and only wall-clock time and pool counters are
//! recorded.

#![forbid(unsafe_code)]

use std::time::{Duration, Instant};

use crate::core::algorithms::quickhull::{ConvexHull, HullError};
use crate::core::pool::ObjectPoolStats;
use crate::geometry::traits::coordinate::CoordinateScalar;

/// Allocation counters collected while measuring.
#[cfg(feature = "count-allocations")]
pub type AllocationInfo = allocation_counter::AllocationInfo;

/// Allocation counters collected while measuring (empty without the
/// `count-allocations` feature).
#[cfg(not(feature = "count-allocations"))]
pub type AllocationInfo = ();

/// Runs `f`, returning its result together with the allocations it made.
///
/// # Panics
///
/// Never in practice: the closure always runs and sets the result.
///
/// # Examples
///
/// ```rust
/// use hull_diagrams::core::util::measure_with_result;
///
/// let (value, alloc) = measure_with_result(|| vec![1u8, 2, 3].len());
/// assert_eq!(value, 3);
/// let _ = alloc;
/// ```
#[cfg(feature = "count-allocations")]
pub fn measure_with_result<F, R>(f: F) -> (R, AllocationInfo)
where
    F: FnOnce() -> R,
{
    let mut result: Option<R> = None;
    let info = allocation_counter::measure(|| {
        result = Some(f());
    });
    (result.expect("measured closure always runs"), info)
}

/// Runs `f`, returning its result (no allocation tracking without the
/// `count-allocations` feature).
#[cfg(not(feature = "count-allocations"))]
pub fn measure_with_result<F, R>(f: F) -> (R, AllocationInfo)
where
    F: FnOnce() -> R,
{
    (f(), ())
}

/// Metrics recorded for one hull build.
#[derive(Clone, Debug)]
pub struct HullBuildMetrics {
    /// Wall-clock time of the build.
    pub elapsed: Duration,
    /// How the working-object pools served the build.
    pub pools: ObjectPoolStats,
    /// Allocations made during the build.
    pub allocations: AllocationInfo,
}

impl HullBuildMetrics {
    /// Fraction of pool requests served by recycled objects.
    #[must_use]
    pub fn reuse_ratio(&self) -> f64 {
        let stats = [
            self.pools.faces,
            self.pools.connectors,
            self.pools.beyond,
            self.pools.deferred,
        ];
        let acquired: usize = stats.iter().map(|s| s.acquired()).sum();
        let reused: usize = stats.iter().map(|s| s.reused).sum();
        if acquired == 0 {
            return 0.0;
        }
        crate::geometry::util::conversions::count_to_f64(reused)
            / crate::geometry::util::conversions::count_to_f64(acquired)
    }
}

/// Builds a hull and reports how long it took and how the pools behaved.
///
/// # Errors
///
/// Propagates the [`HullError`] of the build.
///
/// # Examples
///
/// ```rust
/// use hull_diagrams::core::util::measure_hull;
/// use hull_diagrams::geometry::util::generate_random_points_seeded;
///
/// let points = generate_random_points_seeded::<f64, 3>(200, (-1.0, 1.0), 7).unwrap();
/// let (hull, metrics) = measure_hull(&points).unwrap();
/// assert!(!hull.is_empty());
/// assert!(metrics.pools.faces.reused > 0);
/// ```
pub fn measure_hull<T: CoordinateScalar, const D: usize>(
    points: &[[T; D]],
) -> Result<(ConvexHull<D>, HullBuildMetrics), HullError> {
    let start = Instant::now();
    let (result, allocations) = measure_with_result(|| ConvexHull::<D>::generate(points));
    let elapsed = start.elapsed();
    let hull = result?;

    let metrics = HullBuildMetrics {
        elapsed,
        pools: hull.pool_stats(),
        allocations,
    };
    tracing::debug!(
        dimension = D,
        simplices = hull.number_of_simplices(),
        elapsed_us = metrics.elapsed.as_micros(),
        reuse_ratio = metrics.reuse_ratio(),
        "measured hull build"
    );
    Ok((hull, metrics))
}
