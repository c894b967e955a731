//! Point generation for tests, benchmarks and demos.
//!
//! All generators are deterministic given their parameters; random ones take
//! an explicit seed.

use rand::distr::uniform::SampleUniform;
use rand::{Rng, SeedableRng};

use crate::geometry::traits::coordinate::CoordinateScalar;

pub use super::RandomPointGenerationError;

/// Default cap on the number of points a grid may produce.
const MAX_GRID_POINTS_DEFAULT: usize = 4_000_000;

/// Reads `HULL_DIAGRAMS_MAX_GRID_POINTS`, falling back to the default cap.
fn max_grid_points() -> usize {
    if let Ok(v) = std::env::var("HULL_DIAGRAMS_MAX_GRID_POINTS")
        && let Ok(n) = v.parse::<usize>()
    {
        return n;
    }
    MAX_GRID_POINTS_DEFAULT
}

/// Generate random points with a seeded RNG for reproducible results.
///
/// # Errors
///
/// * `RandomPointGenerationError::InvalidRange` if min >= max
///
/// # Examples
///
/// ```
/// use hull_diagrams::geometry::util::generate_random_points_seeded;
///
/// let a = generate_random_points_seeded::<f64, 3>(100, (-5.0, 5.0), 42).unwrap();
/// let b = generate_random_points_seeded::<f64, 3>(100, (-5.0, 5.0), 42).unwrap();
/// assert_eq!(a, b);
///
/// assert!(generate_random_points_seeded::<f64, 2>(10, (1.0, -1.0), 0).is_err());
/// ```
pub fn generate_random_points_seeded<T: CoordinateScalar + SampleUniform, const D: usize>(
    n_points: usize,
    range: (T, T),
    seed: u64,
) -> Result<Vec<[T; D]>, RandomPointGenerationError> {
    if range.0 >= range.1 {
        return Err(RandomPointGenerationError::InvalidRange {
            min: format!("{:?}", range.0),
            max: format!("{:?}", range.1),
        });
    }

    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    Ok((0..n_points)
        .map(|_| [T::zero(); D].map(|_| rng.random_range(range.0..range.1)))
        .collect())
}

/// Generate points on a regular grid with `points_per_dim` samples per axis.
///
/// Grids are the classic cospherical stress case for Delaunay construction.
///
/// # Errors
///
/// * `RandomPointGenerationError::InvalidPointCount` if `points_per_dim` is zero
/// * `RandomPointGenerationError::RandomGenerationFailed` if the grid would
///   exceed the point cap (`HULL_DIAGRAMS_MAX_GRID_POINTS`)
///
/// # Examples
///
/// ```
/// use hull_diagrams::geometry::util::generate_grid_points;
///
/// let grid = generate_grid_points::<2>(3, 1.0, [0.0, 0.0]).unwrap();
/// assert_eq!(grid.len(), 9);
/// assert_eq!(grid[0], [0.0, 0.0]);
/// assert_eq!(grid[8], [2.0, 2.0]);
/// ```
pub fn generate_grid_points<const D: usize>(
    points_per_dim: usize,
    spacing: f64,
    offset: [f64; D],
) -> Result<Vec<[f64; D]>, RandomPointGenerationError> {
    if points_per_dim == 0 {
        return Err(RandomPointGenerationError::InvalidPointCount { n_points: 0 });
    }

    let cap = max_grid_points();
    let total_points = (0..D)
        .try_fold(1usize, |acc, _| acc.checked_mul(points_per_dim))
        .filter(|&total| total <= cap)
        .ok_or_else(|| RandomPointGenerationError::RandomGenerationFailed {
            min: "0".into(),
            max: format!("{}", points_per_dim - 1),
            details: format!("Requested grid {points_per_dim}^{D} exceeds the cap of {cap} points"),
        })?;

    let step: Vec<f64> = (0..points_per_dim)
        .map(|i| super::safe_usize_to_f64(i).map(|s| s * spacing))
        .collect::<Result<_, _>>()
        .map_err(|e| RandomPointGenerationError::RandomGenerationFailed {
            min: "0".into(),
            max: format!("{}", points_per_dim - 1),
            details: e.to_string(),
        })?;

    let mut points = Vec::with_capacity(total_points);
    let mut idx = [0usize; D];
    for _ in 0..total_points {
        points.push(std::array::from_fn(|d| offset[d] + step[idx[d]]));

        // Mixed-radix increment, last axis fastest.
        for d in (0..D).rev() {
            idx[d] += 1;
            if idx[d] < points_per_dim {
                break;
            }
            idx[d] = 0;
        }
    }
    Ok(points)
}

/// Generate `n_points` evenly spaced points on a circle.
///
/// # Errors
///
/// * `RandomPointGenerationError::InvalidPointCount` if `n_points` is zero
///
/// # Examples
///
/// ```
/// use hull_diagrams::geometry::util::generate_circle_points;
///
/// let ring = generate_circle_points(4, 1.0, [0.0, 0.0]).unwrap();
/// assert_eq!(ring.len(), 4);
/// assert!((ring[1][1] - 1.0).abs() < 1e-12);
/// ```
pub fn generate_circle_points(
    n_points: usize,
    radius: f64,
    center: [f64; 2],
) -> Result<Vec<[f64; 2]>, RandomPointGenerationError> {
    if n_points == 0 {
        return Err(RandomPointGenerationError::InvalidPointCount { n_points });
    }
    let n = super::safe_usize_to_f64(n_points).map_err(|e| {
        RandomPointGenerationError::RandomGenerationFailed {
            min: "0".into(),
            max: n_points.to_string(),
            details: e.to_string(),
        }
    })?;
    let mut points = Vec::with_capacity(n_points);
    let mut angle_index = 0.0;
    for _ in 0..n_points {
        let theta = std::f64::consts::TAU * angle_index / n;
        points.push([
            radius.mul_add(theta.cos(), center[0]),
            radius.mul_add(theta.sin(), center[1]),
        ]);
        angle_index += 1.0;
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_points_stay_in_range() {
        let points = generate_random_points_seeded::<f32, 4>(200, (-1.0, 1.0), 9).unwrap();
        assert_eq!(points.len(), 200);
        assert!(points.iter().flatten().all(|&c| (-1.0..1.0).contains(&c)));
    }

    #[test]
    fn different_seeds_differ() {
        let a = generate_random_points_seeded::<f64, 2>(20, (0.0, 1.0), 1).unwrap();
        let b = generate_random_points_seeded::<f64, 2>(20, (0.0, 1.0), 2).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn grid_rejects_zero_per_axis() {
        assert!(matches!(
            generate_grid_points::<3>(0, 1.0, [0.0; 3]),
            Err(RandomPointGenerationError::InvalidPointCount { n_points: 0 })
        ));
    }

    #[test]
    fn grid_counts_and_offsets() {
        let grid = generate_grid_points::<3>(3, 2.0, [1.0, 1.0, 1.0]).unwrap();
        assert_eq!(grid.len(), 27);
        assert_eq!(grid[1], [1.0, 1.0, 3.0]);
        assert_eq!(grid[26], [5.0, 5.0, 5.0]);
    }

    #[test]
    fn grid_overflow_is_an_error() {
        assert!(generate_grid_points::<4>(usize::MAX, 1.0, [0.0; 4]).is_err());
    }

    #[test]
    fn circle_points_are_on_the_circle() {
        let ring = generate_circle_points(16, 3.0, [1.0, -1.0]).unwrap();
        for p in ring {
            let r = (p[0] - 1.0).hypot(p[1] + 1.0);
            assert!((r - 3.0).abs() < 1e-12);
        }
    }
}
