//! Vector norms, dot products and distances over fixed-size arrays.

use num_traits::Float;

use crate::geometry::traits::coordinate::CoordinateScalar;
use crate::geometry::util::conversions::count_to_f64;

/// Sum of squares of the coordinates.
///
/// # Examples
///
/// ```
/// use hull_diagrams::geometry::util::squared_norm;
///
/// assert_eq!(squared_norm(&[3.0, 4.0]), 25.0);
/// assert_eq!(squared_norm(&[1.0, 2.0, 2.0]), 9.0);
/// ```
pub fn squared_norm<T, const D: usize>(coords: &[T; D]) -> T
where
    T: CoordinateScalar,
{
    coords.iter().fold(T::zero(), |acc, &x| acc + x * x)
}

/// Euclidean norm, scaled by the largest component to avoid overflow.
///
/// # Examples
///
/// ```
/// use hull_diagrams::geometry::util::hypot;
///
/// assert_eq!(hypot(&[3.0, 4.0]), 5.0);
/// assert_eq!(hypot(&[1.0, 1.0, 1.0, 1.0]), 2.0);
/// ```
pub fn hypot<T, const D: usize>(coords: &[T; D]) -> T
where
    T: CoordinateScalar,
{
    let max_abs = coords
        .iter()
        .fold(T::zero(), |acc, &x| Float::max(acc, Float::abs(x)));
    if max_abs == T::zero() || !max_abs.is_finite() {
        return max_abs;
    }
    let scaled = coords.iter().fold(T::zero(), |acc, &x| {
        let s = x / max_abs;
        acc + s * s
    });
    max_abs * Float::sqrt(scaled)
}

/// Dot product of two vectors.
#[inline]
pub fn dot<T, const D: usize>(a: &[T; D], b: &[T; D]) -> T
where
    T: CoordinateScalar,
{
    a.iter().zip(b).fold(T::zero(), |acc, (&x, &y)| acc + x * y)
}

/// Component-wise difference `a - b`.
#[inline]
pub fn sub<T, const D: usize>(a: &[T; D], b: &[T; D]) -> [T; D]
where
    T: CoordinateScalar,
{
    std::array::from_fn(|i| a[i] - b[i])
}

/// Squared Euclidean distance between two points.
///
/// # Examples
///
/// ```
/// use hull_diagrams::geometry::util::squared_distance;
///
/// assert_eq!(squared_distance(&[0.0, 0.0], &[1.0, 1.0]), 2.0);
/// ```
#[inline]
pub fn squared_distance<T, const D: usize>(a: &[T; D], b: &[T; D]) -> T
where
    T: CoordinateScalar,
{
    squared_norm(&sub(a, b))
}

/// Euclidean distance between two points.
#[inline]
pub fn distance<T, const D: usize>(a: &[T; D], b: &[T; D]) -> T
where
    T: CoordinateScalar,
{
    hypot(&sub(a, b))
}

/// Midpoint of the segment `ab`.
#[inline]
pub fn midpoint<const D: usize>(a: &[f64; D], b: &[f64; D]) -> [f64; D] {
    std::array::from_fn(|i| 0.5 * (a[i] + b[i]))
}

/// Arithmetic mean of the points, or `None` when there are none.
///
/// # Examples
///
/// ```
/// use hull_diagrams::geometry::util::centroid;
///
/// let pts = [[0.0, 0.0], [2.0, 0.0], [1.0, 3.0]];
/// assert_eq!(centroid(&pts), Some([1.0, 1.0]));
/// assert_eq!(centroid::<2>(&[]), None);
/// ```
pub fn centroid<'a, const D: usize>(
    points: impl IntoIterator<Item = &'a [f64; D]>,
) -> Option<[f64; D]> {
    let mut sum = [0.0; D];
    let mut count = 0usize;
    for p in points {
        for (s, x) in sum.iter_mut().zip(p) {
            *s += x;
        }
        count += 1;
    }
    if count == 0 {
        return None;
    }
    let n = count_to_f64(count);
    Some(sum.map(|s| s / n))
}
