//! Matrix operations.
//!
//! Small stack-allocated determinants backed by `la-stack`, plus the two
//! geometric primitives the hull engine builds on them: the unit normal of
//! the hyperplane through `D` points and the affine span used while picking
//! the initial simplex.

#![forbid(unsafe_code)]

use la_stack::{LaError, Matrix as LaMatrix};
use thiserror::Error;

use crate::geometry::util::{dot, hypot, squared_norm, sub};

/// Stack-matrix dispatch limit.
///
/// Hull faces in the lifted 3D Delaunay case span 4D, so no determinant the
/// engine evaluates is larger than 4×4.
pub const MAX_STACK_MATRIX_DIM: usize = 4;

/// Internal linear algebra matrix type used by this crate for fixed-size operations.
pub type Matrix<const D: usize> = LaMatrix<D>;

/// Error type for stack-matrix dispatch.
#[derive(Debug, Error)]
pub enum MatrixError {
    /// The requested matrix size is not supported by the stack-matrix dispatcher.
    #[error("unsupported stack matrix size: {k} (max {max})")]
    UnsupportedDim {
        /// Requested matrix dimension.
        k: usize,
        /// Maximum supported matrix dimension.
        max: usize,
    },
    /// A linear algebra error originating from `la-stack`.
    #[error(transparent)]
    La(#[from] LaError),
}

/// Dispatch a runtime `k` to a stack-allocated `la_stack::Matrix<k>`.
///
/// The block must evaluate to `Result<_, E>` with `E: From<MatrixError>`.
macro_rules! try_with_la_stack_matrix {
    ($k:expr, |$m:ident| $body:block) => {{
        match $k {
            1 => {
                let mut $m = $crate::geometry::matrix::Matrix::<1>::zero();
                $body
            }
            2 => {
                let mut $m = $crate::geometry::matrix::Matrix::<2>::zero();
                $body
            }
            3 => {
                let mut $m = $crate::geometry::matrix::Matrix::<3>::zero();
                $body
            }
            4 => {
                let mut $m = $crate::geometry::matrix::Matrix::<4>::zero();
                $body
            }
            k => Err($crate::geometry::matrix::MatrixError::UnsupportedDim {
                k,
                max: $crate::geometry::matrix::MAX_STACK_MATRIX_DIM,
            }
            .into()),
        }
    }};
}

#[inline]
fn matrix_set<const N: usize>(m: &mut Matrix<N>, r: usize, c: usize, value: f64) {
    let ok = m.set(r, c, value);
    debug_assert!(ok, "matrix index out of bounds: ({r}, {c}) for {N}x{N}");
}

/// Compute an LU-based determinant, returning 0.0 for singular matrices
/// and NaN when the input holds non-finite entries.
///
/// # Examples
///
/// ```rust
/// use hull_diagrams::geometry::matrix::{determinant, Matrix};
///
/// let m = Matrix::<2>::from_rows([[2.0, 0.0], [0.0, 3.0]]);
/// assert!((determinant(&m) - 6.0).abs() < 1e-12);
/// assert_eq!(determinant(&Matrix::<3>::zero()), 0.0);
/// ```
#[inline]
#[must_use]
pub fn determinant<const N: usize>(m: &Matrix<N>) -> f64 {
    match m.det(0.0) {
        Ok(det) => det,
        Err(LaError::Singular { .. }) => 0.0,
        Err(LaError::NonFinite { .. }) => f64::NAN,
    }
}

/// Determinant of the square matrix formed by `rows` with column `skip`
/// removed (or all columns when `skip` is `None`).
///
/// The number of rows must match the number of remaining columns.
///
/// # Errors
///
/// Returns [`MatrixError::UnsupportedDim`] when the square size is zero or
/// larger than [`MAX_STACK_MATRIX_DIM`].
pub fn minor_determinant<const D: usize>(
    rows: &[[f64; D]],
    skip: Option<usize>,
) -> Result<f64, MatrixError> {
    let k = rows.len();
    debug_assert_eq!(k + usize::from(skip.is_some()), D);
    try_with_la_stack_matrix!(k, |m| {
        for (r, row) in rows.iter().enumerate() {
            let mut c = 0;
            for (col, &value) in row.iter().enumerate() {
                if Some(col) == skip {
                    continue;
                }
                matrix_set(&mut m, r, c, value);
                c += 1;
            }
        }
        Ok(determinant(&m))
    })
}

/// Signed volume determinant `det[p_i - p_0]` of a simplex given by `D + 1`
/// points.
///
/// # Errors
///
/// Propagates [`MatrixError`] from the stack dispatcher.
///
/// # Examples
///
/// ```rust
/// use hull_diagrams::geometry::matrix::simplex_orientation;
///
/// let ccw = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
/// assert!(simplex_orientation(&ccw).unwrap() > 0.0);
/// ```
pub fn simplex_orientation<const D: usize>(points: &[[f64; D]]) -> Result<f64, MatrixError> {
    debug_assert_eq!(points.len(), D + 1);
    let base = points[0];
    let edges: Vec<[f64; D]> = points[1..].iter().map(|p| sub(p, &base)).collect();
    minor_determinant(&edges, None)
}

/// Unit normal of the hyperplane through `D` points, as the cofactor
/// expansion of the edge matrix `q_k - q_0`.
///
/// Returns `Ok(None)` when the points are affinely dependent or the
/// computation produced NaN.
///
/// # Errors
///
/// Propagates [`MatrixError`] from the stack dispatcher.
///
/// # Examples
///
/// ```rust
/// use hull_diagrams::geometry::matrix::hyperplane_normal;
///
/// let n = hyperplane_normal(&[[0.0, 0.0], [1.0, 0.0]]).unwrap().unwrap();
/// assert!((n[1].abs() - 1.0).abs() < 1e-12);
/// ```
pub fn hyperplane_normal<const D: usize>(
    points: &[[f64; D]],
) -> Result<Option<[f64; D]>, MatrixError> {
    debug_assert_eq!(points.len(), D);
    let base = points[0];
    let edges: Vec<[f64; D]> = points[1..].iter().map(|p| sub(p, &base)).collect();

    let mut normal = [0.0; D];
    for (j, slot) in normal.iter_mut().enumerate() {
        let cofactor = if D == 1 {
            1.0
        } else {
            minor_determinant(&edges, Some(j))?
        };
        *slot = if (D - 1 + j) % 2 == 0 {
            cofactor
        } else {
            -cofactor
        };
    }

    let length = hypot(&normal);
    if length == 0.0 || length.is_nan() {
        return Ok(None);
    }
    Ok(Some(normal.map(|x| x / length)))
}

/// Orthonormal basis of the affine span of a growing point set.
///
/// # Examples
///
/// ```rust
/// use hull_diagrams::geometry::matrix::AffineSpan;
///
/// let mut span = AffineSpan::new([0.0, 0.0, 0.0]);
/// assert!(span.push(&[1.0, 0.0, 0.0], 1e-14));
/// assert_eq!(span.residual_squared(&[3.0, 0.0, 0.0]), 0.0);
/// assert_eq!(span.residual_squared(&[0.0, 2.0, 0.0]), 4.0);
/// ```
#[derive(Clone, Debug)]
pub struct AffineSpan<const D: usize> {
    origin: [f64; D],
    basis: Vec<[f64; D]>,
}

impl<const D: usize> AffineSpan<D> {
    /// Starts a span at a single point.
    #[must_use]
    pub fn new(origin: [f64; D]) -> Self {
        Self {
            origin,
            basis: Vec::with_capacity(D),
        }
    }

    /// Number of independent directions spanned so far.
    #[must_use]
    pub fn rank(&self) -> usize {
        self.basis.len()
    }

    fn residual(&self, point: &[f64; D]) -> [f64; D] {
        let mut r = sub(point, &self.origin);
        for b in &self.basis {
            let proj = dot(&r, b);
            for (ri, bi) in r.iter_mut().zip(b) {
                *ri -= proj * bi;
            }
        }
        r
    }

    /// Squared distance from `point` to the span.
    #[must_use]
    pub fn residual_squared(&self, point: &[f64; D]) -> f64 {
        squared_norm(&self.residual(point))
    }

    /// Extends the span by `point` when its squared residual exceeds
    /// `min_residual_squared`. Returns whether the rank grew.
    pub fn push(&mut self, point: &[f64; D], min_residual_squared: f64) -> bool {
        let r = self.residual(point);
        let len_sq = squared_norm(&r);
        if len_sq <= min_residual_squared {
            return false;
        }
        let len = len_sq.sqrt();
        self.basis.push(r.map(|x| x / len));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn unsupported_minor_size_is_an_error() {
        let rows = [[0.0; 6]; 5];
        let res = minor_determinant(&rows, Some(0));
        assert!(matches!(res, Err(MatrixError::UnsupportedDim { k: 5, .. })));
    }

    macro_rules! gen_orientation_tests {
        ($d:literal) => {
            pastey::paste! {
                #[test]
                fn [<unit_simplex_orientation_is_positive_ $d d>]() {
                    let mut points = vec![[0.0; $d]];
                    for i in 0..$d {
                        let mut p = [0.0; $d];
                        p[i] = 1.0;
                        points.push(p);
                    }
                    assert_relative_eq!(simplex_orientation(&points).unwrap(), 1.0, epsilon = 1e-12);

                    points.swap(1, 2);
                    assert_relative_eq!(simplex_orientation(&points).unwrap(), -1.0, epsilon = 1e-12);
                }

                #[test]
                fn [<hyperplane_normal_is_unit_and_orthogonal_ $d d>]() {
                    let points: Vec<[f64; $d]> = (0..$d)
                        .map(|i| {
                            let mut p = [0.0; $d];
                            p[i] = 2.0;
                            p
                        })
                        .collect();
                    let n = hyperplane_normal(&points).unwrap().unwrap();
                    assert_relative_eq!(hypot(&n), 1.0, epsilon = 1e-12);
                    for p in &points[1..] {
                        assert_relative_eq!(dot(&n, &sub(p, &points[0])), 0.0, epsilon = 1e-12);
                    }
                }
            }
        };
    }

    gen_orientation_tests!(2);
    gen_orientation_tests!(3);
    gen_orientation_tests!(4);

    #[test]
    fn degenerate_hyperplane_has_no_normal() {
        let points = [[0.0, 0.0, 0.0], [1.0, 1.0, 1.0], [2.0, 2.0, 2.0]];
        assert!(hyperplane_normal(&points).unwrap().is_none());
    }

    #[test]
    fn affine_span_rejects_collinear_points() {
        let mut span = AffineSpan::new([0.0, 0.0]);
        assert!(span.push(&[1.0, 1.0], 1e-14));
        assert!(!span.push(&[5.0, 5.0], 1e-14));
        assert_eq!(span.rank(), 1);
        assert!(span.push(&[0.0, 1.0], 1e-14));
        assert_eq!(span.rank(), 2);
    }
}
