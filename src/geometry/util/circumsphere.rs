//! Closed-form circumspheres for triangles and tetrahedra.
//!
//! The Delaunay layer is generic over the input dimension but only ever needs
//! circumspheres of its own cells, so the formula is selected statically via
//! [`CircumsphereStrategy`], implemented on the [`Dimension`] marker for the
//! supported dimensions.

use crate::geometry::util::norms::{distance, squared_norm, sub};

/// A circumscribed circle (2D) or sphere (3D).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circumsphere<const D: usize> {
    /// Center point, equidistant from every vertex of the simplex.
    pub center: [f64; D],
    /// Distance from the center to any vertex.
    pub radius: f64,
}

impl<const D: usize> Circumsphere<D> {
    /// Whether `point` lies strictly inside the sphere, shrunk by `tolerance`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hull_diagrams::geometry::util::Circumsphere;
    ///
    /// let s = Circumsphere { center: [0.0, 0.0], radius: 1.0 };
    /// assert!(s.strictly_contains(&[0.5, 0.0], 1e-9));
    /// assert!(!s.strictly_contains(&[1.0, 0.0], 1e-9));
    /// ```
    #[must_use]
    pub fn strictly_contains(&self, point: &[f64; D], tolerance: f64) -> bool {
        distance(&self.center, point) < self.radius - tolerance
    }
}

/// Per-dimension circumsphere formula.
pub trait CircumsphereStrategy<const D: usize> {
    /// Circumsphere of the `D + 1` points, or `None` when they are
    /// degenerate (collinear in 2D, coplanar in 3D) or the result is not
    /// finite.
    fn circumsphere(points: &[[f64; D]]) -> Option<Circumsphere<D>>;
}

/// Marker type carrying a dimension for strategy dispatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Dimension<const D: usize>;

fn finite_sphere<const D: usize>(center: [f64; D], anchor: &[f64; D]) -> Option<Circumsphere<D>> {
    let radius = distance(&center, anchor);
    if center.iter().all(|c| c.is_finite()) && radius.is_finite() {
        Some(Circumsphere { center, radius })
    } else {
        None
    }
}

impl CircumsphereStrategy<2> for Dimension<2> {
    /// Triangle circumcircle solved relative to the first vertex.
    ///
    /// # Examples
    ///
    /// ```
    /// use hull_diagrams::geometry::util::{CircumsphereStrategy, Dimension};
    ///
    /// let c = Dimension::<2>::circumsphere(&[[0.0, 0.0], [2.0, 0.0], [0.0, 2.0]]).unwrap();
    /// assert_eq!(c.center, [1.0, 1.0]);
    /// ```
    fn circumsphere(points: &[[f64; 2]]) -> Option<Circumsphere<2>> {
        let [a, b, c] = [points.first()?, points.get(1)?, points.get(2)?];
        let ab = sub(b, a);
        let ac = sub(c, a);
        let k = ab[0].mul_add(ac[1], -(ab[1] * ac[0]));
        if k == 0.0 {
            return None;
        }
        let ab2 = squared_norm(&ab);
        let ac2 = squared_norm(&ac);
        let x = ac[1].mul_add(ab2, -(ab[1] * ac2)) / (2.0 * k);
        let y = ab[0].mul_add(ac2, -(ac[0] * ab2)) / (2.0 * k);
        finite_sphere([a[0] + x, a[1] + y], a)
    }
}

/// `(a.z - b.z)(c.x d.y - d.x c.y) - (e.z - f.z)(g.x h.y - h.x g.y)`
#[allow(clippy::many_single_char_names)]
fn mixed_term([a, b, c, d, e, f, g, h]: [&[f64; 3]; 8]) -> f64 {
    (a[2] - b[2]) * c[0].mul_add(d[1], -(d[0] * c[1]))
        - (e[2] - f[2]) * g[0].mul_add(h[1], -(h[0] * g[1]))
}

/// Twice the signed area of triangle `abc` projected on axes `(i, j)`.
fn projected_area(i: usize, j: usize, a: &[f64; 3], b: &[f64; 3], c: &[f64; 3]) -> f64 {
    a[i] * (b[j] - c[j]) + b[i] * (c[j] - a[j]) + c[i] * (a[j] - b[j])
}

impl CircumsphereStrategy<3> for Dimension<3> {
    /// Tetrahedron circumsphere from the closed-form 4-point solution.
    ///
    /// # Examples
    ///
    /// ```
    /// use hull_diagrams::geometry::util::{CircumsphereStrategy, Dimension};
    ///
    /// let pts = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
    /// let s = Dimension::<3>::circumsphere(&pts).unwrap();
    /// for c in s.center {
    ///     assert!((c - 0.5).abs() < 1e-12);
    /// }
    ///
    /// let flat = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 1.0, 0.0]];
    /// assert!(Dimension::<3>::circumsphere(&flat).is_none());
    /// ```
    fn circumsphere(points: &[[f64; 3]]) -> Option<Circumsphere<3>> {
        let [a, b, c, d] = [
            points.first()?,
            points.get(1)?,
            points.get(2)?,
            points.get(3)?,
        ];
        let u = mixed_term([a, b, c, d, b, c, d, a]);
        let v = mixed_term([c, d, a, b, d, a, b, c]);
        let w = mixed_term([a, c, d, b, b, d, a, c]);
        let uvw = 2.0 * (u + v + w);
        if uvw == 0.0 {
            return None;
        }

        let [ra, rb, rc, rd] = [a, b, c, d].map(squared_norm);
        let axis = |i: usize, j: usize| {
            (ra * projected_area(i, j, b, c, d) - rb * projected_area(i, j, c, d, a)
                + rc * projected_area(i, j, d, a, b)
                - rd * projected_area(i, j, a, b, c))
                / uvw
        };
        finite_sphere([axis(1, 2), axis(2, 0), axis(0, 1)], a)
    }
}
