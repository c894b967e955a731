//! Axis-aligned bounding boxes.

/// Closed axis-aligned box `[min, max]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds<const D: usize> {
    /// Lower corner.
    pub min: [f64; D],
    /// Upper corner.
    pub max: [f64; D],
}

impl<const D: usize> Bounds<D> {
    /// Creates a box from its corners without validation.
    #[must_use]
    pub const fn new(min: [f64; D], max: [f64; D]) -> Self {
        Self { min, max }
    }

    /// Tight box around a point set, or `None` for an empty set.
    ///
    /// # Examples
    ///
    /// ```
    /// use hull_diagrams::geometry::util::Bounds;
    ///
    /// let b = Bounds::from_points(&[[0.0, 2.0], [1.0, -1.0]]).unwrap();
    /// assert_eq!(b.min, [0.0, -1.0]);
    /// assert_eq!(b.max, [1.0, 2.0]);
    /// assert!(Bounds::<2>::from_points(&[]).is_none());
    /// ```
    #[must_use]
    pub fn from_points(points: &[[f64; D]]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self::new(*first, *first);
        for p in rest {
            for (i, &x) in p.iter().enumerate() {
                bounds.min[i] = bounds.min[i].min(x);
                bounds.max[i] = bounds.max[i].max(x);
            }
        }
        Some(bounds)
    }

    /// Box grown by `amount` on every side.
    ///
    /// # Examples
    ///
    /// ```
    /// use hull_diagrams::geometry::util::Bounds;
    ///
    /// let b = Bounds::new([0.0, 0.0], [1.0, 1.0]).expanded_by(0.5);
    /// assert_eq!(b.min, [-0.5, -0.5]);
    /// assert_eq!(b.max, [1.5, 1.5]);
    /// ```
    #[must_use]
    pub fn expanded_by(&self, amount: f64) -> Self {
        Self {
            min: self.min.map(|x| x - amount),
            max: self.max.map(|x| x + amount),
        }
    }

    /// Corners are finite and ordered on every axis.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min
            .iter()
            .zip(&self.max)
            .all(|(lo, hi)| lo.is_finite() && hi.is_finite() && lo <= hi)
    }

    /// Whether `point` lies inside the closed box.
    #[must_use]
    pub fn contains(&self, point: &[f64; D]) -> bool {
        point
            .iter()
            .enumerate()
            .all(|(i, &x)| self.min[i] <= x && x <= self.max[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_inclusive() {
        let b = Bounds::new([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        assert!(b.contains(&[1.0, 0.0, 0.5]));
        assert!(!b.contains(&[1.0 + 1e-9, 0.0, 0.5]));
    }

    #[test]
    fn validity_checks_order_and_finiteness() {
        assert!(Bounds::new([0.0], [0.0]).is_valid());
        assert!(!Bounds::new([1.0], [0.0]).is_valid());
        assert!(!Bounds::new([f64::NAN], [0.0]).is_valid());
        assert!(!Bounds::new([0.0], [1.0]).expanded_by(-1.0).is_valid());
    }
}
