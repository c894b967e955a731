//! Scalar traits for input coordinates.
//!
//! Every public entry point accepts `[T; D]` points for any
//! [`CoordinateScalar`] `T` and converts them to `f64` once, up front. The
//! hull engine itself only ever sees `f64`.
//!
//! # Usage Examples
//!
//! ```rust
//! use hull_diagrams::geometry::traits::coordinate::FiniteCheck;
//!
//! assert!(1.5f32.is_finite_generic());
//! assert!(!f64::NAN.is_finite_generic());
//! ```

use num_traits::Float;
use std::fmt::Debug;

/// Errors that can occur while converting input coordinates to `f64`.
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum CoordinateConversionError {
    /// Coordinate conversion failed
    #[error(
        "Failed to convert coordinate at index {coordinate_index} from {from_type} to {to_type}: {coordinate_value}"
    )]
    ConversionFailed {
        /// Index of the coordinate that failed to convert
        coordinate_index: usize,
        /// String representation of the problematic coordinate value
        coordinate_value: String,
        /// Source type name
        from_type: &'static str,
        /// Target type name
        to_type: &'static str,
    },
    /// Non-finite value (NaN or infinity) encountered during coordinate conversion
    #[error(
        "Non-finite value (NaN or infinity) at coordinate index {coordinate_index}: {coordinate_value}"
    )]
    NonFiniteValue {
        /// Index of the coordinate that contains the non-finite value
        coordinate_index: usize,
        /// String representation of the non-finite coordinate value
        coordinate_value: String,
    },
}

/// Helper trait for checking finiteness of coordinates.
///
/// # Examples
///
/// ```
/// use hull_diagrams::geometry::traits::coordinate::FiniteCheck;
///
/// assert!(3.25f64.is_finite_generic());
/// assert!(!f64::INFINITY.is_finite_generic());
/// assert!(!f32::NAN.is_finite_generic());
/// ```
pub trait FiniteCheck {
    /// Returns true if the value is finite (not NaN or infinite).
    fn is_finite_generic(&self) -> bool;
}

macro_rules! impl_finite_check {
    (float: $($t:ty),*) => {
        $(
            impl FiniteCheck for $t {
                #[inline(always)]
                fn is_finite_generic(&self) -> bool {
                    self.is_finite()
                }
            }
        )*
    };
}

impl_finite_check!(float: f32, f64);

/// Consolidated bound for the scalar type of input coordinates.
///
/// # Examples
///
/// ```
/// use hull_diagrams::geometry::traits::coordinate::CoordinateScalar;
///
/// fn midpoint<T: CoordinateScalar>(a: T, b: T) -> T {
///     (a + b) / (T::one() + T::one())
/// }
///
/// assert_eq!(midpoint(1.0f32, 2.0f32), 1.5);
/// ```
pub trait CoordinateScalar: Float + Default + Debug + FiniteCheck + Send + Sync + 'static {}

impl CoordinateScalar for f32 {}

impl CoordinateScalar for f64 {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_check_rejects_special_values() {
        assert!(0.0f64.is_finite_generic());
        assert!(f64::MAX.is_finite_generic());
        assert!(!f64::NEG_INFINITY.is_finite_generic());
        assert!(!f32::INFINITY.is_finite_generic());
    }

    #[test]
    fn conversion_error_messages_name_the_index() {
        let err = CoordinateConversionError::NonFiniteValue {
            coordinate_index: 2,
            coordinate_value: "NaN".to_string(),
        };
        assert!(err.to_string().contains("index 2"));
    }
}
