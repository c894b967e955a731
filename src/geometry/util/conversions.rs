//! Checked conversions from caller scalars to the `f64` working precision.

use num_traits::cast;

use crate::geometry::traits::coordinate::{CoordinateConversionError, CoordinateScalar};

/// Largest integer that `f64` represents exactly (2^53).
const MAX_EXACT_F64_INT: usize = 1 << 53;

/// Convert one coordinate to `f64`, rejecting NaN and infinity.
///
/// # Errors
///
/// Returns `CoordinateConversionError::NonFiniteValue` if the value is NaN or infinite,
/// or `CoordinateConversionError::ConversionFailed` if the cast itself fails.
fn safe_cast_to_f64<T: CoordinateScalar>(
    value: T,
    coordinate_index: usize,
) -> Result<f64, CoordinateConversionError> {
    if !value.is_finite_generic() {
        return Err(CoordinateConversionError::NonFiniteValue {
            coordinate_index,
            coordinate_value: format!("{value:?}"),
        });
    }

    cast(value).ok_or_else(|| CoordinateConversionError::ConversionFailed {
        coordinate_index,
        coordinate_value: format!("{value:?}"),
        from_type: std::any::type_name::<T>(),
        to_type: "f64",
    })
}

/// Safely convert an array of coordinates from type T to f64.
///
/// # Errors
///
/// Returns the first `CoordinateConversionError` encountered, with the
/// offending coordinate index.
///
/// # Examples
///
/// ```
/// use hull_diagrams::geometry::util::safe_coords_to_f64;
///
/// let coords = safe_coords_to_f64([1.5f32, 2.5f32, 3.5f32]).unwrap();
/// assert_eq!(coords, [1.5, 2.5, 3.5]);
///
/// assert!(safe_coords_to_f64([f64::NAN, 0.0]).is_err());
/// ```
pub fn safe_coords_to_f64<T: CoordinateScalar, const D: usize>(
    coords: [T; D],
) -> Result<[f64; D], CoordinateConversionError> {
    let mut result = [0.0_f64; D];
    for (i, &coord) in coords.iter().enumerate() {
        result[i] = safe_cast_to_f64(coord, i)?;
    }
    Ok(result)
}

/// Convert a whole point list, stopping at the first invalid point.
///
/// # Errors
///
/// Returns the conversion error of the first point holding a NaN, an
/// infinity, or a value that cannot be represented as `f64`.
pub fn safe_points_to_f64<T: CoordinateScalar, const D: usize>(
    points: &[[T; D]],
) -> Result<Vec<[f64; D]>, CoordinateConversionError> {
    points
        .iter()
        .enumerate()
        .map(|(point_index, &coords)| {
            safe_coords_to_f64(coords).inspect_err(|err| {
                tracing::warn!(point_index, %err, "rejecting input point");
            })
        })
        .collect()
}

/// Convert a count to `f64` for averaging.
///
/// # Errors
///
/// Returns `CoordinateConversionError::ConversionFailed` when the count
/// exceeds 2^53 and would lose precision.
///
/// # Examples
///
/// ```
/// use hull_diagrams::geometry::util::safe_usize_to_f64;
///
/// assert_eq!(safe_usize_to_f64(12).unwrap(), 12.0);
/// ```
pub fn safe_usize_to_f64(value: usize) -> Result<f64, CoordinateConversionError> {
    if value > MAX_EXACT_F64_INT {
        return Err(CoordinateConversionError::ConversionFailed {
            coordinate_index: 0,
            coordinate_value: value.to_string(),
            from_type: "usize",
            to_type: "f64",
        });
    }
    cast(value).ok_or_else(|| CoordinateConversionError::ConversionFailed {
        coordinate_index: 0,
        coordinate_value: value.to_string(),
        from_type: "usize",
        to_type: "f64",
    })
}

/// Unchecked count conversion for in-memory collection sizes, which stay
/// far below 2^53.
#[allow(clippy::cast_precision_loss)]
#[inline]
#[must_use]
pub(crate) const fn count_to_f64(count: usize) -> f64 {
    count as f64
}
