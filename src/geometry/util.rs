//! Geometric utility functions.
//!
//! Norms and distances, checked scalar conversions, closed-form
//! circumspheres, axis-aligned bounds and deterministic point generators.

pub mod bounds;
pub mod circumsphere;
pub mod conversions;
pub mod norms;
pub mod point_generation;

pub use bounds::*;
pub use circumsphere::*;
pub use conversions::*;
pub use norms::*;
pub use point_generation::{
    generate_circle_points, generate_grid_points, generate_random_points_seeded,
};

use thiserror::Error;

/// Errors that can occur while generating point sets.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RandomPointGenerationError {
    /// Invalid coordinate range (min >= max).
    #[error("Invalid coordinate range: minimum {min} must be less than maximum {max}")]
    InvalidRange {
        /// The minimum value of the range.
        min: String,
        /// The maximum value of the range.
        max: String,
    },
    /// Requested point count cannot produce any points.
    #[error("Invalid number of points: {n_points}")]
    InvalidPointCount {
        /// The requested number of points.
        n_points: usize,
    },
    /// Generation failed for the given parameters.
    #[error("Failed to generate points in range [{min}, {max}]: {details}")]
    RandomGenerationFailed {
        /// The minimum value of the range.
        min: String,
        /// The maximum value of the range.
        max: String,
        /// Detailed error message.
        details: String,
    },
}
