//! Error taxonomy for the anti-collision kernel.
//!
//! Every fallible public operation returns [`KernelError`]; the kernel never panics on
//! caller-supplied data. `debug_assert!` is reserved for invariants the crate itself is
//! responsible for upholding.

use thiserror::Error;

/// Errors surfaced by the anti-collision kernel.
#[derive(Debug, Error)]
pub enum KernelError {
    /// The x and y coordinate arrays passed to [`crate::polygon::Polygon::new`] had different
    /// lengths.
    #[error("polygon x/y coordinate arrays differ in length: {x_len} vs {y_len}")]
    ShapeMismatch {
        /// Length of the x array.
        x_len: usize,
        /// Length of the y array.
        y_len: usize,
    },

    /// A scalar argument was outside its valid domain (non-positive diameter, too-few circle
    /// points, non-positive timestep, and similar caller errors).
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Allocating the backing storage for a polygon or sweep failed.
    #[error("allocation failed while building a polygon of {requested} points")]
    OutOfMemory {
        /// Number of points that were being allocated.
        requested: usize,
    },

    /// A positioner's geometric neighbor set exceeded the hex-grid bound of six, which can only
    /// happen from bad calibration data.
    #[error("positioner {posid} has {count} geometric neighbors, exceeding the hex bound of 6")]
    CalibrationInvalid {
        /// The offending positioner id.
        posid: String,
        /// The number of neighbors found.
        count: usize,
    },

    /// A calibration value, pose, or transform input/output was not finite.
    #[error("non-finite coordinate encountered (calibration or pose is degenerate)")]
    NumericDegenerate,

    /// Move table row arrays were not all the same length.
    #[error("move table field `{field}` has length {actual}, expected {expected}")]
    MoveTableMismatch {
        /// Name of the mismatched field, for diagnostics.
        field: &'static str,
        /// Expected length (the row count).
        expected: usize,
        /// Actual length found.
        actual: usize,
    },

    /// No positioner is registered under the given id.
    #[error("no positioner registered with id {0:?}")]
    UnknownPositioner(String),
}
