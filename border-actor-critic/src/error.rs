//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum AcNetError {
    /// A dimension, a layer width or the action scale is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The shape of an input or of a restored parameter differs from the architecture.
    ///
    /// `-1` in `expected` matches any size (used for the batch axis).
    #[error("Shape mismatch in {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: String,
        expected: Vec<i64>,
        actual: Vec<i64>,
    },

    /// A parameter snapshot lacks a variable of the network.
    #[error("Missing variable in parameter snapshot: {0}")]
    MissingVariable(String),

    /// A parameter snapshot has a variable the network does not have.
    #[error("Unexpected variable in parameter snapshot: {0}")]
    UnexpectedVariable(String),

    /// Error from libtorch.
    #[error(transparent)]
    Tch(#[from] tch::TchError),
}
