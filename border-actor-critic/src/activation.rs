//! Activation functions.
use serde::{Deserialize, Serialize};
use tch::Tensor;

/// Element-wise non-linearity, fixed when a network is built.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum Activation {
    /// Hyperbolic tangent.
    Tanh,

    /// Rectified linear unit.
    Relu,

    /// Logistic sigmoid.
    Sigmoid,

    /// No-op.
    Identity,
}

impl Default for Activation {
    fn default() -> Self {
        Self::Tanh
    }
}

impl Activation {
    /// Applies the activation.
    pub fn apply(&self, xs: &Tensor) -> Tensor {
        match self {
            Self::Tanh => xs.tanh(),
            Self::Relu => xs.relu(),
            Self::Sigmoid => xs.sigmoid(),
            Self::Identity => xs.shallow_clone(),
        }
    }

    /// Returns `true` if every output lies in `[-1, 1]`.
    pub fn is_bounded(&self) -> bool {
        matches!(self, Self::Tanh | Self::Sigmoid)
    }
}
