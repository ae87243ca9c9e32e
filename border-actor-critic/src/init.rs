//! Weight initialization.
//!
//! Biases are always initialized to zero. Weights follow the role of the layer:
//!
//! * Output layers use [`WeightInit::SmallUniform`], keeping initial outputs
//!   near zero so a squashing gate does not start saturated.
//! * Hidden layers of deterministic networks use [`WeightInit::XavierUniform`].
//! * Hidden layers of Gaussian networks use [`WeightInit::Orthogonal`].
use tch::nn::{self, Init, LinearConfig};

/// Bound of the uniform distribution for output layer weights.
pub const FINAL_LAYER_BOUND: f64 = 3e-3;

/// Weight initialization schemes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeightInit {
    /// Glorot uniform with gain 1.
    XavierUniform,

    /// Orthogonal matrix with gain 1.
    Orthogonal,

    /// Uniform in `[-FINAL_LAYER_BOUND, FINAL_LAYER_BOUND]`.
    SmallUniform,
}

impl WeightInit {
    /// Returns the initializer of a weight matrix of shape `[out_dim, in_dim]`.
    pub fn init(&self, in_dim: i64, out_dim: i64) -> Init {
        match self {
            Self::XavierUniform => xavier_uniform(in_dim, out_dim),
            Self::Orthogonal => Init::Orthogonal { gain: 1.0 },
            Self::SmallUniform => Init::Uniform {
                lo: -FINAL_LAYER_BOUND,
                up: FINAL_LAYER_BOUND,
            },
        }
    }
}

/// Xavier initialization.
pub fn xavier_uniform(fan_in: i64, fan_out: i64) -> Init {
    let bound = (6.0 / (fan_in + fan_out) as f64).sqrt();
    Init::Uniform {
        lo: -bound,
        up: bound,
    }
}

/// Creates a linear layer with the given weight initialization and zero bias.
///
/// The variables are registered as `weight` and `bias` under `p`.
pub fn linear<'a, T: std::borrow::Borrow<nn::Path<'a>>>(
    p: T,
    in_dim: i64,
    out_dim: i64,
    ws_init: WeightInit,
) -> nn::Linear {
    nn::linear(
        p,
        in_dim,
        out_dim,
        LinearConfig {
            ws_init: ws_init.init(in_dim, out_dim),
            bs_init: Some(Init::Const(0.0)),
            bias: true,
        },
    )
}
