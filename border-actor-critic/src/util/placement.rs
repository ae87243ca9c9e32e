use crate::error::AcNetError;
use tch::{Device, Kind, Tensor};

/// Places inputs on the device of a network.
///
/// Networks hold one of these instead of moving tensors by hand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    device: Device,
}

impl Placement {
    pub fn new(device: Device) -> Self {
        Self { device }
    }

    pub fn device(&self) -> Device {
        self.device
    }

    /// Moves `xs` to the device as a batch of `f32` vectors of size `dim`.
    ///
    /// A rank-1 input is treated as a batch of size one. Any other rank, or a
    /// trailing axis whose size is not `dim`, is a shape error.
    pub fn variable(&self, xs: &Tensor, dim: i64, what: &str) -> Result<Tensor, AcNetError> {
        let xs = match xs.dim() {
            1 => xs.unsqueeze(0),
            2 => xs.shallow_clone(),
            _ => {
                return Err(AcNetError::ShapeMismatch {
                    what: what.to_string(),
                    expected: vec![-1, dim],
                    actual: xs.size(),
                })
            }
        };

        if xs.size()[1] != dim {
            return Err(AcNetError::ShapeMismatch {
                what: what.to_string(),
                expected: vec![-1, dim],
                actual: xs.size(),
            });
        }

        Ok(xs.to_device(self.device).to_kind(Kind::Float))
    }
}
