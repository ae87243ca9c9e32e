//! Utilities.
mod named_tensors;
mod placement;
use crate::error::AcNetError;
use ndarray::ArrayD;
pub use named_tensors::NamedTensors;
pub use placement::Placement;
use std::convert::TryFrom;
use tch::Tensor;

/// Returns an error unless `v` is positive.
pub(crate) fn check_positive(name: &str, v: i64) -> Result<(), AcNetError> {
    if v > 0 {
        Ok(())
    } else {
        Err(AcNetError::InvalidConfig(format!(
            "{} must be positive, got {}",
            name, v
        )))
    }
}

/// Converts [`Tensor`] to [`ndarray::ArrayD`].
///
/// The tensor is detached from the graph and copied to CPU.
pub fn tensor_to_arrayd(t: &Tensor) -> Result<ArrayD<f32>, AcNetError> {
    let t = t.detach().to(tch::Device::Cpu).to_kind(tch::Kind::Float);
    let shape = t.size().iter().map(|x| *x as usize).collect::<Vec<_>>();
    let v = Vec::<f32>::try_from(&t.flatten(0, -1))?;

    ArrayD::from_shape_vec(ndarray::IxDyn(&shape), v).map_err(|_| AcNetError::ShapeMismatch {
        what: "array conversion".to_string(),
        expected: t.size(),
        actual: vec![t.numel() as i64],
    })
}
