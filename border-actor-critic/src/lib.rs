//! Actor and critic networks for continuous control, implemented with
//! [tch](https://crates.io/crates/tch).
//!
//! The crate provides four networks and a container:
//!
//! * [`DeterministicActor`]: state to a bounded action.
//! * [`GaussianActor`]: state to the mean, standard deviation and log standard
//!   deviation of a diagonal Gaussian policy.
//! * [`DeterministicCritic`]: state and action to a scalar value.
//! * [`GaussianCritic`]: state to a scalar value.
//! * [`DisjointActorCritic`]: an actor and a critic without shared parameters.
//!
//! Every network owns its own [`VarStore`](tch::nn::VarStore) and implements
//! [`ModelBase`], which provides parameter snapshots, gradient reset and
//! persistence.
pub mod activation;
pub mod actor;
pub mod actor_critic;
pub mod critic;
pub mod error;
pub mod init;
pub mod model;
pub mod util;
use log::warn;
use serde::{Deserialize, Serialize};

pub use activation::Activation;
pub use actor::{
    DeterministicActor, DeterministicActorConfig, GaussianActor, GaussianActorConfig,
};
pub use actor_critic::{DdpgActorCritic, DisjointActorCritic, GaussianActorCritic};
pub use critic::{
    DeterministicCritic, DeterministicCriticConfig, GaussianCritic, GaussianCriticConfig,
};
pub use error::AcNetError;
pub use model::{Model1, Model2, ModelBase};
pub use util::NamedTensors;

#[derive(Clone, Debug, Copy, Deserialize, Serialize, PartialEq, Eq)]
/// Device on which a network is placed.
///
/// This enum is added because [`tch::Device`] does not support serialization.
pub enum Device {
    /// The main CPU device.
    Cpu,

    /// The GPU device with the given index.
    Cuda(usize),
}

impl Default for Device {
    fn default() -> Self {
        Self::Cpu
    }
}

impl From<Device> for tch::Device {
    /// Falls back to CPU when the requested GPU is not available.
    fn from(device: Device) -> Self {
        match device {
            Device::Cpu => tch::Device::Cpu,
            Device::Cuda(n) => {
                if tch::Cuda::is_available() && (n as i64) < tch::Cuda::device_count() {
                    tch::Device::Cuda(n)
                } else {
                    warn!("CUDA device {} is not available, use CPU instead", n);
                    tch::Device::Cpu
                }
            }
        }
    }
}
