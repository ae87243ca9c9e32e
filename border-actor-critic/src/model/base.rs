use crate::{error::AcNetError, util::NamedTensors};
use anyhow::{Context, Result};
use log::{info, trace};
use std::path::Path;
use tch::{nn, Device, Tensor};

/// Base interface.
///
/// Implementors own their [`VarStore`](nn::VarStore); the default methods
/// work on its variables.
pub trait ModelBase {
    /// Returns `var_store`.
    fn get_var_store(&self) -> &nn::VarStore;

    /// Returns `var_store` as mutable reference.
    fn get_var_store_mut(&mut self) -> &mut nn::VarStore;

    /// Device on which the parameters live.
    fn device(&self) -> Device {
        self.get_var_store().device()
    }

    /// Trainable parameters in the order they were created.
    fn parameters(&self) -> Vec<Tensor> {
        self.get_var_store().trainable_variables()
    }

    /// Clears gradients accumulated on the parameters.
    fn zero_grad(&mut self) {
        for mut p in self.parameters() {
            p.zero_grad();
        }
    }

    /// Takes a snapshot of the parameters.
    fn state_dict(&self) -> NamedTensors {
        NamedTensors::copy_from(self.get_var_store())
    }

    /// Restores parameters from a snapshot taken from the same architecture.
    fn load_state_dict(&mut self, state: &NamedTensors) -> Result<(), AcNetError> {
        state.copy_to(self.get_var_store_mut())
    }

    /// Save parameters of the neural network.
    fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let path = path.as_ref();
        self.state_dict()
            .save(path)
            .with_context(|| format!("Failed to save parameters to {:?}", path))?;
        info!("Save parameters to {:?}", path);
        for name in self.get_var_store().variables().keys() {
            trace!("Save variable {}", name);
        }
        Ok(())
    }

    /// Load parameters of the neural network.
    fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        let path = path.as_ref();
        let state = NamedTensors::load(path)
            .with_context(|| format!("Failed to read parameters from {:?}", path))?;
        self.load_state_dict(&state)
            .with_context(|| format!("Incompatible parameters in {:?}", path))?;
        info!("Load parameters from {:?}", path);
        Ok(())
    }
}

/// Neural networks with a single input and a single output.
pub trait Model1: ModelBase {
    /// The input of the neural network.
    type Input;
    /// The output of the neural network.
    type Output;

    /// Performs forward computation given an input.
    fn forward(&self, xs: &Self::Input) -> Result<Self::Output, AcNetError>;

    /// Same as [`Model1::forward`].
    fn predict(&self, xs: &Self::Input) -> Result<Self::Output, AcNetError> {
        self.forward(xs)
    }

    /// Size of the input vector.
    fn in_dim(&self) -> i64;

    /// Size of the output vector.
    fn out_dim(&self) -> i64;
}

/// Neural networks with double inputs and a single output.
pub trait Model2: ModelBase {
    /// An input of the neural network.
    type Input1;
    /// The other input of the neural network.
    type Input2;
    /// The output of the neural network.
    type Output;

    /// Performs forward computation given a pair of inputs.
    fn forward(&self, x1s: &Self::Input1, x2s: &Self::Input2) -> Result<Self::Output, AcNetError>;

    /// Same as [`Model2::forward`].
    fn predict(&self, x1s: &Self::Input1, x2s: &Self::Input2) -> Result<Self::Output, AcNetError> {
        self.forward(x1s, x2s)
    }
}
