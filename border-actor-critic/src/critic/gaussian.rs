//! State-value function for Gaussian policies.
use crate::{
    error::AcNetError,
    init::{linear, WeightInit},
    model::{Model1, ModelBase},
    util::{check_positive, Placement},
    Activation, Device,
};
use anyhow::Result;
use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};
use tch::{nn, Tensor};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`GaussianCritic`].
pub struct GaussianCriticConfig {
    pub state_dim: i64,
    pub hidden_size: i64,
    pub activation: Activation,
    pub device: Device,
}

impl GaussianCriticConfig {
    pub fn new(state_dim: i64) -> Self {
        Self {
            state_dim,
            hidden_size: 64,
            activation: Activation::Tanh,
            device: Device::Cpu,
        }
    }

    /// Sets the width of the hidden layers.
    pub fn hidden_size(mut self, v: i64) -> Self {
        self.hidden_size = v;
        self
    }

    /// Sets the activation function of hidden layers.
    pub fn activation(mut self, v: Activation) -> Self {
        self.activation = v;
        self
    }

    /// Sets the device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }

    pub fn validate(&self) -> Result<(), AcNetError> {
        check_positive("state_dim", self.state_dim)?;
        check_positive("hidden_size", self.hidden_size)
    }

    /// Constructs [`GaussianCriticConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`GaussianCriticConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// State-value function `V(s)`, `state_dim → hidden → hidden → 1`.
pub struct GaussianCritic {
    config: GaussianCriticConfig,
    placement: Placement,
    var_store: nn::VarStore,
    fc1: nn::Linear,
    fc2: nn::Linear,
    fc_value: nn::Linear,
}

impl GaussianCritic {
    /// Constructs [`GaussianCritic`].
    pub fn build(config: GaussianCriticConfig) -> Result<Self, AcNetError> {
        config.validate()?;
        let var_store = nn::VarStore::new(config.device.into());
        let critic = Self::_build(config, var_store);
        debug!(
            "Build Gaussian critic: {} -> {} -> 1",
            critic.config.state_dim, critic.config.hidden_size
        );
        Ok(critic)
    }

    fn _build(config: GaussianCriticConfig, var_store: nn::VarStore) -> Self {
        let p = &var_store.root();
        let h = config.hidden_size;
        let fc1 = linear(p / "fc1", config.state_dim, h, WeightInit::Orthogonal);
        let fc2 = linear(p / "fc2", h, h, WeightInit::Orthogonal);
        let fc_value = linear(p / "fc_value", h, 1, WeightInit::SmallUniform);

        Self {
            placement: Placement::new(var_store.device()),
            config,
            var_store,
            fc1,
            fc2,
            fc_value,
        }
    }

    pub fn config(&self) -> &GaussianCriticConfig {
        &self.config
    }
}

impl Model1 for GaussianCritic {
    type Input = Tensor;
    type Output = Tensor;

    /// Returns values of shape `[batch, 1]`.
    fn forward(&self, xs: &Tensor) -> Result<Tensor, AcNetError> {
        let xs = self.placement.variable(xs, self.config.state_dim, "state")?;
        let act = self.config.activation;
        let phi = act.apply(&xs.apply(&self.fc1));
        let phi = act.apply(&phi.apply(&self.fc2));
        Ok(phi.apply(&self.fc_value))
    }

    fn in_dim(&self) -> i64 {
        self.config.state_dim
    }

    fn out_dim(&self) -> i64 {
        1
    }
}

impl Clone for GaussianCritic {
    fn clone(&self) -> Self {
        let var_store = nn::VarStore::new(self.var_store.device());
        let mut cloned = Self::_build(self.config.clone(), var_store);
        cloned.var_store.copy(&self.var_store).unwrap();
        cloned
    }
}

impl ModelBase for GaussianCritic {
    fn get_var_store(&self) -> &nn::VarStore {
        &self.var_store
    }

    fn get_var_store_mut(&mut self) -> &mut nn::VarStore {
        &mut self.var_store
    }
}
