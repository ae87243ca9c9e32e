//! Action-value function for deterministic policies.
use crate::{
    error::AcNetError,
    init::{linear, WeightInit},
    model::{Model2, ModelBase},
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
/// Configuration of [`DeterministicCritic`].
pub struct DeterministicCriticConfig {
    pub state_dim: i64,
    pub action_dim: i64,

    /// Widths of the two hidden layers. The action joins at the second one.
    pub units: [i64; 2],

    pub activation: Activation,
    pub device: Device,
}

impl DeterministicCriticConfig {
    pub fn new(state_dim: i64, action_dim: i64) -> Self {
        Self {
            state_dim,
            action_dim,
            units: [400, 300],
            activation: Activation::Tanh,
            device: Device::Cpu,
        }
    }

    /// Sets the widths of the hidden layers.
    pub fn units(mut self, v: [i64; 2]) -> Self {
        self.units = v;
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
        check_positive("action_dim", self.action_dim)?;
        check_positive("units[0]", self.units[0])?;
        check_positive("units[1]", self.units[1])
    }

    /// Constructs [`DeterministicCriticConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DeterministicCriticConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Action-value function `Q(s, a)`.
///
/// The state goes through `l1`, the result is concatenated with the raw
/// action and goes through `l2`, then a linear output layer `l3` gives the
/// value.
pub struct DeterministicCritic {
    config: DeterministicCriticConfig,
    placement: Placement,
    var_store: nn::VarStore,
    l1: nn::Linear,
    l2: nn::Linear,
    l3: nn::Linear,
}

impl DeterministicCritic {
    /// Constructs [`DeterministicCritic`].
    pub fn build(config: DeterministicCriticConfig) -> Result<Self, AcNetError> {
        config.validate()?;
        let var_store = nn::VarStore::new(config.device.into());
        let critic = Self::_build(config, var_store);
        debug!(
            "Build deterministic critic: ({}, {}) -> {:?} -> 1",
            critic.config.state_dim, critic.config.action_dim, critic.config.units
        );
        Ok(critic)
    }

    fn _build(config: DeterministicCriticConfig, var_store: nn::VarStore) -> Self {
        let p = &var_store.root();
        let [u1, u2] = config.units;
        let l1 = linear(p / "l1", config.state_dim, u1, WeightInit::XavierUniform);
        let l2 = linear(p / "l2", u1 + config.action_dim, u2, WeightInit::XavierUniform);
        let l3 = linear(p / "l3", u2, 1, WeightInit::SmallUniform);

        Self {
            placement: Placement::new(var_store.device()),
            config,
            var_store,
            l1,
            l2,
            l3,
        }
    }

    pub fn config(&self) -> &DeterministicCriticConfig {
        &self.config
    }
}

impl Model2 for DeterministicCritic {
    type Input1 = Tensor;
    type Input2 = Tensor;
    type Output = Tensor;

    /// Returns values of shape `[batch, 1]`.
    fn forward(&self, xs: &Tensor, acts: &Tensor) -> Result<Tensor, AcNetError> {
        let xs = self.placement.variable(xs, self.config.state_dim, "state")?;
        let acts = self.placement.variable(acts, self.config.action_dim, "action")?;
        let batch_size = xs.size()[0];
        if acts.size()[0] != batch_size {
            return Err(AcNetError::ShapeMismatch {
                what: "action".to_string(),
                expected: vec![batch_size, self.config.action_dim],
                actual: acts.size(),
            });
        }

        let act = self.config.activation;
        let h = act.apply(&xs.apply(&self.l1));
        let h = act.apply(&Tensor::cat(&[h, acts], 1).apply(&self.l2));
        Ok(h.apply(&self.l3))
    }
}

impl Clone for DeterministicCritic {
    fn clone(&self) -> Self {
        let var_store = nn::VarStore::new(self.var_store.device());
        let mut cloned = Self::_build(self.config.clone(), var_store);
        cloned.var_store.copy(&self.var_store).unwrap();
        cloned
    }
}

impl ModelBase for DeterministicCritic {
    fn get_var_store(&self) -> &nn::VarStore {
        &self.var_store
    }

    fn get_var_store_mut(&mut self) -> &mut nn::VarStore {
        &mut self.var_store
    }
}
