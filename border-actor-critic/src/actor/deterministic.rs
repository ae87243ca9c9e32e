//! Deterministic policy with a bounded output.
use crate::{
    error::AcNetError,
    init::{linear, WeightInit},
    model::{Model1, ModelBase},
    util::{check_positive, tensor_to_arrayd, Placement},
    Activation, Device,
};
use anyhow::Result;
use log::debug;
use ndarray::ArrayD;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};
use tch::{nn, Tensor};

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`DeterministicActor`].
pub struct DeterministicActorConfig {
    pub state_dim: i64,
    pub action_dim: i64,

    /// Widths of the two hidden layers.
    pub units: [i64; 2],

    /// Outputs are bounded by `±action_scale`.
    pub action_scale: f64,

    /// Non-linearity after each hidden layer.
    pub activation: Activation,

    /// Squashing function applied before scaling. Must be bounded.
    pub action_gate: Activation,

    pub device: Device,
}

impl DeterministicActorConfig {
    pub fn new(state_dim: i64, action_dim: i64) -> Self {
        Self {
            state_dim,
            action_dim,
            units: [300, 200],
            action_scale: 1.0,
            activation: Activation::Tanh,
            action_gate: Activation::Tanh,
            device: Device::Cpu,
        }
    }

    /// Sets the widths of the hidden layers.
    pub fn units(mut self, v: [i64; 2]) -> Self {
        self.units = v;
        self
    }

    /// Sets the scale of actions.
    pub fn action_scale(mut self, v: f64) -> Self {
        self.action_scale = v;
        self
    }

    /// Sets the activation function of hidden layers.
    pub fn activation(mut self, v: Activation) -> Self {
        self.activation = v;
        self
    }

    /// Sets the squashing function of the output.
    pub fn action_gate(mut self, v: Activation) -> Self {
        self.action_gate = v;
        self
    }

    /// Sets the device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }

    /// Checks dimensions, the action scale and the gate.
    pub fn validate(&self) -> Result<(), AcNetError> {
        check_positive("state_dim", self.state_dim)?;
        check_positive("action_dim", self.action_dim)?;
        check_positive("units[0]", self.units[0])?;
        check_positive("units[1]", self.units[1])?;
        if !(self.action_scale.is_finite() && self.action_scale > 0.0) {
            return Err(AcNetError::InvalidConfig(format!(
                "action_scale must be positive and finite, got {}",
                self.action_scale
            )));
        }
        if !self.action_gate.is_bounded() {
            return Err(AcNetError::InvalidConfig(format!(
                "action_gate must be bounded, got {:?}",
                self.action_gate
            )));
        }
        Ok(())
    }

    /// Constructs [`DeterministicActorConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`DeterministicActorConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Deterministic policy, `state_dim → 300 → 200 → action_dim` by default.
///
/// The output is `action_scale * action_gate(l3(h))`. The last layer is
/// initialized with small uniform weights, the others with Xavier uniform
/// weights. All biases start at zero.
pub struct DeterministicActor {
    config: DeterministicActorConfig,
    placement: Placement,
    var_store: nn::VarStore,
    l1: nn::Linear,
    l2: nn::Linear,
    l3: nn::Linear,
}

impl DeterministicActor {
    /// Constructs [`DeterministicActor`].
    pub fn build(config: DeterministicActorConfig) -> Result<Self, AcNetError> {
        config.validate()?;
        let var_store = nn::VarStore::new(config.device.into());
        let actor = Self::_build(config, var_store);
        debug!(
            "Build deterministic actor: {} -> {:?} -> {}",
            actor.config.state_dim, actor.config.units, actor.config.action_dim
        );
        Ok(actor)
    }

    fn _build(config: DeterministicActorConfig, var_store: nn::VarStore) -> Self {
        let p = &var_store.root();
        let [u1, u2] = config.units;
        let l1 = linear(p / "l1", config.state_dim, u1, WeightInit::XavierUniform);
        let l2 = linear(p / "l2", u1, u2, WeightInit::XavierUniform);
        let l3 = linear(p / "l3", u2, config.action_dim, WeightInit::SmallUniform);

        Self {
            placement: Placement::new(var_store.device()),
            config,
            var_store,
            l1,
            l2,
            l3,
        }
    }

    pub fn config(&self) -> &DeterministicActorConfig {
        &self.config
    }

    pub fn action_scale(&self) -> f64 {
        self.config.action_scale
    }

    /// Returns actions as an array detached from the graph.
    pub fn predict_array(&self, xs: &Tensor) -> Result<ArrayD<f32>, AcNetError> {
        let ys = self.forward(xs)?;
        tensor_to_arrayd(&ys)
    }
}

impl Model1 for DeterministicActor {
    type Input = Tensor;
    type Output = Tensor;

    /// Returns actions of shape `[batch, action_dim]`.
    fn forward(&self, xs: &Tensor) -> Result<Tensor, AcNetError> {
        let xs = self.placement.variable(xs, self.config.state_dim, "state")?;
        let act = self.config.activation;
        let h = act.apply(&xs.apply(&self.l1));
        let h = act.apply(&h.apply(&self.l2));
        Ok(self.config.action_gate.apply(&h.apply(&self.l3)) * self.config.action_scale)
    }

    fn in_dim(&self) -> i64 {
        self.config.state_dim
    }

    fn out_dim(&self) -> i64 {
        self.config.action_dim
    }
}

impl Clone for DeterministicActor {
    fn clone(&self) -> Self {
        let var_store = nn::VarStore::new(self.var_store.device());
        let mut cloned = Self::_build(self.config.clone(), var_store);
        cloned.var_store.copy(&self.var_store).unwrap();
        cloned
    }
}

impl ModelBase for DeterministicActor {
    fn get_var_store(&self) -> &nn::VarStore {
        &self.var_store
    }

    fn get_var_store_mut(&mut self) -> &mut nn::VarStore {
        &mut self.var_store
    }
}
