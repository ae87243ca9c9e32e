//! Gaussian policy with a state-independent standard deviation.
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

pub type ActMean = Tensor;
pub type ActStd = Tensor;
pub type ActLogStd = Tensor;

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
/// Configuration of [`GaussianActor`].
pub struct GaussianActorConfig {
    pub state_dim: i64,
    pub action_dim: i64,
    pub hidden_size: i64,
    pub activation: Activation,
    pub device: Device,
}

impl GaussianActorConfig {
    pub fn new(state_dim: i64, action_dim: i64) -> Self {
        Self {
            state_dim,
            action_dim,
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
        check_positive("action_dim", self.action_dim)?;
        check_positive("hidden_size", self.hidden_size)
    }

    /// Constructs [`GaussianActorConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`GaussianActorConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}

/// Diagonal Gaussian policy.
///
/// The mean is `tanh(fc_action(h))`, so it lies in `[-1, 1]`. The log standard
/// deviation is a free parameter of shape `[1, action_dim]`, initialized to
/// zero and expanded to the batch. Hidden layers are initialized with
/// orthogonal weights, the mean head with small uniform weights.
pub struct GaussianActor {
    config: GaussianActorConfig,
    placement: Placement,
    var_store: nn::VarStore,
    fc1: nn::Linear,
    fc2: nn::Linear,
    fc_action: nn::Linear,
    action_log_std: Tensor,
}

impl GaussianActor {
    /// Constructs [`GaussianActor`].
    pub fn build(config: GaussianActorConfig) -> Result<Self, AcNetError> {
        config.validate()?;
        let var_store = nn::VarStore::new(config.device.into());
        let actor = Self::_build(config, var_store);
        debug!(
            "Build Gaussian actor: {} -> {} -> {}",
            actor.config.state_dim, actor.config.hidden_size, actor.config.action_dim
        );
        Ok(actor)
    }

    fn _build(config: GaussianActorConfig, var_store: nn::VarStore) -> Self {
        let p = &var_store.root();
        let h = config.hidden_size;
        let fc1 = linear(p / "fc1", config.state_dim, h, WeightInit::Orthogonal);
        let fc2 = linear(p / "fc2", h, h, WeightInit::Orthogonal);
        let fc_action = linear(p / "fc_action", h, config.action_dim, WeightInit::SmallUniform);
        let action_log_std = p.zeros("action_log_std", &[1, config.action_dim]);

        Self {
            placement: Placement::new(var_store.device()),
            config,
            var_store,
            fc1,
            fc2,
            fc_action,
            action_log_std,
        }
    }

    pub fn config(&self) -> &GaussianActorConfig {
        &self.config
    }
}

impl Model1 for GaussianActor {
    type Input = Tensor;
    type Output = (ActMean, ActStd, ActLogStd);

    /// Returns mean, standard deviation and log standard deviation, each of
    /// shape `[batch, action_dim]`.
    fn forward(&self, xs: &Tensor) -> Result<Self::Output, AcNetError> {
        let xs = self.placement.variable(xs, self.config.state_dim, "state")?;
        let act = self.config.activation;
        let phi = act.apply(&xs.apply(&self.fc1));
        let phi = act.apply(&phi.apply(&self.fc2));
        let mean = phi.apply(&self.fc_action).tanh();
        let log_std = self.action_log_std.expand_as(&mean);
        let std = log_std.exp();
        Ok((mean, std, log_std))
    }

    fn in_dim(&self) -> i64 {
        self.config.state_dim
    }

    fn out_dim(&self) -> i64 {
        self.config.action_dim
    }
}

impl Clone for GaussianActor {
    fn clone(&self) -> Self {
        let var_store = nn::VarStore::new(self.var_store.device());
        let mut cloned = Self::_build(self.config.clone(), var_store);
        cloned.var_store.copy(&self.var_store).unwrap();
        cloned
    }
}

impl ModelBase for GaussianActor {
    fn get_var_store(&self) -> &nn::VarStore {
        &self.var_store
    }

    fn get_var_store_mut(&mut self) -> &mut nn::VarStore {
        &mut self.var_store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init::FINAL_LAYER_BOUND;
    use std::convert::TryFrom;
    use tch::{kind::FLOAT_CPU, Device, Kind};

    fn set_log_std(actor: &GaussianActor, v: &[f32]) {
        let src = Tensor::from_slice(v).view([1, -1]);
        tch::no_grad(|| {
            actor
                .var_store
                .variables()
                .get_mut("action_log_std")
                .unwrap()
                .copy_(&src);
        });
    }

    #[test]
    fn test_forward() {
        let actor = GaussianActor::build(GaussianActorConfig::new(4, 3)).unwrap();
        let (mean, std, log_std) = actor.forward(&Tensor::randn([5, 4], FLOAT_CPU)).unwrap();

        assert_eq!(mean.size(), vec![5, 3]);
        assert_eq!(std.size(), vec![5, 3]);
        assert_eq!(log_std.size(), vec![5, 3]);
        assert_eq!(log_std.abs().max().double_value(&[]), 0.0);
        assert_eq!(std.min().double_value(&[]), 1.0);
    }

    #[test]
    fn test_std_is_exp_of_log_std() {
        let actor = GaussianActor::build(GaussianActorConfig::new(4, 2)).unwrap();
        set_log_std(&actor, &[0.5, -1.25]);
        let (_, std, log_std) = actor.forward(&Tensor::randn([7, 4], FLOAT_CPU)).unwrap();

        assert!(std.equal(&log_std.exp()));
        for i in 1..7 {
            assert!(log_std.get(i).equal(&log_std.get(0)));
        }
        assert_eq!(
            Vec::<f32>::try_from(&log_std.get(3)).unwrap(),
            vec![0.5, -1.25]
        );
    }

    #[test]
    fn test_mean_bounded() {
        let actor = GaussianActor::build(GaussianActorConfig::new(4, 2)).unwrap();
        tch::no_grad(|| {
            let _ = actor
                .var_store
                .variables()
                .get_mut("fc_action.weight")
                .unwrap()
                .fill_(5.0);
        });
        let xs = Tensor::randn([32, 4], FLOAT_CPU) * 50.0;
        let (mean, _, _) = actor.forward(&xs).unwrap();

        assert!(mean.abs().max().double_value(&[]) <= 1.0);
    }

    #[test]
    fn test_initialization() {
        let actor = GaussianActor::build(GaussianActorConfig::new(4, 2)).unwrap();
        let vars = actor.var_store.variables();

        assert_eq!(vars.len(), 7);
        assert!(vars["fc_action.weight"].abs().max().double_value(&[]) <= FINAL_LAYER_BOUND);
        for name in ["fc1.bias", "fc2.bias", "fc_action.bias", "action_log_std"].iter() {
            assert_eq!(vars[*name].abs().max().double_value(&[]), 0.0);
        }

        // Square hidden layer is orthogonal, the input layer has orthonormal columns.
        let eye = |n| Tensor::eye(n, (Kind::Float, Device::Cpu));
        let w2 = &vars["fc2.weight"];
        assert!(w2
            .matmul(&w2.transpose(0, 1))
            .allclose(&eye(64), 1e-4, 1e-4, false));
        let w1 = &vars["fc1.weight"];
        assert_eq!(w1.size(), vec![64, 4]);
        assert!(w1
            .transpose(0, 1)
            .matmul(w1)
            .allclose(&eye(4), 1e-4, 1e-4, false));
    }

    #[test]
    fn test_log_std_is_trainable() {
        let actor = GaussianActor::build(GaussianActorConfig::new(4, 2)).unwrap();
        let params = actor.parameters();

        assert_eq!(params.len(), 7);
        assert!(params.iter().any(|p| p.size() == vec![1, 2]));
    }

    #[test]
    fn test_shape_mismatch() {
        let actor = GaussianActor::build(GaussianActorConfig::new(4, 2)).unwrap();
        let res = actor.forward(&Tensor::zeros([3, 5], FLOAT_CPU));
        assert!(matches!(res, Err(AcNetError::ShapeMismatch { .. })));

        let res = GaussianActor::build(GaussianActorConfig::new(4, 2).hidden_size(0));
        assert!(matches!(res, Err(AcNetError::InvalidConfig(_))));
    }

    #[test]
    fn test_state_dict_round_trip() {
        let actor = GaussianActor::build(GaussianActorConfig::new(4, 2)).unwrap();
        set_log_std(&actor, &[0.1, 0.2]);
        let mut other = GaussianActor::build(GaussianActorConfig::new(4, 2)).unwrap();
        other.load_state_dict(&actor.state_dict()).unwrap();

        let xs = Tensor::randn([3, 4], FLOAT_CPU);
        let (m1, s1, l1) = actor.forward(&xs).unwrap();
        let (m2, s2, l2) = other.forward(&xs).unwrap();
        assert!(m1.equal(&m2));
        assert!(s1.equal(&s2));
        assert!(l1.equal(&l2));
    }
}
