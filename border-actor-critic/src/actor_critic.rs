//! Actor and critic without shared layers.
use crate::{
    actor::{DeterministicActor, GaussianActor},
    critic::{DeterministicCritic, GaussianCritic},
    error::AcNetError,
    model::ModelBase,
    util::NamedTensors,
};
use anyhow::{Context, Result};
use log::{debug, info};
use std::{fs, path::Path};
use tch::Tensor;

/// Actor-critic of DDPG-style agents.
pub type DdpgActorCritic = DisjointActorCritic<DeterministicActor, DeterministicCritic>;

/// Actor-critic of policy-gradient agents with a Gaussian policy.
pub type GaussianActorCritic = DisjointActorCritic<GaussianActor, GaussianCritic>;

/// An actor and a critic with independent parameters.
///
/// Each network owns its own [`VarStore`](tch::nn::VarStore), so no layer or
/// tensor is shared between them. The container only manages the two sets of
/// parameters together: snapshots, gradient reset and persistence.
pub struct DisjointActorCritic<A, C>
where
    A: ModelBase,
    C: ModelBase,
{
    actor: A,
    critic: C,
}

impl<A, C> DisjointActorCritic<A, C>
where
    A: ModelBase,
    C: ModelBase,
{
    /// Builds the actor and the critic with factories taking `(state_dim, action_dim)`.
    pub fn build<FA, FC>(
        state_dim: i64,
        action_dim: i64,
        actor_fn: FA,
        critic_fn: FC,
    ) -> Result<Self, AcNetError>
    where
        FA: FnOnce(i64, i64) -> Result<A, AcNetError>,
        FC: FnOnce(i64, i64) -> Result<C, AcNetError>,
    {
        let actor = actor_fn(state_dim, action_dim)?;
        let critic = critic_fn(state_dim, action_dim)?;
        debug!(
            "Build actor-critic: {} actor and {} critic parameters",
            actor.parameters().len(),
            critic.parameters().len()
        );
        Ok(Self { actor, critic })
    }

    /// Bundles networks that are already built.
    pub fn new(actor: A, critic: C) -> Self {
        Self { actor, critic }
    }

    pub fn actor(&self) -> &A {
        &self.actor
    }

    pub fn actor_mut(&mut self) -> &mut A {
        &mut self.actor
    }

    pub fn critic(&self) -> &C {
        &self.critic
    }

    pub fn critic_mut(&mut self) -> &mut C {
        &mut self.critic
    }

    /// Splits the container into its networks.
    pub fn into_inner(self) -> (A, C) {
        (self.actor, self.critic)
    }

    /// Returns snapshots of the actor and the critic, in this order.
    pub fn state_dict(&self) -> (NamedTensors, NamedTensors) {
        (self.actor.state_dict(), self.critic.state_dict())
    }

    /// Restores both networks.
    ///
    /// Both snapshots are checked before anything is copied, so on error
    /// neither network is modified.
    pub fn load_state_dict(
        &mut self,
        state: &(NamedTensors, NamedTensors),
    ) -> Result<(), AcNetError> {
        let (actor_state, critic_state) = state;
        actor_state.check(self.actor.get_var_store())?;
        critic_state.check(self.critic.get_var_store())?;
        self.actor.load_state_dict(actor_state)?;
        self.critic.load_state_dict(critic_state)
    }

    /// Actor parameters followed by critic parameters.
    pub fn parameters(&self) -> Vec<Tensor> {
        let mut params = self.actor.parameters();
        params.extend(self.critic.parameters());
        params
    }

    /// Clears gradients of both networks.
    pub fn zero_grad(&mut self) {
        self.actor.zero_grad();
        self.critic.zero_grad();
    }

    /// Saves parameters into `actor.pt.tch` and `critic.pt.tch` under the directory `path`.
    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        let path = path.as_ref();
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory {:?}", path))?;
        self.actor.save(path.join("actor.pt.tch"))?;
        self.critic.save(path.join("critic.pt.tch"))?;
        info!("Save actor-critic to {:?}", path);
        Ok(())
    }

    /// Loads parameters saved with [`DisjointActorCritic::save`].
    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        let path = path.as_ref();
        let actor_state = NamedTensors::load(path.join("actor.pt.tch"))
            .with_context(|| format!("Failed to read actor parameters in {:?}", path))?;
        let critic_state = NamedTensors::load(path.join("critic.pt.tch"))
            .with_context(|| format!("Failed to read critic parameters in {:?}", path))?;
        self.load_state_dict(&(actor_state, critic_state))
            .with_context(|| format!("Incompatible parameters in {:?}", path))?;
        info!("Load actor-critic from {:?}", path);
        Ok(())
    }
}

impl<A, C> Clone for DisjointActorCritic<A, C>
where
    A: ModelBase + Clone,
    C: ModelBase + Clone,
{
    fn clone(&self) -> Self {
        Self {
            actor: self.actor.clone(),
            critic: self.critic.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        DeterministicActorConfig, DeterministicCriticConfig, GaussianActorConfig,
        GaussianCriticConfig, Model1, Model2,
    };
    use tch::{kind::FLOAT_CPU, Kind};

    fn ddpg(state_dim: i64, action_dim: i64) -> DdpgActorCritic {
        DisjointActorCritic::build(
            state_dim,
            action_dim,
            |s, a| DeterministicActor::build(DeterministicActorConfig::new(s, a).units([32, 16])),
            |s, a| DeterministicCritic::build(DeterministicCriticConfig::new(s, a).units([32, 16])),
        )
        .unwrap()
    }

    fn gaussian(state_dim: i64, action_dim: i64) -> GaussianActorCritic {
        DisjointActorCritic::build(
            state_dim,
            action_dim,
            |s, a| GaussianActor::build(GaussianActorConfig::new(s, a)),
            |s, _| GaussianCritic::build(GaussianCriticConfig::new(s)),
        )
        .unwrap()
    }

    #[test]
    fn test_build_propagates_errors() {
        let res: Result<DdpgActorCritic, AcNetError> = DisjointActorCritic::build(
            0,
            2,
            |s, a| DeterministicActor::build(DeterministicActorConfig::new(s, a)),
            |s, a| DeterministicCritic::build(DeterministicCriticConfig::new(s, a)),
        );
        assert!(matches!(res, Err(AcNetError::InvalidConfig(_))));
    }

    #[test]
    fn test_parameters_order_and_disjointness() {
        let ac = ddpg(3, 2);
        let actor_params = ac.actor().parameters();
        let critic_params = ac.critic().parameters();
        let params = ac.parameters();

        assert_eq!(params.len(), actor_params.len() + critic_params.len());
        for (p, q) in params.iter().zip(actor_params.iter().chain(critic_params.iter())) {
            assert_eq!(p.data_ptr(), q.data_ptr());
        }
        for p in actor_params.iter() {
            assert!(critic_params.iter().all(|q| q.data_ptr() != p.data_ptr()));
        }
    }

    #[test]
    fn test_state_dict_round_trip() {
        let ac = gaussian(4, 2);
        let mut other = gaussian(4, 2);
        other.load_state_dict(&ac.state_dict()).unwrap();

        let xs = Tensor::randn([5, 4], FLOAT_CPU);
        let (m1, s1, _) = ac.actor().forward(&xs).unwrap();
        let (m2, s2, _) = other.actor().forward(&xs).unwrap();
        assert!(m1.equal(&m2));
        assert!(s1.equal(&s2));
        assert!(ac
            .critic()
            .forward(&xs)
            .unwrap()
            .equal(&other.critic().forward(&xs).unwrap()));
    }

    #[test]
    fn test_load_state_dict_is_all_or_nothing() {
        let mut ac = ddpg(4, 2);
        let before = ac.actor().state_dict();

        // The actor part is compatible, the critic part is not.
        let actor_state = ddpg(4, 2).actor().state_dict();
        let critic_state = ddpg(3, 2).critic().state_dict();
        let res = ac.load_state_dict(&(actor_state, critic_state));

        assert!(matches!(res, Err(AcNetError::ShapeMismatch { .. })));
        let after = ac.actor().state_dict();
        for (name, t) in before.named_tensors.iter() {
            assert!(t.equal(after.get(name).unwrap()));
        }
    }

    #[test]
    fn test_zero_grad() {
        let mut ac = ddpg(3, 2);
        let xs = Tensor::randn([4, 3], FLOAT_CPU);
        let acts = ac.actor().forward(&xs).unwrap();
        let loss = ac.critic().forward(&xs, &acts).unwrap().sum(Kind::Float)
            + acts.sum(Kind::Float);
        loss.backward();

        let grad_norm = |ac: &DdpgActorCritic| {
            ac.parameters()
                .iter()
                .map(|p| {
                    let g = p.grad();
                    if g.defined() {
                        g.abs().sum(Kind::Float).double_value(&[])
                    } else {
                        0.0
                    }
                })
                .sum::<f64>()
        };
        assert!(grad_norm(&ac) > 0.0);
        assert!(ac.actor().parameters().iter().all(|p| p.grad().defined()));
        assert!(ac.critic().parameters().iter().all(|p| p.grad().defined()));

        ac.zero_grad();
        assert_eq!(grad_norm(&ac), 0.0);
    }

    #[test]
    fn test_clone() {
        let ac = ddpg(3, 2);
        let cloned = ac.clone();
        let xs = Tensor::randn([2, 3], FLOAT_CPU);

        assert!(ac
            .actor()
            .forward(&xs)
            .unwrap()
            .equal(&cloned.actor().forward(&xs).unwrap()));
        assert_ne!(
            ac.parameters()[0].data_ptr(),
            cloned.parameters()[0].data_ptr()
        );
    }
}
