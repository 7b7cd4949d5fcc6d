//! DQN learner implemented with tch.
use super::policy::DqnPolicy;
use crate::{
    model::SubModel,
    opt::{Optimizer, OptimizerConfig},
    util::OutDim,
};
use anyhow::Result;
use log::{debug, trace};
use qlearner_core::{
    check_action_index,
    record::{Record, RecordValue},
    CriticLoss, DqnConfig, Learner, QPolicy, TransitionBatch,
};
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;
use tch::{no_grad, Kind, Reduction, Tensor};

#[allow(clippy::upper_case_acronyms)]
/// DQN learner implemented with tch.
///
/// The learner owns the optimizer of the online network of the policy.
/// Dueling DQN is this learner with a [`DuelingMlp`](crate::mlp::DuelingMlp) policy.
pub struct DqnLearner<Q, B>
where
    Q: SubModel<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
    B: TransitionBatch,
    B::ObsBatch: Into<Q::Input>,
    B::ActBatch: Into<Tensor>,
{
    policy: DqnPolicy<Q>,
    opt: Optimizer,
    config: DqnConfig,
    iterations: usize,
    phantom: PhantomData<B>,
}

impl<Q, B> DqnLearner<Q, B>
where
    Q: SubModel<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
    B: TransitionBatch,
    B::ObsBatch: Into<Q::Input>,
    B::ActBatch: Into<Tensor>,
{
    /// Constructs DQN learner over the given policy.
    pub fn new(config: DqnConfig, policy: DqnPolicy<Q>) -> Result<Self> {
        config.check()?;
        let opt = OptimizerConfig::Adam {
            lr: config.learning_rate,
            eps: config.adam_eps,
        }
        .build(policy.var_store())?;

        Ok(Self {
            policy,
            opt,
            config,
            iterations: 0,
            phantom: PhantomData,
        })
    }

    /// Returns the policy.
    pub fn policy(&self) -> &DqnPolicy<Q> {
        &self.policy
    }

    /// Returns the policy as mutable reference.
    pub fn policy_mut(&mut self) -> &mut DqnPolicy<Q> {
        &mut self.policy
    }

    /// Returns the policy, dropping the learner.
    pub fn into_policy(self) -> DqnPolicy<Q> {
        self.policy
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    /// Returns the learning rate the optimizer currently uses.
    pub fn learning_rate(&self) -> f64 {
        self.opt.learning_rate()
    }

    /// Computes the TD targets without tracking gradients.
    pub fn td_target(
        &self,
        next_obs: &Q::Input,
        reward: &[f32],
        is_terminated: &[i8],
    ) -> Result<Tensor> {
        let device = self.policy.device();
        let reward = Tensor::from_slice(reward).f_to_device(device)?;
        let is_not_terminated = {
            let v = is_terminated
                .iter()
                .map(|d| (1 - *d) as f32)
                .collect::<Vec<_>>();
            Tensor::from_slice(&v).f_to_device(device)?
        };

        no_grad(|| -> Result<Tensor> {
            let next_q = if self.config.double_dqn {
                let a = self.policy.forward(next_obs)?.f_argmax(-1, true)?;
                self.policy
                    .forward_target(next_obs)?
                    .f_gather(-1, &a, false)?
                    .f_squeeze_dim(-1)?
            } else {
                self.policy.forward_target(next_obs)?.f_max_dim(-1, false)?.0
            };
            let discounted = is_not_terminated
                .f_mul_scalar(self.config.gamma)?
                .f_mul(&next_q)?;
            Ok(reward.f_add(&discounted)?)
        })
    }

    /// Returns `Q(o_i, a_i)` of the online network.
    ///
    /// Fails with [`QlearnError::ActionIndexError`](qlearner_core::error::QlearnError::ActionIndexError) if an action is out of range.
    pub fn predict_q(&self, obs: &Q::Input, act: &Tensor) -> Result<Tensor> {
        let act = act.f_to_device(self.policy.device())?.f_to_kind(Kind::Int64)?;
        check_action_index(
            &Vec::<i64>::try_from(act.f_flatten(0, -1)?)?,
            self.policy.action_dim(),
        )?;
        let act = match act.dim() {
            1 => act.f_unsqueeze(-1)?,
            _ => act,
        };
        let q = self.policy.forward(obs)?;
        Ok(q.f_gather(-1, &act, false)?.f_squeeze_dim(-1)?)
    }

    fn update_critic(&mut self, batch: B) -> Result<(f32, f32, f64)> {
        let (obs, act, next_obs, reward, is_terminated) = batch.unpack();
        let obs = obs.into();
        let act = act.into();
        let next_obs = next_obs.into();

        let pred = self.predict_q(&obs, &act)?;
        let tgt = self.td_target(&next_obs, &reward, &is_terminated)?;

        let loss = match self.config.critic_loss {
            CriticLoss::Mse => pred.f_mse_loss(&tgt, Reduction::Mean)?,
            CriticLoss::SmoothL1 => pred.f_smooth_l1_loss(&tgt, Reduction::Mean, 1.0)?,
        };

        let lr = self
            .config
            .lr_scheduler
            .lr(self.config.learning_rate, self.iterations);
        self.opt.set_learning_rate(lr);
        self.opt.backward_step(&loss);

        let loss = f32::try_from(&loss)?;
        let predict_q = f32::try_from(pred.detach().f_mean(Kind::Float)?)?;
        Ok((loss, predict_q, lr))
    }
}

impl<Q, B> Learner for DqnLearner<Q, B>
where
    Q: SubModel<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
    B: TransitionBatch,
    B::ObsBatch: Into<Q::Input>,
    B::ActBatch: Into<Tensor>,
{
    type Batch = B;

    fn update(&mut self, batch: B) -> Result<Record> {
        let (loss, predict_q, lr) = self.update_critic(batch)?;
        self.iterations += 1;
        trace!(
            "iteration {}: Qloss = {}, predictQ = {}",
            self.iterations,
            loss,
            predict_q
        );

        if self.iterations % self.config.sync_frequency == 0 {
            match self.config.tau {
                None => self.policy.copy_target()?,
                Some(tau) => self.policy.soft_update_target(tau)?,
            }
            debug!("Synchronized target network at iteration {}", self.iterations);
        }

        Ok(Record::from_slice(&[
            ("Qloss", RecordValue::Scalar(loss)),
            ("predictQ", RecordValue::Scalar(predict_q)),
            ("learning_rate", RecordValue::Scalar(lr as f32)),
        ]))
    }

    fn iterations(&self) -> usize {
        self.iterations
    }
}
