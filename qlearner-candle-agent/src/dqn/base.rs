//! DQN learner implemented with candle.
use super::policy::DqnPolicy;
use crate::{
    model::SubModel1,
    opt::{Optimizer, OptimizerConfig},
    util::{smooth_l1_loss, OutDim},
};
use anyhow::Result;
use candle_core::{shape::D, DType, Tensor};
use candle_nn::loss::mse;
use log::{debug, trace};
use qlearner_core::{
    check_action_index,
    record::{Record, RecordValue},
    CriticLoss, DqnConfig, Learner, QPolicy, TransitionBatch,
};
use serde::{de::DeserializeOwned, Serialize};
use std::marker::PhantomData;

/// DQN learner implemented with candle.
///
/// The learner owns the optimizer of the online network of the policy.
/// Dueling DQN is this learner with a [`DuelingMlp`](crate::mlp::DuelingMlp) policy.
pub struct DqnLearner<Q, B>
where
    Q: SubModel1<Output = Tensor>,
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
    Q: SubModel1<Output = Tensor>,
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
        .build(policy.vars())?;

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
        let batch_size = reward.len();
        let reward = Tensor::from_slice(reward, (batch_size,), device)?;
        let is_not_terminated = {
            let v = is_terminated
                .iter()
                .map(|d| (1 - *d) as f32)
                .collect::<Vec<_>>();
            Tensor::from_vec(v, (batch_size,), device)?
        };

        let next_q = if self.config.double_dqn {
            let a = self
                .policy
                .forward(next_obs)?
                .argmax_keepdim(D::Minus1)?;
            self.policy
                .forward_target(next_obs)?
                .gather(&a, D::Minus1)?
                .squeeze(D::Minus1)?
        } else {
            self.policy.forward_target(next_obs)?.max(D::Minus1)?
        };

        let tgt = (is_not_terminated * next_q.detach())?.affine(self.config.gamma, 0.0)?;
        Ok((reward + tgt)?.detach())
    }

    /// Returns `Q(o_i, a_i)` of the online network.
    ///
    /// Fails with [`QlearnError::ActionIndexError`](qlearner_core::error::QlearnError::ActionIndexError) if an action is out of range.
    pub fn predict_q(&self, obs: &Q::Input, act: &Tensor) -> Result<Tensor> {
        let act = act.to_device(self.policy.device())?.to_dtype(DType::I64)?;
        check_action_index(
            &act.flatten_all()?.to_vec1::<i64>()?,
            self.policy.action_dim(),
        )?;
        let act = match act.rank() {
            1 => act.unsqueeze(D::Minus1)?,
            _ => act,
        };
        let q = self.policy.forward(obs)?;
        Ok(q.gather(&act, D::Minus1)?.squeeze(D::Minus1)?)
    }

    fn update_critic(&mut self, batch: B) -> Result<(f32, f32, f64)> {
        let (obs, act, next_obs, reward, is_terminated) = batch.unpack();
        let obs = obs.into();
        let act = act.into();
        let next_obs = next_obs.into();

        let pred = self.predict_q(&obs, &act)?;
        let tgt = self.td_target(&next_obs, &reward, &is_terminated)?;

        let loss = match self.config.critic_loss {
            CriticLoss::Mse => mse(&pred, &tgt)?,
            CriticLoss::SmoothL1 => smooth_l1_loss(&pred, &tgt)?,
        };

        let lr = self
            .config
            .lr_scheduler
            .lr(self.config.learning_rate, self.iterations);
        self.opt.set_learning_rate(lr);
        self.opt.backward_step(&loss)?;

        let loss = loss.to_scalar::<f32>()?;
        let predict_q = pred.mean_all()?.to_scalar::<f32>()?;
        Ok((loss, predict_q, lr))
    }
}

impl<Q, B> Learner for DqnLearner<Q, B>
where
    Q: SubModel1<Output = Tensor>,
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
