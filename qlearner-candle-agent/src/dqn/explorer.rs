//! Exploration strategies of DQN.
use anyhow::Result;
use candle_core::{shape::D, DType, Tensor};
use candle_nn::ops::softmax;
use rand::{distributions::WeightedIndex, Rng};
use serde::{Deserialize, Serialize};

/// Explorers for DQN.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub enum DqnExplorer {
    /// Softmax action selection.
    Softmax(Softmax),

    /// Epsilon-greedy action selection.
    EpsilonGreedy(EpsilonGreedy),
}

impl Default for DqnExplorer {
    fn default() -> Self {
        Self::EpsilonGreedy(EpsilonGreedy::new())
    }
}

impl DqnExplorer {
    /// Takes actions based on action values, returns i64 tensor.
    pub fn action(&mut self, a: &Tensor, rng: &mut impl Rng) -> Result<Tensor> {
        match self {
            Self::Softmax(softmax) => softmax.action(a, rng),
            Self::EpsilonGreedy(egreedy) => egreedy.action(a, rng),
        }
    }
}

/// Softmax explorer for DQN.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct Softmax {}

#[allow(clippy::new_without_default)]
impl Softmax {
    /// Constructs softmax explorer.
    pub fn new() -> Self {
        Self {}
    }

    /// Takes an action based on action values, returns i64 tensor.
    ///
    /// * `a` - action values.
    pub fn action(&mut self, a: &Tensor, rng: &mut impl Rng) -> Result<Tensor> {
        let device = a.device();
        let probs = softmax(a, D::Minus1)?.to_vec2::<f32>()?;
        let n_samples = probs.len();
        let data = probs
            .into_iter()
            .map(|p| Ok(rng.sample(WeightedIndex::new(&p)?) as i64))
            .collect::<Result<Vec<_>>>()?;
        Ok(Tensor::from_vec(data, &[n_samples], device)?)
    }
}

/// Epsilon-greedy explorer for DQN.
///
/// Epsilon decays linearly from `eps_start` to `eps_final` over `final_step` calls.
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct EpsilonGreedy {
    pub n_opts: usize,
    pub eps_start: f64,
    pub eps_final: f64,
    pub final_step: usize,
}

#[allow(clippy::new_without_default)]
impl EpsilonGreedy {
    /// Constructs epsilon-greedy explorer.
    pub fn new() -> Self {
        Self {
            n_opts: 0,
            eps_start: 1.0,
            eps_final: 0.02,
            final_step: 100_000,
        }
    }

    /// Constructs epsilon-greedy explorer.
    pub fn with_final_step(final_step: usize) -> DqnExplorer {
        DqnExplorer::EpsilonGreedy(Self {
            final_step,
            ..Self::new()
        })
    }

    /// Returns the current value of epsilon.
    pub fn eps(&self) -> f64 {
        let d = (self.eps_start - self.eps_final) / (self.final_step.max(1) as f64);
        (self.eps_start - d * self.n_opts as f64).max(self.eps_final)
    }

    /// Takes an action based on action values, returns i64 tensor.
    ///
    /// * `a` - action values.
    pub fn action(&mut self, a: &Tensor, rng: &mut impl Rng) -> Result<Tensor> {
        let eps = self.eps();
        let is_random = rng.gen::<f32>() < eps as f32;
        self.n_opts += 1;

        if is_random {
            let n_samples = a.dims()[0];
            let n_actions = a.dims()[1] as u64;
            Ok(Tensor::from_slice(
                (0..n_samples)
                    .map(|_| (rng.gen::<u64>() % n_actions) as i64)
                    .collect::<Vec<_>>()
                    .as_slice(),
                &[n_samples],
                a.device(),
            )?)
        } else {
            Ok(a.argmax(D::Minus1)?.to_dtype(DType::I64)?)
        }
    }

    /// Set the epsilon value at the final step.
    pub fn eps_final(self, v: f64) -> Self {
        let mut s = self;
        s.eps_final = v;
        s
    }

    /// Set the epsilon value at the start.
    pub fn eps_start(self, v: f64) -> Self {
        let mut s = self;
        s.eps_start = v;
        s
    }
}
