//! Exploration strategies of DQN.
use serde::{Deserialize, Serialize};
use tch::{Kind, Tensor};

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
    /// Takes actions based on action values, returns i64 tensor of shape `[batch_size]`.
    pub fn action(&mut self, a: &Tensor) -> Tensor {
        match self {
            Self::Softmax(softmax) => softmax.action(a),
            Self::EpsilonGreedy(egreedy) => egreedy.action(a),
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

    /// Takes an action based on action values.
    pub fn action(&mut self, a: &Tensor) -> Tensor {
        a.softmax(-1, Kind::Float)
            .multinomial(1, true)
            .squeeze_dim(-1)
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

    /// Takes an action based on action values.
    pub fn action(&mut self, a: &Tensor) -> Tensor {
        let is_random = fastrand::f64() < self.eps();
        self.n_opts += 1;

        if is_random {
            let n_samples = a.size()[0];
            let n_actions = a.size()[1];
            Tensor::from_slice(
                (0..n_samples)
                    .map(|_| fastrand::i64(..n_actions))
                    .collect::<Vec<_>>()
                    .as_slice(),
            )
            .to(a.device())
        } else {
            a.argmax(-1, false)
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
