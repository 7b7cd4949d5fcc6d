use super::{last_dim, mlp, MlpConfig};
use crate::model::SubModel;
use tch::{nn, nn::Module, Device, Kind, Tensor};

/// Dueling network on a shared MLP trunk.
///
/// Q(s, a) = V(s) + A(s, a) - mean_a A(s, a)
pub struct DuelingMlp {
    config: MlpConfig,
    device: Device,
    seq: nn::Sequential,
    value: nn::Linear,
    advantage: nn::Linear,
}

impl DuelingMlp {
    /// Returns the state value and the advantages.
    pub fn value_advantage(&self, x: &Tensor) -> (Tensor, Tensor) {
        let x = self.seq.forward(&x.to(self.device));
        (x.apply(&self.value), x.apply(&self.advantage))
    }
}

impl SubModel for DuelingMlp {
    type Config = MlpConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, x: &Self::Input) -> Tensor {
        let (v, a) = self.value_advantage(x);
        let a_mean = a.mean_dim(&[-1i64][..], true, Kind::Float);
        v + (a - a_mean)
    }

    fn build(var_store: &nn::VarStore, config: Self::Config) -> Self {
        let p = &(var_store.root() / "dueling");
        let seq = mlp(p, &config);
        let in_dim = last_dim(&config);
        let value = nn::linear(p / "value", in_dim, 1, Default::default());
        let advantage = nn::linear(p / "advantage", in_dim, config.out_dim, Default::default());

        Self {
            config,
            device: var_store.device(),
            seq,
            value,
            advantage,
        }
    }

    fn clone_with_var_store(&self, var_store: &nn::VarStore) -> Self {
        Self::build(var_store, self.config.clone())
    }
}
