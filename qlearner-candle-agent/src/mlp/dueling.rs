use super::{hidden_forward, hidden_layers, last_dim, MlpConfig};
use crate::model::SubModel1;
use anyhow::Result;
use candle_core::{Device, Module, Tensor, D};
use candle_nn::{linear, Linear, VarBuilder};

/// Dueling network on a shared MLP trunk.
///
/// Q(s, a) = V(s) + A(s, a) - mean_a A(s, a)
pub struct DuelingMlp {
    device: Device,
    layers: Vec<Linear>,
    value: Linear,
    advantage: Linear,
}

impl DuelingMlp {
    /// Returns the state value and the advantages.
    pub fn value_advantage(&self, xs: &Tensor) -> Result<(Tensor, Tensor)> {
        let xs = xs.to_device(&self.device)?;
        let xs = hidden_forward(&xs, &self.layers)?;
        let v = self.value.forward(&xs)?;
        let a = self.advantage.forward(&xs)?;
        Ok((v, a))
    }
}

impl SubModel1 for DuelingMlp {
    type Config = MlpConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, xs: &Self::Input) -> Result<Tensor> {
        let (v, a) = self.value_advantage(xs)?;
        let a_mean = a.mean_keepdim(D::Minus1)?;
        Ok(v.broadcast_add(&a.broadcast_sub(&a_mean)?)?)
    }

    fn build(vs: VarBuilder, config: Self::Config) -> Result<Self> {
        let device = vs.device().clone();
        let vs = vs.pp("dueling");
        let layers = hidden_layers(&vs, &config)?;
        let in_dim = last_dim(&config) as usize;
        let value = linear(in_dim, 1, vs.pp("value"))?;
        let advantage = linear(in_dim, config.out_dim as _, vs.pp("advantage"))?;

        Ok(Self {
            device,
            layers,
            value,
            advantage,
        })
    }
}
