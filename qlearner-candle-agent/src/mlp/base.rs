use super::{hidden_forward, hidden_layers, last_dim, MlpConfig};
use crate::model::SubModel1;
use anyhow::Result;
use candle_core::{Device, Module, Tensor};
use candle_nn::{linear, Linear, VarBuilder};

/// Multilayer perceptron with ReLU activation function.
///
/// The output layer has no activation, so the outputs can be used as Q-values.
pub struct Mlp {
    device: Device,
    layers: Vec<Linear>,
    head: Linear,
}

impl SubModel1 for Mlp {
    type Config = MlpConfig;
    type Input = Tensor;
    type Output = Tensor;

    fn forward(&self, xs: &Self::Input) -> Result<Tensor> {
        let xs = xs.to_device(&self.device)?;
        let xs = hidden_forward(&xs, &self.layers)?;
        Ok(self.head.forward(&xs)?)
    }

    fn build(vs: VarBuilder, config: Self::Config) -> Result<Self> {
        let device = vs.device().clone();
        let vs = vs.pp("mlp");
        let layers = hidden_layers(&vs, &config)?;
        let head = linear(
            last_dim(&config) as _,
            config.out_dim as _,
            vs.pp(format!("ln{}", config.units.len())),
        )?;

        Ok(Self {
            device,
            layers,
            head,
        })
    }
}
