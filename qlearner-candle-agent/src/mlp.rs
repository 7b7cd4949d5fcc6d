//! Multilayer perceptrons.
mod base;
mod config;
mod dueling;
pub use base::Mlp;
pub use config::MlpConfig;
pub use dueling::DuelingMlp;
use anyhow::Result;
use candle_core::{Module, Tensor};
use candle_nn::{linear, Linear, VarBuilder};

/// Returns linear layers `in_dim -> units[0] -> ... -> units[n-1]`.
fn hidden_layers(vs: &VarBuilder, config: &MlpConfig) -> Result<Vec<Linear>> {
    let mut in_dim = config.in_dim;
    let mut layers = Vec::with_capacity(config.units.len());

    for (i, &out_dim) in config.units.iter().enumerate() {
        layers.push(linear(in_dim as _, out_dim as _, vs.pp(format!("ln{}", i)))?);
        in_dim = out_dim;
    }

    Ok(layers)
}

/// Applies the layers with ReLU after each of them.
fn hidden_forward(xs: &Tensor, layers: &[Linear]) -> Result<Tensor> {
    let mut xs = xs.clone();
    for layer in layers.iter() {
        xs = layer.forward(&xs)?.relu()?;
    }
    Ok(xs)
}

/// Input dimension of the layer following the hidden layers.
fn last_dim(config: &MlpConfig) -> i64 {
    *config.units.last().unwrap_or(&config.in_dim)
}
