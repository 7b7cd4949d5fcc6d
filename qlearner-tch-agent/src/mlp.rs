//! Multilayer perceptrons.
mod base;
mod config;
mod dueling;
pub use base::Mlp;
pub use config::MlpConfig;
pub use dueling::DuelingMlp;
use tch::nn;

/// Hidden layers `in_dim -> units[0] -> ... -> units[n-1]` with ReLU.
fn mlp(p: &nn::Path, config: &MlpConfig) -> nn::Sequential {
    let mut seq = nn::seq();
    let mut in_dim = config.in_dim;

    for (i, &out_dim) in config.units.iter().enumerate() {
        seq = seq.add(nn::linear(
            p / format!("ln{}", i),
            in_dim,
            out_dim,
            Default::default(),
        ));
        seq = seq.add_fn(|x| x.relu());
        in_dim = out_dim;
    }

    seq
}

/// Input dimension of the layer following the hidden layers.
fn last_dim(config: &MlpConfig) -> i64 {
    *config.units.last().unwrap_or(&config.in_dim)
}
