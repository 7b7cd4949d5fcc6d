//! Policy holding the online and the target action-value functions.
use super::{explorer::DqnExplorer, model::DqnModel};
use crate::{
    model::SubModel1,
    util::{copy_vars, track, OutDim},
    Device,
};
use anyhow::{Context, Result};
use candle_core::{shape::D, DType, Tensor, Var};
use log::{debug, info};
use qlearner_core::QPolicy;
use rand::{rngs::SmallRng, SeedableRng};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, Write},
    path::Path,
};

/// Configuration of [`DqnPolicy`].
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct DqnPolicyConfig<Q>
where
    Q: OutDim,
{
    pub(super) q_config: Option<Q>,
    #[serde(default)]
    pub(super) explorer: DqnExplorer,
    #[serde(default = "default_device")]
    pub(super) device: Device,
    #[serde(default = "default_seed")]
    pub(super) seed: u64,
}

fn default_device() -> Device {
    Device::Cpu
}

fn default_seed() -> u64 {
    42
}

impl<Q> Default for DqnPolicyConfig<Q>
where
    Q: OutDim,
{
    fn default() -> Self {
        Self {
            q_config: None,
            explorer: DqnExplorer::default(),
            device: default_device(),
            seed: default_seed(),
        }
    }
}

impl<Q> DqnPolicyConfig<Q>
where
    Q: DeserializeOwned + Serialize + OutDim,
{
    /// Sets configurations for action-value function.
    pub fn q_config(mut self, v: Q) -> Self {
        self.q_config = Some(v);
        self
    }

    /// Sets output dimension of the model.
    pub fn out_dim(mut self, v: i64) -> Self {
        if let Some(q_config) = &mut self.q_config {
            q_config.set_out_dim(v);
        }
        self
    }

    /// Explorer.
    pub fn explorer(mut self, v: DqnExplorer) -> Self {
        self.explorer = v;
        self
    }

    /// Device.
    pub fn device(mut self, v: Device) -> Self {
        self.device = v;
        self
    }

    /// Seed of the random number generator used for exploration.
    pub fn seed(mut self, v: u64) -> Self {
        self.seed = v;
        self
    }

    /// Constructs [`DqnPolicyConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ = path.as_ref().to_owned();
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        info!("Load config of DQN policy from {:?}", path_);
        Ok(b)
    }

    /// Saves [`DqnPolicyConfig`] as a YAML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path_ = path.as_ref().to_owned();
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        info!("Save config of DQN policy into {:?}", path_);
        Ok(())
    }
}

/// DQN policy implemented with candle.
///
/// The target network is built with the same configuration as the online
/// network and starts from a copy of its parameters.
pub struct DqnPolicy<Q>
where
    Q: SubModel1<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    qnet: DqnModel<Q>,
    qnet_tgt: DqnModel<Q>,
    explorer: DqnExplorer,
    device: candle_core::Device,
    rng: SmallRng,
}

impl<Q> DqnPolicy<Q>
where
    Q: SubModel1<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs DQN policy.
    pub fn build(config: DqnPolicyConfig<Q::Config>) -> Result<Self> {
        let device = config.device.to_candle()?;
        let q_config = config.q_config.context("q_config is not set.")?;
        let qnet = DqnModel::build(q_config.clone(), &device)?;
        let qnet_tgt = DqnModel::build(q_config, &device)?;
        copy_vars(qnet_tgt.get_varmap(), qnet.get_varmap())?;

        Ok(Self {
            qnet,
            qnet_tgt,
            explorer: config.explorer,
            device,
            rng: SmallRng::seed_from_u64(config.seed),
        })
    }

    /// Returns the greedy actions as an i64 tensor.
    pub fn greedy_action(&self, obs: &Q::Input) -> Result<Tensor> {
        let q = self.qnet.forward(obs)?;
        Ok(q.argmax(D::Minus1)?.to_dtype(DType::I64)?)
    }

    /// Takes actions with the explorer in training mode, greedily otherwise.
    pub fn sample(&mut self, obs: &Q::Input, train: bool) -> Result<Tensor> {
        if train {
            let q = self.qnet.forward(obs)?.detach();
            self.explorer.action(&q, &mut self.rng)
        } else {
            self.greedy_action(obs)
        }
    }

    /// Returns the trainable variables of the online network.
    pub fn vars(&self) -> Vec<Var> {
        self.qnet.vars()
    }

    /// Returns the device of the networks.
    pub fn device(&self) -> &candle_core::Device {
        &self.device
    }

    /// Returns the online network.
    pub fn qnet(&self) -> &DqnModel<Q> {
        &self.qnet
    }

    /// Returns the target network.
    pub fn qnet_tgt(&self) -> &DqnModel<Q> {
        &self.qnet_tgt
    }
}

impl<Q> QPolicy for DqnPolicy<Q>
where
    Q: SubModel1<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    type Input = Q::Input;
    type Output = Tensor;

    fn forward(&self, obs: &Q::Input) -> Result<Tensor> {
        self.qnet.forward(obs)
    }

    fn forward_target(&self, obs: &Q::Input) -> Result<Tensor> {
        self.qnet_tgt.forward(obs)
    }

    fn copy_target(&mut self) -> Result<()> {
        copy_vars(self.qnet_tgt.get_varmap(), self.qnet.get_varmap())?;
        debug!("Copied the online network into the target network");
        Ok(())
    }

    fn soft_update_target(&mut self, tau: f64) -> Result<()> {
        track(self.qnet_tgt.get_varmap(), self.qnet.get_varmap(), tau)?;
        debug!("Soft update of the target network with tau = {}", tau);
        Ok(())
    }

    fn action_dim(&self) -> usize {
        self.qnet.out_dim() as _
    }

    fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        fs::create_dir_all(&path)?;
        self.qnet
            .save(path.as_ref().join("qnet.safetensors").as_path())?;
        self.qnet_tgt
            .save(path.as_ref().join("qnet_tgt.safetensors").as_path())?;
        Ok(())
    }

    fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.qnet
            .load(path.as_ref().join("qnet.safetensors").as_path())?;
        self.qnet_tgt
            .load(path.as_ref().join("qnet_tgt.safetensors").as_path())?;
        Ok(())
    }
}
