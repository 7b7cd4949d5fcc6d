//! Policy holding the online and the target action-value functions.
use super::{explorer::DqnExplorer, model::DqnModel};
use crate::{model::SubModel, util::{track, OutDim}, Device};
use anyhow::{Context, Result};
use log::{debug, info};
use qlearner_core::QPolicy;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, Write},
    path::Path,
};
use tch::{nn, Tensor};

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

    /// Seed of parameter initialization and exploration.
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

/// DQN policy implemented with tch.
///
/// The target network is a clone of the online network with its own parameters.
pub struct DqnPolicy<Q>
where
    Q: SubModel<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    qnet: DqnModel<Q>,
    qnet_tgt: DqnModel<Q>,
    explorer: DqnExplorer,
    device: tch::Device,
}

impl<Q> DqnPolicy<Q>
where
    Q: SubModel<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    /// Constructs DQN policy.
    ///
    /// The seed is applied to the global generators of tch and fastrand.
    pub fn build(config: DqnPolicyConfig<Q::Config>) -> Result<Self> {
        tch::manual_seed(config.seed as i64);
        fastrand::seed(config.seed);

        let device = config.device.into();
        let q_config = config.q_config.context("q_config is not set.")?;
        let qnet = DqnModel::build(q_config, device);
        let qnet_tgt = qnet.try_clone()?;

        Ok(Self {
            qnet,
            qnet_tgt,
            explorer: config.explorer,
            device,
        })
    }

    /// Returns the greedy actions as an i64 tensor.
    pub fn greedy_action(&self, obs: &Q::Input) -> Tensor {
        tch::no_grad(|| self.qnet.forward(obs).argmax(-1, false))
    }

    /// Takes actions with the explorer in training mode, greedily otherwise.
    pub fn sample(&mut self, obs: &Q::Input, train: bool) -> Tensor {
        if train {
            let q = tch::no_grad(|| self.qnet.forward(obs));
            self.explorer.action(&q)
        } else {
            self.greedy_action(obs)
        }
    }

    /// Returns the var store of the online network.
    pub fn var_store(&self) -> &nn::VarStore {
        self.qnet.get_var_store()
    }

    /// Returns the device of the networks.
    pub fn device(&self) -> tch::Device {
        self.device
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
    Q: SubModel<Output = Tensor>,
    Q::Config: DeserializeOwned + Serialize + OutDim + Clone,
{
    type Input = Q::Input;
    type Output = Tensor;

    fn forward(&self, obs: &Q::Input) -> Result<Tensor> {
        Ok(self.qnet.forward(obs))
    }

    fn forward_target(&self, obs: &Q::Input) -> Result<Tensor> {
        Ok(self.qnet_tgt.forward(obs))
    }

    fn copy_target(&mut self) -> Result<()> {
        self.qnet_tgt
            .get_var_store_mut()
            .copy(self.qnet.get_var_store())?;
        debug!("Copied the online network into the target network");
        Ok(())
    }

    fn soft_update_target(&mut self, tau: f64) -> Result<()> {
        track(
            self.qnet_tgt.get_var_store_mut(),
            self.qnet.get_var_store(),
            tau,
        )?;
        debug!("Soft update of the target network with tau = {}", tau);
        Ok(())
    }

    fn action_dim(&self) -> usize {
        self.qnet.out_dim() as _
    }

    fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        fs::create_dir_all(&path)?;
        self.qnet.save(path.as_ref().join("qnet.pt").as_path())?;
        self.qnet_tgt
            .save(path.as_ref().join("qnet_tgt.pt").as_path())?;
        Ok(())
    }

    fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.qnet.load(path.as_ref().join("qnet.pt").as_path())?;
        self.qnet_tgt
            .load(path.as_ref().join("qnet_tgt.pt").as_path())?;
        Ok(())
    }
}
