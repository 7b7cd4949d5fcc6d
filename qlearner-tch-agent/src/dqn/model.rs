use crate::{model::SubModel, util::OutDim};
use anyhow::Result;
use log::{info, trace};
use tch::{nn, Device, Tensor};

#[allow(clippy::upper_case_acronyms)]
/// Action-value function owning its [`VarStore`].
///
/// [`VarStore`]: https://docs.rs/tch/0.16.0/tch/nn/struct.VarStore.html
pub struct DqnModel<Q>
where
    Q: SubModel<Output = Tensor>,
    Q::Config: OutDim,
{
    device: Device,
    var_store: nn::VarStore,

    // Dimension of the output vector (equal to the number of actions).
    out_dim: i64,

    // Action-value function
    q: Q,
}

impl<Q> DqnModel<Q>
where
    Q: SubModel<Output = Tensor>,
    Q::Config: OutDim,
{
    /// Constructs [`DqnModel`].
    pub fn build(q_config: Q::Config, device: Device) -> Self {
        let out_dim = q_config.get_out_dim();
        let var_store = nn::VarStore::new(device);
        let q = Q::build(&var_store, q_config);

        Self {
            device,
            var_store,
            out_dim,
            q,
        }
    }

    /// Outputs the action-values given observation(s).
    pub fn forward(&self, x: &Q::Input) -> Tensor {
        let a = self.q.forward(x);
        debug_assert_eq!(a.size().last().copied(), Some(self.out_dim));
        a
    }

    /// Returns the number of actions.
    pub fn out_dim(&self) -> i64 {
        self.out_dim
    }

    pub fn get_var_store(&self) -> &nn::VarStore {
        &self.var_store
    }

    pub fn get_var_store_mut(&mut self) -> &mut nn::VarStore {
        &mut self.var_store
    }

    pub fn save<T: AsRef<std::path::Path>>(&self, path: T) -> Result<()> {
        self.var_store.save(&path)?;
        info!("Save DQN model to {:?}", path.as_ref());
        for (name, _) in self.var_store.variables().iter() {
            trace!("Save variable {}", name);
        }
        Ok(())
    }

    pub fn load<T: AsRef<std::path::Path>>(&mut self, path: T) -> Result<()> {
        self.var_store.load(&path)?;
        info!("Load DQN model from {:?}", path.as_ref());
        Ok(())
    }

    /// Clones the model with its own [`VarStore`](nn::VarStore), copying the parameters.
    pub fn try_clone(&self) -> Result<Self> {
        let mut var_store = nn::VarStore::new(self.device);
        let q = self.q.clone_with_var_store(&var_store);
        var_store.copy(&self.var_store)?;

        Ok(Self {
            device: self.device,
            var_store,
            out_dim: self.out_dim,
            q,
        })
    }
}
