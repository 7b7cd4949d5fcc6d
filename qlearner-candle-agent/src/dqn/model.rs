use crate::{model::SubModel1, util::OutDim};
use anyhow::Result;
use candle_core::{DType, Device, Tensor, Var};
use candle_nn::{VarBuilder, VarMap};
use log::info;
use std::path::Path;

/// Action-value function owning its [`VarMap`].
///
/// [`VarMap`]: https://docs.rs/candle-nn/0.8.4/candle_nn/var_map/struct.VarMap.html
pub struct DqnModel<Q>
where
    Q: SubModel1<Output = Tensor>,
    Q::Config: OutDim,
{
    varmap: VarMap,

    // Dimension of the output vector (equal to the number of actions).
    out_dim: i64,

    // Action-value function
    q: Q,
}

impl<Q> DqnModel<Q>
where
    Q: SubModel1<Output = Tensor>,
    Q::Config: OutDim,
{
    /// Constructs [`DqnModel`].
    pub fn build(q_config: Q::Config, device: &Device) -> Result<Self> {
        let out_dim = q_config.get_out_dim();
        let varmap = VarMap::new();
        let q = {
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
            Q::build(vb, q_config)?
        };

        Ok(Self { varmap, out_dim, q })
    }

    /// Outputs the action-values given observation(s).
    pub fn forward(&self, obs: &Q::Input) -> Result<Tensor> {
        let q = self.q.forward(obs)?;
        debug_assert_eq!(q.dims()[q.rank() - 1] as i64, self.out_dim);
        Ok(q)
    }

    /// Returns the number of actions.
    pub fn out_dim(&self) -> i64 {
        self.out_dim
    }

    /// Returns the trainable variables.
    pub fn vars(&self) -> Vec<Var> {
        self.varmap.all_vars()
    }

    pub fn get_varmap(&self) -> &VarMap {
        &self.varmap
    }

    pub fn save<T: AsRef<Path>>(&self, path: T) -> Result<()> {
        self.varmap.save(&path)?;
        info!("Save dqnmodel to {:?}", path.as_ref());
        Ok(())
    }

    pub fn load<T: AsRef<Path>>(&mut self, path: T) -> Result<()> {
        self.varmap.load(&path)?;
        info!("Load dqnmodel from {:?}", path.as_ref());
        Ok(())
    }
}
