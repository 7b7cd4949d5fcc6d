//! Utilities.
use anyhow::{anyhow, Result};
use candle_core::{DType, Tensor};
use candle_nn::VarMap;
use log::trace;

/// Copies variables of `src` into `dest`.
///
/// Variables are identified by their names.
pub fn copy_vars(dest: &VarMap, src: &VarMap) -> Result<()> {
    track(dest, src, 1.0)
}

/// Apply soft update on variables.
///
/// Variables are identified by their names.
///
/// dest = tau * src + (1.0 - tau) * dest
pub fn track(dest: &VarMap, src: &VarMap, tau: f64) -> Result<()> {
    let dest = dest
        .data()
        .lock()
        .map_err(|_| anyhow!("Failed to lock the destination varmap"))?;
    let src = src
        .data()
        .lock()
        .map_err(|_| anyhow!("Failed to lock the source varmap"))?;

    for (k_dest, v_dest) in dest.iter() {
        let v_src = src
            .get(k_dest)
            .ok_or_else(|| anyhow!("Missing variable {} in the source varmap", k_dest))?;
        let t_src = v_src.as_tensor().detach();
        let t_dest = if tau == 1.0 {
            t_src
        } else {
            ((tau * t_src)? + ((1.0 - tau) * v_dest.as_tensor().detach())?)?
        };
        v_dest.set(&t_dest)?;
    }
    trace!("Updated {} variables with tau = {}", dest.len(), tau);

    Ok(())
}

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> i64;

    /// Sets the  output dimension.
    fn set_out_dim(&mut self, v: i64);
}

/// See <https://pytorch.org/docs/stable/generated/torch.nn.SmoothL1Loss.html>.
pub fn smooth_l1_loss(x: &Tensor, y: &Tensor) -> Result<Tensor, candle_core::Error> {
    let d = (x - y)?.abs()?;
    let m1 = d.lt(1.0)?.to_dtype(DType::F32)?;
    let m2 = m1.affine(-1.0, 1.0)?;
    (((0.5 * m1)? * d.powf(2.0))? + m2 * (d - 0.5))?.mean_all()
}
