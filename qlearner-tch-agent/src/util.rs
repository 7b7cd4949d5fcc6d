//! Utilities.
use anyhow::{anyhow, Result};
use log::trace;
use tch::nn::VarStore;

/// Apply soft update on variables.
///
/// Variables are identified by their names.
///
/// dest = tau * src + (1.0 - tau) * dest
pub fn track(dest: &mut VarStore, src: &VarStore, tau: f64) -> Result<()> {
    let src = src.variables();
    let mut dest = dest.variables();
    debug_assert_eq!(src.len(), dest.len());

    tch::no_grad(|| -> Result<()> {
        for (name, src) in src.iter() {
            let dest = dest
                .get_mut(name)
                .ok_or_else(|| anyhow!("Missing variable {} in the destination", name))?;
            let v = tau * src + (1.0 - tau) * &*dest;
            dest.copy_(&v);
        }
        Ok(())
    })?;
    trace!("soft update");

    Ok(())
}

/// Interface for handling output dimensions.
pub trait OutDim {
    /// Returns the output dimension.
    fn get_out_dim(&self) -> i64;

    /// Sets the  output dimension.
    fn set_out_dim(&mut self, v: i64);
}
