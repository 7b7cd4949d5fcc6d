use anyhow::Result;
use candle_core::{Device, Tensor};
use qlearner_core::{check_batch_dim, error::QlearnError, TransitionBatch};

/// A batch of transitions with observations and actions held in [`Tensor`]s.
///
/// Observations have shape `[batch_size, ...]` and actions `[batch_size]`
/// or `[batch_size, 1]` with integer indices of the taken actions.
///
/// [`Tensor`]: https://docs.rs/candle-core/0.8.4/candle_core/struct.Tensor.html
#[derive(Clone, Debug)]
pub struct TensorBatch {
    obs: Tensor,
    act: Tensor,
    next_obs: Tensor,
    reward: Vec<f32>,
    is_terminated: Vec<i8>,
}

impl TensorBatch {
    /// Creates a batch, checking that all arrays have the same batch size.
    pub fn new(
        obs: Tensor,
        act: Tensor,
        next_obs: Tensor,
        reward: Vec<f32>,
        is_terminated: Vec<i8>,
    ) -> Result<Self> {
        let batch_size = reward.len();
        check_batch_dim("obs", batch_size, obs.dims().first().copied().unwrap_or(0))?;
        check_batch_dim("act", batch_size, act.dims().first().copied().unwrap_or(0))?;
        check_batch_dim(
            "next_obs",
            batch_size,
            next_obs.dims().first().copied().unwrap_or(0),
        )?;
        check_batch_dim("is_terminated", batch_size, is_terminated.len())?;

        Ok(Self {
            obs,
            act,
            next_obs,
            reward,
            is_terminated,
        })
    }

    /// Creates a batch from flat slices.
    ///
    /// `obs` and `next_obs` are row-major with `reward.len()` rows.
    pub fn from_slices(
        obs: &[f32],
        act: &[i64],
        next_obs: &[f32],
        reward: &[f32],
        is_terminated: &[i8],
        device: &Device,
    ) -> Result<Self> {
        let batch_size = reward.len();
        if batch_size == 0 || obs.len() % batch_size != 0 {
            return Err(QlearnError::BatchShapeError {
                name: "obs".to_string(),
                expected: batch_size,
                actual: obs.len(),
            }
            .into());
        }
        let obs_dim = obs.len() / batch_size;
        check_batch_dim("next_obs", obs.len(), next_obs.len())?;
        check_batch_dim("act", batch_size, act.len())?;

        Self::new(
            Tensor::from_slice(obs, (batch_size, obs_dim), device)?,
            Tensor::from_slice(act, (batch_size,), device)?,
            Tensor::from_slice(next_obs, (batch_size, obs_dim), device)?,
            reward.to_vec(),
            is_terminated.to_vec(),
        )
    }
}

impl TransitionBatch for TensorBatch {
    type ObsBatch = Tensor;
    type ActBatch = Tensor;

    fn unpack(self) -> (Tensor, Tensor, Tensor, Vec<f32>, Vec<i8>) {
        (
            self.obs,
            self.act,
            self.next_obs,
            self.reward,
            self.is_terminated,
        )
    }

    fn len(&self) -> usize {
        self.reward.len()
    }

    fn obs(&self) -> &Tensor {
        &self.obs
    }

    fn act(&self) -> &Tensor {
        &self.act
    }

    fn next_obs(&self) -> &Tensor {
        &self.next_obs
    }

    fn reward(&self) -> &Vec<f32> {
        &self.reward
    }

    fn is_terminated(&self) -> &Vec<i8> {
        &self.is_terminated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_slices() -> Result<()> {
        let batch = TensorBatch::from_slices(
            &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            &[1, 0],
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            &[1.0, -1.0],
            &[0, 1],
            &Device::Cpu,
        )?;
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.obs().dims(), &[2, 3]);
        assert_eq!(batch.act().dims(), &[2]);
        Ok(())
    }

    #[test]
    fn test_misaligned_batch() {
        let res = TensorBatch::from_slices(
            &[0.0, 1.0, 2.0, 3.0],
            &[1, 0, 1],
            &[0.0, 1.0, 2.0, 3.0],
            &[1.0, -1.0],
            &[0, 1],
            &Device::Cpu,
        );
        let err = res.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<QlearnError>(),
            Some(QlearnError::BatchShapeError { .. })
        ));
    }
}
