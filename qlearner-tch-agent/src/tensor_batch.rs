use anyhow::Result;
use qlearner_core::{check_batch_dim, error::QlearnError, TransitionBatch};
use tch::Tensor;

/// A batch of transitions with observations and actions held in [`Tensor`]s.
///
/// Observations have shape `[batch_size, ...]` and actions `[batch_size]`
/// or `[batch_size, 1]` with integer indices of the taken actions.
///
/// [`Tensor`]: https://docs.rs/tch/0.16.0/tch/struct.Tensor.html
#[derive(Debug)]
pub struct TensorBatch {
    obs: Tensor,
    act: Tensor,
    next_obs: Tensor,
    reward: Vec<f32>,
    is_terminated: Vec<i8>,
}

fn batch_dim(t: &Tensor) -> usize {
    t.size().first().copied().unwrap_or(0) as usize
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
        check_batch_dim("obs", batch_size, batch_dim(&obs))?;
        check_batch_dim("act", batch_size, batch_dim(&act))?;
        check_batch_dim("next_obs", batch_size, batch_dim(&next_obs))?;
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
        let obs_dim = (obs.len() / batch_size) as i64;
        check_batch_dim("next_obs", obs.len(), next_obs.len())?;
        check_batch_dim("act", batch_size, act.len())?;

        Self::new(
            Tensor::from_slice(obs).reshape([batch_size as i64, obs_dim]),
            Tensor::from_slice(act),
            Tensor::from_slice(next_obs).reshape([batch_size as i64, obs_dim]),
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
