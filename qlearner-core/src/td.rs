//! Temporal-difference math on plain slices.
//!
//! Q-values are given row-major with shape `[batch_size, action_dim]`.
//! Backends do the same computation on tensors; these functions are the
//! reference they are checked against.
use crate::{check_action_index, check_batch_dim, error::QlearnError};

/// Returns `Q(o_i, a_i)` for each row `i`.
pub fn select_q(q: &[f32], action_dim: usize, act: &[i64]) -> Result<Vec<f32>, QlearnError> {
    check_batch_dim("q", act.len() * action_dim, q.len())?;
    check_action_index(act, action_dim)?;
    if act.is_empty() {
        return Ok(vec![]);
    }
    Ok(act
        .iter()
        .zip(q.chunks(action_dim))
        .map(|(&a, row)| row[a as usize])
        .collect())
}

/// Returns `max_a Q(o_i, a)` for each row `i`.
///
/// Empty if `action_dim` is zero.
pub fn max_q(q: &[f32], action_dim: usize) -> Vec<f32> {
    if action_dim == 0 {
        return vec![];
    }
    q.chunks(action_dim)
        .map(|row| row.iter().copied().fold(f32::NEG_INFINITY, f32::max))
        .collect()
}

/// Returns `argmax_a Q(o_i, a)` for each row `i`.
///
/// Ties resolve to the lowest index. Empty if `action_dim` is zero.
pub fn argmax_q(q: &[f32], action_dim: usize) -> Vec<i64> {
    if action_dim == 0 {
        return vec![];
    }
    q.chunks(action_dim)
        .map(|row| {
            let mut best = 0;
            for (i, v) in row.iter().enumerate() {
                if *v > row[best] {
                    best = i;
                }
            }
            best as i64
        })
        .collect()
}

/// Returns `r_i + gamma * (1 - terminal_i) * next_q_i` for each row `i`.
pub fn td_target(
    reward: &[f32],
    is_terminated: &[i8],
    next_q: &[f32],
    gamma: f32,
) -> Result<Vec<f32>, QlearnError> {
    check_batch_dim("is_terminated", reward.len(), is_terminated.len())?;
    check_batch_dim("next_q", reward.len(), next_q.len())?;
    Ok(reward
        .iter()
        .zip(is_terminated.iter())
        .zip(next_q.iter())
        .map(|((r, d), q)| r + gamma * (1 - *d) as f32 * q)
        .collect())
}

/// Mean squared error.
pub fn mse(pred: &[f32], tgt: &[f32]) -> Result<f32, QlearnError> {
    check_batch_dim("tgt", pred.len(), tgt.len())?;
    let n = pred.len() as f32;
    Ok(pred
        .iter()
        .zip(tgt.iter())
        .map(|(p, t)| (p - t) * (p - t))
        .sum::<f32>()
        / n)
}

/// Smooth L1 loss with threshold 1, averaged over the batch.
pub fn smooth_l1(pred: &[f32], tgt: &[f32]) -> Result<f32, QlearnError> {
    check_batch_dim("tgt", pred.len(), tgt.len())?;
    let n = pred.len() as f32;
    Ok(pred
        .iter()
        .zip(tgt.iter())
        .map(|(p, t)| {
            let d = (p - t).abs();
            if d < 1.0 {
                0.5 * d * d
            } else {
                d - 0.5
            }
        })
        .sum::<f32>()
        / n)
}
