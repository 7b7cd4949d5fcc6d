use anyhow::Result;
use qlearner_core::{
    error::QlearnError, td, CriticLoss, DqnConfig, Learner, LrScheduler, QPolicy,
    TransitionBatch,
};
use qlearner_tch_agent::{
    dqn::{DqnLearner, DqnPolicy, DqnPolicyConfig, EpsilonGreedy},
    mlp::{DuelingMlp, Mlp, MlpConfig},
    model::SubModel,
    TensorBatch,
};
use tch::{nn, Device, Kind, Tensor};
use tempdir::TempDir;

const OBS_DIM: usize = 4;
const N_ACTIONS: usize = 2;

fn policy_config() -> DqnPolicyConfig<MlpConfig> {
    DqnPolicyConfig::default()
        .q_config(MlpConfig::new(OBS_DIM as _, vec![16], N_ACTIONS as _))
        .explorer(EpsilonGreedy::with_final_step(100))
}

fn learner(config: DqnConfig) -> Result<DqnLearner<Mlp, TensorBatch>> {
    let policy = DqnPolicy::build(policy_config())?;
    DqnLearner::new(config, policy)
}

/// One-hot observations of four states; action 0 pays 1, action 1 pays -1.
/// All transitions are terminal.
fn bandit_batch() -> Result<TensorBatch> {
    let mut obs = vec![0f32; OBS_DIM * 8];
    let mut act = vec![];
    let mut reward = vec![];
    for i in 0..8 {
        obs[i * OBS_DIM + i % OBS_DIM] = 1.0;
        let a = (i / OBS_DIM) as i64;
        act.push(a);
        reward.push(if a == 0 { 1.0 } else { -1.0 });
    }
    TensorBatch::from_slices(&obs, &act, &obs, &reward, &[1; 8])
}

fn random_batch(batch_size: usize) -> Result<TensorBatch> {
    let obs = (0..batch_size * OBS_DIM)
        .map(|i| ((i * 7 % 11) as f32 - 5.0) / 5.0)
        .collect::<Vec<_>>();
    let next_obs = (0..batch_size * OBS_DIM)
        .map(|i| ((i * 3 % 13) as f32 - 6.0) / 6.0)
        .collect::<Vec<_>>();
    let act = (0..batch_size)
        .map(|i| (i % N_ACTIONS) as i64)
        .collect::<Vec<_>>();
    let reward = (0..batch_size)
        .map(|i| i as f32 * 0.1 - 0.2)
        .collect::<Vec<_>>();
    let is_terminated = (0..batch_size)
        .map(|i| (i % 3 == 0) as i8)
        .collect::<Vec<_>>();
    TensorBatch::from_slices(&obs, &act, &next_obs, &reward, &is_terminated)
}

fn flat(t: &Tensor) -> Result<Vec<f32>> {
    Ok(Vec::<f32>::try_from(
        t.detach().to_kind(Kind::Float).flatten(0, -1),
    )?)
}

fn assert_close(xs: &[f32], ys: &[f32]) {
    assert_eq!(xs.len(), ys.len());
    for (x, y) in xs.iter().zip(ys.iter()) {
        assert!((x - y).abs() < 1e-5, "{} != {}", x, y);
    }
}

#[test]
fn test_td_target_matches_reference() -> Result<()> {
    let gamma = 0.9;
    let learner = learner(DqnConfig::default().gamma(gamma))?;
    let (obs, act, next_obs, reward, is_terminated) = random_batch(6)?.unpack();

    let q_tgt = flat(&learner.policy().forward_target(&next_obs)?)?;
    let expected = td::td_target(
        &reward,
        &is_terminated,
        &td::max_q(&q_tgt, N_ACTIONS),
        gamma as f32,
    )?;
    let actual = flat(&learner.td_target(&next_obs, &reward, &is_terminated)?)?;
    assert_close(&actual, &expected);

    let q = flat(&learner.policy().forward(&obs)?)?;
    let expected = td::select_q(&q, N_ACTIONS, &Vec::<i64>::try_from(&act)?)?;
    let actual = flat(&learner.predict_q(&obs, &act)?)?;
    assert_close(&actual, &expected);
    Ok(())
}

#[test]
fn test_double_dqn_target_matches_reference() -> Result<()> {
    let gamma = 0.99;
    let mut learner = learner(DqnConfig::default().gamma(gamma).double_dqn(true))?;
    // Move the online network away from the target network.
    for _ in 0..3 {
        learner.update(random_batch(6)?)?;
    }
    let (_, _, next_obs, reward, is_terminated) = random_batch(6)?.unpack();

    let q = flat(&learner.policy().forward(&next_obs)?)?;
    let q_tgt = flat(&learner.policy().forward_target(&next_obs)?)?;
    let next_q = td::select_q(&q_tgt, N_ACTIONS, &td::argmax_q(&q, N_ACTIONS))?;
    let expected = td::td_target(&reward, &is_terminated, &next_q, gamma as f32)?;
    let actual = flat(&learner.td_target(&next_obs, &reward, &is_terminated)?)?;
    assert_close(&actual, &expected);
    Ok(())
}

#[test]
fn test_update_record() -> Result<()> {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut learner = learner(DqnConfig::default().learning_rate(1e-3))?;
    let record = learner.update(random_batch(8)?)?;

    assert_eq!(learner.iterations(), 1);
    assert!(record.get_scalar("Qloss")?.is_finite());
    assert!(record.get_scalar("predictQ")?.is_finite());
    assert!((record.get_scalar("learning_rate")? - 1e-3).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_loss_decreases() -> Result<()> {
    let mut learner = learner(DqnConfig::default().learning_rate(1e-2).sync_frequency(10))?;
    let first = learner.update(bandit_batch()?)?.get_scalar("Qloss")?;
    let mut last = first;
    for _ in 0..300 {
        last = learner.update(bandit_batch()?)?.get_scalar("Qloss")?;
    }
    assert!(last < first * 0.2, "first = {}, last = {}", first, last);
    Ok(())
}

#[test]
fn test_hard_sync_frequency() -> Result<()> {
    let mut learner = learner(DqnConfig::default().learning_rate(1e-2).sync_frequency(3))?;
    let (obs, ..) = random_batch(5)?.unpack();
    let same = |learner: &DqnLearner<Mlp, TensorBatch>| -> Result<bool> {
        let q = flat(&learner.policy().forward(&obs)?)?;
        let q_tgt = flat(&learner.policy().forward_target(&obs)?)?;
        Ok(q.iter().zip(q_tgt.iter()).all(|(x, y)| (x - y).abs() < 1e-6))
    };

    assert!(same(&learner)?);
    learner.update(random_batch(5)?)?;
    assert!(!same(&learner)?);
    learner.update(random_batch(5)?)?;
    assert!(!same(&learner)?);
    learner.update(random_batch(5)?)?;
    assert!(same(&learner)?);
    Ok(())
}

#[test]
fn test_soft_sync() -> Result<()> {
    let mut learner = learner(
        DqnConfig::default()
            .learning_rate(1e-2)
            .sync_frequency(1)
            .tau(Some(0.5)),
    )?;
    let (obs, ..) = random_batch(5)?.unpack();
    let q_tgt_before = flat(&learner.policy().forward_target(&obs)?)?;
    learner.update(random_batch(5)?)?;
    let q = flat(&learner.policy().forward(&obs)?)?;
    let q_tgt = flat(&learner.policy().forward_target(&obs)?)?;

    assert!(q_tgt
        .iter()
        .zip(q_tgt_before.iter())
        .any(|(x, y)| (x - y).abs() > 1e-7));
    assert!(q.iter().zip(q_tgt.iter()).any(|(x, y)| (x - y).abs() > 1e-7));
    Ok(())
}

#[test]
fn test_linear_lr_schedule() -> Result<()> {
    let mut learner = learner(DqnConfig::default().learning_rate(1.0e-2).lr_scheduler(
        LrScheduler::Linear {
            start_factor: 1.0,
            end_factor: 0.5,
            total_iters: 2,
        },
    ))?;
    let lrs = (0..4)
        .map(|_| Ok(learner.update(random_batch(4)?)?.get_scalar("learning_rate")?))
        .collect::<Result<Vec<_>>>()?;
    assert_close(&lrs, &[1.0e-2, 0.75e-2, 0.5e-2, 0.5e-2]);
    assert!((learner.learning_rate() - 0.5e-2).abs() < 1e-9);
    Ok(())
}

#[test]
fn test_smooth_l1_loss_matches_reference() -> Result<()> {
    let gamma = 0.9;
    let mut learner = learner(
        DqnConfig::default()
            .gamma(gamma)
            .critic_loss(CriticLoss::SmoothL1),
    )?;
    let (obs, act, next_obs, reward, is_terminated) = random_batch(6)?.unpack();

    let q = flat(&learner.policy().forward(&obs)?)?;
    let pred = td::select_q(&q, N_ACTIONS, &Vec::<i64>::try_from(&act)?)?;
    let q_tgt = flat(&learner.policy().forward_target(&next_obs)?)?;
    let tgt = td::td_target(
        &reward,
        &is_terminated,
        &td::max_q(&q_tgt, N_ACTIONS),
        gamma as f32,
    )?;
    let expected = td::smooth_l1(&pred, &tgt)?;

    let loss = learner.update(random_batch(6)?)?.get_scalar("Qloss")?;
    assert!((loss - expected).abs() < 1e-5, "{} != {}", loss, expected);
    Ok(())
}

#[test]
fn test_action_out_of_range() -> Result<()> {
    let mut learner = learner(DqnConfig::default().sync_frequency(1))?;
    let obs = vec![0.5f32; OBS_DIM * 2];
    let batch = TensorBatch::from_slices(&obs, &[0, 5], &obs, &[1.0, 1.0], &[0, 0])?;

    let err = learner.update(batch).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<QlearnError>(),
        Some(QlearnError::ActionIndexError {
            index: 5,
            n_actions: N_ACTIONS
        })
    ));
    // A failed update does not count.
    assert_eq!(learner.iterations(), 0);

    learner.update(random_batch(4)?)?;
    assert_eq!(learner.iterations(), 1);
    Ok(())
}

#[test]
fn test_invalid_config() {
    assert!(learner(DqnConfig::default().sync_frequency(0)).is_err());
}

#[test]
fn test_dueling_mlp() -> Result<()> {
    let vs = nn::VarStore::new(Device::Cpu);
    let model = DuelingMlp::build(&vs, MlpConfig::new(OBS_DIM as _, vec![8, 8], 3));
    let (obs, ..) = random_batch(5)?.unpack();

    let q = model.forward(&obs);
    let (v, a) = model.value_advantage(&obs);
    assert_eq!(q.size(), vec![5, 3]);
    assert_eq!(v.size(), vec![5, 1]);
    assert_eq!(a.size(), vec![5, 3]);

    // The advantages are centered, so the mean of Q over actions is V.
    let q_mean = flat(&q.mean_dim(&[1i64][..], true, Kind::Float))?;
    assert_close(&q_mean, &flat(&v)?);
    Ok(())
}

#[test]
fn test_dueling_learner() -> Result<()> {
    let config = DqnPolicyConfig::default()
        .q_config(MlpConfig::new(OBS_DIM as _, vec![16], N_ACTIONS as _));
    let policy = DqnPolicy::<DuelingMlp>::build(config)?;
    let mut learner: DqnLearner<DuelingMlp, TensorBatch> =
        DqnLearner::new(DqnConfig::default().learning_rate(1e-2), policy)?;
    let first = learner.update(bandit_batch()?)?.get_scalar("Qloss")?;
    let mut last = first;
    for _ in 0..300 {
        last = learner.update(bandit_batch()?)?.get_scalar("Qloss")?;
    }
    assert!(last < first * 0.2, "first = {}, last = {}", first, last);
    Ok(())
}

#[test]
fn test_save_and_load() -> Result<()> {
    let mut learner = learner(DqnConfig::default().learning_rate(1e-2))?;
    for _ in 0..2 {
        learner.update(random_batch(4)?)?;
    }
    let policy = learner.into_policy();
    let dir = TempDir::new("dqn_tch")?;
    policy.save(dir.path())?;

    let mut policy_ = DqnPolicy::<Mlp>::build(policy_config().seed(7))?;
    policy_.load(dir.path())?;

    let (obs, ..) = random_batch(4)?.unpack();
    assert_close(&flat(&policy.forward(&obs)?)?, &flat(&policy_.forward(&obs)?)?);
    assert_close(
        &flat(&policy.forward_target(&obs)?)?,
        &flat(&policy_.forward_target(&obs)?)?,
    );
    Ok(())
}

#[test]
fn test_sample() -> Result<()> {
    let mut policy = DqnPolicy::<Mlp>::build(policy_config())?;
    let (obs, ..) = random_batch(3)?.unpack();
    let greedy = Vec::<i64>::try_from(policy.sample(&obs, false))?;
    let q = flat(&policy.forward(&obs)?)?;
    assert_eq!(greedy, td::argmax_q(&q, N_ACTIONS));

    let a = Vec::<i64>::try_from(policy.sample(&obs, true))?;
    assert_eq!(a.len(), 3);
    assert!(a.iter().all(|&a| (0..N_ACTIONS as i64).contains(&a)));
    assert_eq!(policy.action_dim(), N_ACTIONS);
    Ok(())
}
