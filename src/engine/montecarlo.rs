use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::engine::{metrics, optimizer, permute, strategy};
use crate::errors::AppError;
use crate::models::bar::Bar;
use crate::models::params::StrategyParams;
use crate::models::result::MonteCarloReport;

/// Configuration for a Monte Carlo permutation test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloConfig {
    /// Number of permutation trials.
    pub trials: usize,
    /// Restart probability of the stationary bootstrap.
    pub probability: f64,
    /// Bars up to and including this index are never resampled.
    pub start_index: usize,
    /// Master seed. `None` draws from OS entropy and forfeits
    /// reproducibility.
    pub seed: Option<u64>,
    /// Re-run the grid search on every permuted series instead of
    /// scoring the fixed input parameters. Prices in the selection bias
    /// of having optimized on the real data.
    pub optimize_each: bool,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        MonteCarloConfig {
            trials: 100,
            probability: 0.1,
            start_index: 0,
            seed: None,
            optimize_each: false,
        }
    }
}

impl MonteCarloConfig {
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_optimize_each(mut self, enabled: bool) -> Self {
        self.optimize_each = enabled;
        self
    }
}

/// Run the full permutation test: score the strategy on the real series,
/// build a null distribution of the same score over `trials` permuted
/// histories, and locate the real result inside that distribution.
///
/// Each trial gets its own seed drawn up front from one master
/// generator, so the trials can run in parallel and a seeded run is
/// reproducible regardless of scheduling.
pub fn run_permutation_test(
    bars: &[Bar],
    params: &StrategyParams,
    config: &MonteCarloConfig,
) -> Result<MonteCarloReport, AppError> {
    params.validate()?;
    permute::validate_args(bars, config.probability, config.start_index)?;
    if config.trials == 0 {
        return Err(AppError::InvalidTrialCount(config.trials));
    }

    let real_curves = strategy::simulate(bars, params)?;
    let real_score = metrics::sharpe_ratio(&real_curves.strategy, metrics::PERIODS_PER_YEAR);
    let real_total_return = real_curves.total_strategy_return();

    info!(
        "Permutation test: {} trials, p={}, start_index={}, optimize_each={}",
        config.trials, config.probability, config.start_index, config.optimize_each
    );

    let mut master = match config.seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    };
    let trial_seeds: Vec<u64> = (0..config.trials).map(|_| master.gen()).collect();

    let mut null_scores: Vec<f64> = trial_seeds
        .par_iter()
        .enumerate()
        .map(|(trial, &trial_seed)| {
            match run_trial(bars, params, config, trial_seed) {
                Ok(score) => Some(score),
                Err(err) => {
                    warn!("Trial {} dropped: {}", trial, err);
                    None
                }
            }
        })
        .collect::<Vec<Option<f64>>>()
        .into_iter()
        .flatten()
        .collect();

    null_scores.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let completed = null_scores.len();

    let at_or_above = null_scores.iter().filter(|&&s| s >= real_score).count();
    let p_value = (1 + at_or_above) as f64 / (1 + completed) as f64;
    let percentile_rank = metrics::percentile_rank(&null_scores, real_score);

    let null_mean = if completed > 0 {
        null_scores.iter().sum::<f64>() / completed as f64
    } else {
        0.0
    };
    let null_median = if completed > 0 {
        null_scores[(completed - 1) / 2]
    } else {
        0.0
    };

    info!(
        "Permutation test complete: {}/{} trials, real score {:.4}, p-value {:.4}",
        completed, config.trials, real_score, p_value
    );

    Ok(MonteCarloReport {
        trials_requested: config.trials,
        trials_completed: completed,
        params: *params,
        real_score,
        real_total_return,
        p_value,
        percentile_rank,
        null_mean,
        null_median,
        null_scores,
    })
}

/// One trial: permute, optionally re-optimize, simulate, score.
fn run_trial(
    bars: &[Bar],
    params: &StrategyParams,
    config: &MonteCarloConfig,
    trial_seed: u64,
) -> Result<f64, AppError> {
    let permuted = permute::permute(bars, config.probability, config.start_index, Some(trial_seed))?;
    let trial_params = if config.optimize_each {
        optimizer::optimize(&permuted)?
    } else {
        *params
    };
    let curves = strategy::simulate(&permuted, &trial_params)?;
    Ok(metrics::sharpe_ratio(
        &curves.strategy,
        metrics::PERIODS_PER_YEAR,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bars(n: usize) -> Vec<Bar> {
        let mut bars = Vec::with_capacity(n);
        let mut close = 100.0f64;
        for i in 0..n {
            let drift = (((i * 13 + 5) % 17) as f64 - 8.0) / 200.0;
            let open = close;
            close = (open * (1.0 + drift)).max(1.0);
            bars.push(Bar {
                datetime: format!("2024-01-01 {:02}:{:02}", i / 60, i % 60),
                open,
                high: open.max(close) * 1.003,
                low: open.min(close) * 0.997,
                close,
            });
        }
        bars
    }

    #[test]
    fn test_seeded_test_is_reproducible() {
        let bars = make_bars(80);
        let params = StrategyParams::new(5, 30.0, 70.0);
        let config = MonteCarloConfig::default().with_trials(20).with_seed(9);

        let a = run_permutation_test(&bars, &params, &config).unwrap();
        let b = run_permutation_test(&bars, &params, &config).unwrap();
        assert_eq!(a.p_value, b.p_value);
        assert_eq!(a.null_scores, b.null_scores);
    }

    #[test]
    fn test_report_shape() {
        let bars = make_bars(60);
        let params = StrategyParams::new(5, 30.0, 70.0);
        let config = MonteCarloConfig::default().with_trials(15).with_seed(1);

        let report = run_permutation_test(&bars, &params, &config).unwrap();
        assert_eq!(report.trials_requested, 15);
        assert_eq!(report.trials_completed, 15);
        assert_eq!(report.null_scores.len(), 15);
        assert!(report.p_value > 0.0 && report.p_value <= 1.0);
        assert!((0.0..=1.0).contains(&report.percentile_rank));
        // Sorted ascending
        for w in report.null_scores.windows(2) {
            assert!(w[0] <= w[1]);
        }
    }

    #[test]
    fn test_flat_strategy_is_indistinguishable_from_chance() {
        // A strict uptrend permutes into other strict uptrends (the
        // delta pool is all gains): the rule never enters, every score
        // is 0, and the real result sits at p-value 1.
        let closes: Vec<f64> = (0..50).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let bars: Vec<Bar> = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                datetime: format!("2024-02-{:02}", i % 28 + 1),
                open: c,
                high: c * 1.001,
                low: c * 0.999,
                close: c,
            })
            .collect();
        let params = StrategyParams::new(14, 30.0, 70.0);
        let config = MonteCarloConfig::default().with_trials(10).with_seed(4);

        let report = run_permutation_test(&bars, &params, &config).unwrap();
        assert_eq!(report.real_score, 0.0);
        assert!(report.null_scores.iter().all(|&s| s == 0.0));
        assert_eq!(report.p_value, 1.0);
        assert_eq!(report.percentile_rank, 0.0);
    }

    #[test]
    fn test_rejects_zero_trials() {
        let bars = make_bars(30);
        let config = MonteCarloConfig::default().with_trials(0);
        assert!(matches!(
            run_permutation_test(&bars, &StrategyParams::default(), &config),
            Err(AppError::InvalidTrialCount(0))
        ));
    }

    #[test]
    fn test_rejects_bad_permutation_args() {
        let bars = make_bars(30);
        let mut config = MonteCarloConfig::default().with_trials(5);
        config.probability = 0.0;
        assert!(matches!(
            run_permutation_test(&bars, &StrategyParams::default(), &config),
            Err(AppError::InvalidProbability(_))
        ));

        let mut config = MonteCarloConfig::default().with_trials(5);
        config.start_index = 29;
        assert!(matches!(
            run_permutation_test(&bars, &StrategyParams::default(), &config),
            Err(AppError::NoResamplePool { .. })
        ));
    }

    #[test]
    fn test_optimize_each_runs() {
        let bars = make_bars(60);
        let params = StrategyParams::default();
        let config = MonteCarloConfig::default()
            .with_trials(2)
            .with_seed(7)
            .with_optimize_each(true);

        let report = run_permutation_test(&bars, &params, &config).unwrap();
        assert_eq!(report.trials_completed, 2);
    }
}
