use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use rayon::prelude::*;
use tracing::info;

use crate::engine::{indicators, metrics, strategy};
use crate::errors::AppError;
use crate::models::bar::Bar;
use crate::models::params::StrategyParams;

/// All grid combinations in the canonical order: lookback outer, buy
/// threshold middle, sell threshold inner. Infeasible combinations
/// (buy >= sell) are skipped here rather than surfaced as errors.
fn grid_combinations() -> Vec<StrategyParams> {
    let mut combos = Vec::new();
    for lookback in (14..100).step_by(2) {
        for buy in (20..45).step_by(5) {
            for sell in (60..85).step_by(5) {
                if buy >= sell {
                    continue;
                }
                combos.push(StrategyParams::new(lookback, buy as f64, sell as f64));
            }
        }
    }
    combos
}

/// Exhaustive grid search over the RSI parameter space, scored by the
/// annualized Sharpe-style ratio of the cumulative strategy returns.
///
/// The default (14, 30, 70) holds at score 0.0, so a market where no
/// combination beats "no edge" keeps the default. Ties keep the earliest
/// combination in grid order; the parallel evaluation cannot perturb
/// that because selection runs over the ordered score list afterwards.
pub fn optimize(bars: &[Bar]) -> Result<StrategyParams, AppError> {
    if bars.is_empty() {
        return Err(AppError::EmptySeries);
    }

    let combos = grid_combinations();
    info!(
        "Grid search: {} combinations over {} bars",
        combos.len(),
        bars.len()
    );
    let start = Instant::now();

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    // Each of the 43 lookbacks computes RSI once across all threshold
    // combinations.
    let rsi_cache: DashMap<usize, Arc<Vec<f64>>> = DashMap::new();

    let scores: Vec<f64> = combos
        .par_iter()
        .map(|params| {
            let rsi = rsi_cache
                .entry(params.lookback)
                .or_insert_with(|| Arc::new(indicators::rsi(&closes, params.lookback)))
                .clone();
            let curves = strategy::simulate_prepared(
                bars,
                &rsi,
                params.buy_threshold,
                params.sell_threshold,
            );
            metrics::sharpe_ratio(&curves.strategy, metrics::PERIODS_PER_YEAR)
        })
        .collect();

    let mut best = StrategyParams::default();
    let mut best_score = 0.0f64;
    for (params, &score) in combos.iter().zip(scores.iter()) {
        if score > best_score {
            best_score = score;
            best = *params;
        }
    }

    info!(
        "Grid search complete: best Sharpe {:.4} with {} in {:.1}s",
        best_score,
        best,
        start.elapsed().as_secs_f64()
    );
    Ok(best)
}
