use crate::engine::indicators;
use crate::errors::AppError;
use crate::models::bar::Bar;
use crate::models::params::StrategyParams;
use crate::models::result::ReturnCurves;

/// Simulate the RSI rule over `bars`: long below the buy threshold,
/// flat above the sell threshold, forward-filled in between.
///
/// Returns the cumulative strategy and buy-and-hold log-return curves,
/// aligned from the second bar onward.
pub fn simulate(bars: &[Bar], params: &StrategyParams) -> Result<ReturnCurves, AppError> {
    if bars.is_empty() {
        return Err(AppError::EmptySeries);
    }
    params.validate()?;

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let rsi = indicators::rsi(&closes, params.lookback);
    Ok(simulate_prepared(
        bars,
        &rsi,
        params.buy_threshold,
        params.sell_threshold,
    ))
}

/// Simulation body over a precomputed indicator series. The grid search
/// calls this directly so each lookback computes RSI once.
pub(crate) fn simulate_prepared(
    bars: &[Bar],
    rsi: &[f64],
    buy_threshold: f64,
    sell_threshold: f64,
) -> ReturnCurves {
    let resolved = resolve_positions(rsi, buy_threshold, sell_threshold);

    let n = bars.len();
    let mut timestamps = Vec::with_capacity(n.saturating_sub(1));
    let mut strategy = Vec::with_capacity(n.saturating_sub(1));
    let mut buy_hold = Vec::with_capacity(n.saturating_sub(1));

    let mut cum_strategy = 0.0f64;
    let mut cum_asset = 0.0f64;

    for i in 1..n {
        let log_return = (bars[i].close / bars[i - 1].close).ln();
        // Position applying at bar i was decided from bar i-1, which in
        // turn carries the signal resolved through bar i-2. The return
        // of bar i is therefore credited to the signal two bars back.
        let position = if i >= 2 { resolved[i - 2] } else { 0.0 };

        cum_asset += log_return;
        cum_strategy += log_return * position;

        timestamps.push(bars[i].datetime.clone());
        strategy.push(cum_strategy);
        buy_hold.push(cum_asset);
    }

    ReturnCurves {
        timestamps,
        strategy,
        buy_hold,
    }
}

/// Resolve the three-valued raw signal into a running position series:
/// RSI below the buy threshold enters long (1), above the sell threshold
/// exits flat (0), anything else — including the NaN warm-up — carries
/// the previous value. Flat before the first defined signal.
fn resolve_positions(rsi: &[f64], buy_threshold: f64, sell_threshold: f64) -> Vec<f64> {
    let mut resolved = Vec::with_capacity(rsi.len());
    let mut held = 0.0f64;
    for &value in rsi {
        if !value.is_nan() {
            if value < buy_threshold {
                held = 1.0;
            } else if value > sell_threshold {
                held = 0.0;
            }
        }
        resolved.push(held);
    }
    resolved
}
