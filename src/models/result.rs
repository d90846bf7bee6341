use serde::{Deserialize, Serialize};

use crate::models::params::StrategyParams;

/// The two aligned cumulative log-return sequences produced by a
/// simulation run. Index 0 corresponds to the second bar of the input
/// series (the first bar has no prior close to compute a return from).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnCurves {
    pub timestamps: Vec<String>,
    /// Running sum of lagged strategy log returns.
    pub strategy: Vec<f64>,
    /// Running sum of raw asset log returns (buy-and-hold).
    pub buy_hold: Vec<f64>,
}

impl ReturnCurves {
    pub fn len(&self) -> usize {
        self.strategy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategy.is_empty()
    }

    /// Final cumulative strategy log return, 0.0 for an empty curve.
    pub fn total_strategy_return(&self) -> f64 {
        self.strategy.last().copied().unwrap_or(0.0)
    }

    /// Final cumulative buy-and-hold log return, 0.0 for an empty curve.
    pub fn total_buy_hold_return(&self) -> f64 {
        self.buy_hold.last().copied().unwrap_or(0.0)
    }
}

/// Outcome of a Monte Carlo permutation test: the real-data score
/// against the null distribution built from permuted histories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonteCarloReport {
    pub trials_requested: usize,
    /// Trials that produced a score. May be below `trials_requested`
    /// when a permuted series fails to simulate.
    pub trials_completed: usize,
    pub params: StrategyParams,
    /// Sharpe-style score of the strategy on the real series.
    pub real_score: f64,
    /// Total strategy log return on the real series.
    pub real_total_return: f64,
    /// Add-one estimate: (1 + #{null >= real}) / (1 + completed).
    pub p_value: f64,
    /// Fraction of the null distribution strictly below the real score.
    pub percentile_rank: f64,
    pub null_mean: f64,
    pub null_median: f64,
    /// Scores of all completed trials, sorted ascending.
    pub null_scores: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_totals_on_empty_curves() {
        let curves = ReturnCurves {
            timestamps: vec![],
            strategy: vec![],
            buy_hold: vec![],
        };
        assert!(curves.is_empty());
        assert_eq!(curves.total_strategy_return(), 0.0);
        assert_eq!(curves.total_buy_hold_return(), 0.0);
    }

    #[test]
    fn test_totals_take_last_element() {
        let curves = ReturnCurves {
            timestamps: vec!["a".into(), "b".into(), "c".into()],
            strategy: vec![0.01, 0.03, 0.02],
            buy_hold: vec![0.02, 0.05, 0.07],
        };
        assert_eq!(curves.len(), 3);
        assert_eq!(curves.total_strategy_return(), 0.02);
        assert_eq!(curves.total_buy_hold_return(), 0.07);
    }
}
