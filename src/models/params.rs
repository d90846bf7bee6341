use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// RSI strategy parameters: the indicator window and the two
/// threshold levels that trigger entries and exits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrategyParams {
    /// RSI window length in bars.
    pub lookback: usize,
    /// Enter long when RSI drops below this level.
    pub buy_threshold: f64,
    /// Exit to flat when RSI rises above this level.
    pub sell_threshold: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            lookback: 14,
            buy_threshold: 30.0,
            sell_threshold: 70.0,
        }
    }
}

impl StrategyParams {
    pub fn new(lookback: usize, buy_threshold: f64, sell_threshold: f64) -> Self {
        StrategyParams {
            lookback,
            buy_threshold,
            sell_threshold,
        }
    }

    /// Reject parameter sets the simulator cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.lookback < 1 {
            return Err(AppError::InvalidLookback(self.lookback));
        }
        if self.buy_threshold >= self.sell_threshold {
            return Err(AppError::InvalidThresholds {
                buy: self.buy_threshold,
                sell: self.sell_threshold,
            });
        }
        Ok(())
    }
}

impl std::fmt::Display for StrategyParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "L:{} | Buy:{} | Sell:{}",
            self.lookback, self.buy_threshold, self.sell_threshold
        )
    }
}
