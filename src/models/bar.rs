use serde::{Deserialize, Serialize};

/// A single OHLC bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bar {
    pub datetime: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}
