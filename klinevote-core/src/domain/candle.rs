//! Candle: the fundamental market data unit.

use serde::{Deserialize, Serialize};

/// OHLCV candle for one period of one timeframe.
///
/// Times are epoch milliseconds. A fetched sequence is ordered oldest first
/// and its last element is the candle that is still forming; analysis always
/// reads the second-to-last element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub close_time: i64,
}

impl Candle {
    /// Median price, `(high + low) / 2`.
    pub fn median(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    /// Returns true if any price field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.close_time >= self.open_time
    }
}

/// The last completed candle of a fetched sequence (second-to-last element).
pub fn last_completed(candles: &[Candle]) -> Option<&Candle> {
    candles.len().checked_sub(2).and_then(|i| candles.get(i))
}
