//! Relative Strength Index (RSI).
//!
//! Simple (non-Wilder) averages of gains and losses over the last `length`
//! close-to-close changes.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: length + 1 candles.
//! Edge cases: avg_loss == 0 → RSI = 100 (including a flat window).

use crate::components::indicator::{Indicator, IndicatorSeries};
use crate::domain::Candle;

pub const KEYS: &[&str] = &["rsi"];

#[derive(Debug, Clone)]
pub struct Rsi {
    length: usize,
    name: String,
}

impl Rsi {
    pub fn new(length: usize) -> Self {
        assert!(length >= 1, "RSI length must be >= 1");
        Self {
            length,
            name: format!("rsi_{length}"),
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.length + 1
    }

    fn keys(&self) -> &'static [&'static str] {
        KEYS
    }

    fn compute(&self, candles: &[Candle]) -> IndicatorSeries {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let mut out = IndicatorSeries::new();
        out.insert(KEYS[0], rsi_of_series(&closes, self.length));
        out
    }
}

/// RSI of an arbitrary price series. Used by Stochastic RSI.
pub fn rsi_of_series(values: &[f64], length: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];

    if length == 0 || n < length + 1 {
        return result;
    }

    for i in length..n {
        let (mut gain, mut loss) = (0.0, 0.0);
        for j in (i + 1 - length)..=i {
            let change = values[j] - values[j - 1];
            if change > 0.0 {
                gain += change;
            } else {
                loss -= change;
            }
        }
        let avg_gain = gain / length as f64;
        let avg_loss = loss / length as f64;
        result[i] = Some(if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
        });
    }

    result
}
