//! Williams %R.
//!
//! %R = (highest_high - close) / (highest_high - lowest_low) * -100 over `length`.
//! Lookback: length candles. Range [-100, 0].
//! Edge cases: zero range → -50.

use crate::components::indicator::{Indicator, IndicatorSeries};
use crate::domain::Candle;

pub const KEYS: &[&str] = &["williams_r"];

#[derive(Debug, Clone)]
pub struct WilliamsR {
    length: usize,
    name: String,
}

impl WilliamsR {
    pub fn new(length: usize) -> Self {
        assert!(length >= 1, "Williams %R length must be >= 1");
        Self {
            length,
            name: format!("williams_r_{length}"),
        }
    }
}

impl Indicator for WilliamsR {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.length
    }

    fn keys(&self) -> &'static [&'static str] {
        KEYS
    }

    fn compute(&self, candles: &[Candle]) -> IndicatorSeries {
        let n = candles.len();
        let mut result = vec![None; n];

        if n >= self.length {
            for i in (self.length - 1)..n {
                let window = &candles[i + 1 - self.length..=i];
                let hh = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
                let ll = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
                let range = hh - ll;
                result[i] = Some(if range == 0.0 {
                    -50.0
                } else {
                    (hh - candles[i].close) / range * -100.0
                });
            }
        }

        let mut out = IndicatorSeries::new();
        out.insert(KEYS[0], result);
        out
    }
}
