//! Moving Average Convergence Divergence (MACD).
//!
//! MACD = EMA(close, fast) - EMA(close, slow)
//! Signal = EMA(MACD, signal), seeded on the first `signal` MACD values.
//! Histogram = MACD - Signal.
//! Lookback: slow candles for the first MACD value.

use crate::components::indicator::{Indicator, IndicatorSeries};
use crate::domain::Candle;
use crate::indicators::series::{ema, ema_opt};

pub const KEYS: &[&str] = &["macd", "macd_signal", "macd_histogram"];

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(
            fast >= 1 && slow >= 1 && signal >= 1,
            "MACD periods must be >= 1"
        );
        Self {
            fast,
            slow,
            signal,
            name: format!("macd_{fast}_{slow}_{signal}"),
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.fast.max(self.slow)
    }

    fn keys(&self) -> &'static [&'static str] {
        KEYS
    }

    fn compute(&self, candles: &[Candle]) -> IndicatorSeries {
        let n = candles.len();
        if n < self.lookback() {
            return IndicatorSeries::unset(KEYS, n);
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let fast = ema(&closes, self.fast);
        let slow = ema(&closes, self.slow);

        let line: Vec<Option<f64>> = fast
            .iter()
            .zip(&slow)
            .map(|(f, s)| Some((*f)? - (*s)?))
            .collect();
        let signal = ema_opt(&line, self.signal);
        let histogram: Vec<Option<f64>> = line
            .iter()
            .zip(&signal)
            .map(|(m, s)| Some((*m)? - (*s)?))
            .collect();

        let mut out = IndicatorSeries::new();
        out.insert(KEYS[0], line);
        out.insert(KEYS[1], signal);
        out.insert(KEYS[2], histogram);
        out
    }
}
