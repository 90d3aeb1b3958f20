//! Stochastic oscillator (%K / %D).
//!
//! raw %K = 100 * (close - lowest_low) / (highest_high - lowest_low) over `period_k`
//! %K = SMA(raw, smooth_k); %D = SMA(%K, smooth_d).
//! Lookback: period_k + smooth_k - 1 candles for the first %K.
//! Edge cases: zero high-low range → raw %K = 50.

use crate::components::indicator::{Indicator, IndicatorSeries};
use crate::domain::Candle;
use crate::indicators::series::sma_opt;

pub const KEYS: &[&str] = &["stoch_k", "stoch_d"];

#[derive(Debug, Clone)]
pub struct Stochastic {
    period_k: usize,
    smooth_k: usize,
    smooth_d: usize,
    name: String,
}

impl Stochastic {
    pub fn new(period_k: usize, smooth_k: usize, smooth_d: usize) -> Self {
        assert!(
            period_k >= 1 && smooth_k >= 1 && smooth_d >= 1,
            "Stochastic periods must be >= 1"
        );
        Self {
            period_k,
            smooth_k,
            smooth_d,
            name: format!("stoch_{period_k}_{smooth_k}_{smooth_d}"),
        }
    }
}

impl Indicator for Stochastic {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period_k + self.smooth_k - 1
    }

    fn keys(&self) -> &'static [&'static str] {
        KEYS
    }

    fn compute(&self, candles: &[Candle]) -> IndicatorSeries {
        let n = candles.len();
        if n < self.lookback() {
            return IndicatorSeries::unset(KEYS, n);
        }

        let mut raw = vec![None; n];
        for i in (self.period_k - 1)..n {
            let window = &candles[i + 1 - self.period_k..=i];
            let hh = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
            let ll = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
            let range = hh - ll;
            raw[i] = Some(if range == 0.0 {
                50.0
            } else {
                100.0 * (candles[i].close - ll) / range
            });
        }

        let k = sma_opt(&raw, self.smooth_k);
        let d = sma_opt(&k, self.smooth_d);

        let mut out = IndicatorSeries::new();
        out.insert(KEYS[0], k);
        out.insert(KEYS[1], d);
        out
    }
}
