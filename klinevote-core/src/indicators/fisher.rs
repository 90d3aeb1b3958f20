//! Fisher Transform.
//!
//! Median price `(high + low) / 2` is normalized into [-1, 1] against its
//! rolling min/max over `length`, clamped to ±0.999, smoothed with
//! `v = 0.33 * x + 0.67 * v_prev`, clamped again, then transformed:
//! Fisher = 0.5 * ln((1 + v) / (1 - v)).
//! Trigger at index t is Fisher at t-1.
//! Lookback: length candles (trigger starts one later).
//! Edge cases: zero median range → normalized value 0.

use crate::components::indicator::{Indicator, IndicatorSeries};
use crate::domain::Candle;
use crate::indicators::series::window_min_max;

pub const KEYS: &[&str] = &["fisher", "fisher_trigger"];

const CLAMP: f64 = 0.999;
const SMOOTHING: f64 = 0.33;

#[derive(Debug, Clone)]
pub struct FisherTransform {
    length: usize,
    name: String,
}

impl FisherTransform {
    pub fn new(length: usize) -> Self {
        assert!(length >= 1, "Fisher length must be >= 1");
        Self {
            length,
            name: format!("fisher_{length}"),
        }
    }
}

impl Indicator for FisherTransform {
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
        if n < self.length {
            return IndicatorSeries::unset(KEYS, n);
        }

        let median: Vec<f64> = candles.iter().map(Candle::median).collect();
        let mut fisher = vec![None; n];
        let mut trigger = vec![None; n];

        let mut prev_value = 0.0;
        for i in (self.length - 1)..n {
            let (lo, hi) = window_min_max(&median, i, self.length);
            let range = hi - lo;
            let raw = if range == 0.0 {
                0.0
            } else {
                2.0 * ((median[i] - lo) / range - 0.5)
            };
            let raw = raw.clamp(-CLAMP, CLAMP);
            let value = (SMOOTHING * raw + (1.0 - SMOOTHING) * prev_value).clamp(-CLAMP, CLAMP);
            prev_value = value;

            fisher[i] = Some(0.5 * ((1.0 + value) / (1.0 - value)).ln());
            trigger[i] = i.checked_sub(1).and_then(|prev| fisher[prev]);
        }

        let mut out = IndicatorSeries::new();
        out.insert(KEYS[0], fisher);
        out.insert(KEYS[1], trigger);
        out
    }
}
