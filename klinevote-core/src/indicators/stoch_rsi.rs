//! Stochastic RSI.
//!
//! RSI(close, length_rsi) fed through a min/max stochastic over the last
//! `length_stoch` RSI values, then smoothed:
//! %K = SMA(raw, smooth_k); %D = SMA(%K, smooth_d).
//! Lookback: length_rsi + length_stoch + smooth_k - 1 candles.
//! Edge cases: flat RSI window → raw = 50.

use crate::components::indicator::{Indicator, IndicatorSeries};
use crate::domain::Candle;
use crate::indicators::rsi::rsi_of_series;
use crate::indicators::series::sma_opt;

pub const KEYS: &[&str] = &["stoch_rsi_k", "stoch_rsi_d"];

#[derive(Debug, Clone)]
pub struct StochRsi {
    length_rsi: usize,
    length_stoch: usize,
    smooth_k: usize,
    smooth_d: usize,
    name: String,
}

impl StochRsi {
    pub fn new(length_rsi: usize, length_stoch: usize, smooth_k: usize, smooth_d: usize) -> Self {
        assert!(
            length_rsi >= 1 && length_stoch >= 1 && smooth_k >= 1 && smooth_d >= 1,
            "Stochastic RSI periods must be >= 1"
        );
        Self {
            length_rsi,
            length_stoch,
            smooth_k,
            smooth_d,
            name: format!("stoch_rsi_{length_rsi}_{length_stoch}_{smooth_k}_{smooth_d}"),
        }
    }
}

impl Indicator for StochRsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.length_rsi + self.length_stoch + self.smooth_k - 1
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
        let rsi = rsi_of_series(&closes, self.length_rsi);

        let mut raw = vec![None; n];
        for i in (self.length_stoch - 1)..n {
            let window = &rsi[i + 1 - self.length_stoch..=i];
            let Some(values) = window.iter().copied().collect::<Option<Vec<f64>>>() else {
                continue;
            };
            let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let current = values[values.len() - 1];
            raw[i] = Some(if hi - lo == 0.0 {
                50.0
            } else {
                100.0 * (current - lo) / (hi - lo)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_some_approx, make_candles, DEFAULT_EPSILON};

    #[test]
    fn stoch_rsi_first_value_at_lookback() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + ((i * 3) % 7) as f64).collect();
        let ind = StochRsi::new(5, 8, 3, 3);
        let s = ind.compute(&make_candles(&closes));
        let first = ind.lookback() - 1;
        assert_eq!(s.get("stoch_rsi_k", first - 1), None);
        assert!(s.get("stoch_rsi_k", first).is_some());
        assert!(s.get("stoch_rsi_d", first + 2).is_some());
    }

    #[test]
    fn stoch_rsi_monotonic_rise_is_50() {
        // RSI pinned at 100 → flat window → raw 50
        let closes: Vec<f64> = (0..25).map(|i| 100.0 + i as f64).collect();
        let s = StochRsi::new(5, 8, 3, 3).compute(&make_candles(&closes));
        assert_some_approx(s.get("stoch_rsi_k", 24), 50.0, DEFAULT_EPSILON);
        assert_some_approx(s.get("stoch_rsi_d", 24), 50.0, DEFAULT_EPSILON);
    }

    #[test]
    fn stoch_rsi_bounds() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + ((i * 13) % 17) as f64 - ((i * 5) % 9) as f64)
            .collect();
        let s = StochRsi::new(5, 8, 3, 3).compute(&make_candles(&closes));
        for v in s.get_series("stoch_rsi_k").unwrap().iter().flatten() {
            assert!((0.0..=100.0).contains(v), "stoch RSI out of bounds: {v}");
        }
    }

    #[test]
    fn stoch_rsi_short_input_is_unset() {
        let ind = StochRsi::new(5, 8, 3, 3);
        let s = ind.compute(&make_candles(&vec![1.0; ind.lookback() - 1]));
        assert!(s.get_series("stoch_rsi_k").unwrap().iter().all(|v| v.is_none()));
    }
}
