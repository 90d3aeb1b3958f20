//! Coral Trend.
//!
//! ATR = Wilder(true range, period); base = EMA(median, period).
//! Envelope around the median price: median ± ATR * multiplier.
//! The level follows the lower band while the base EMA rises, the upper band
//! while it falls, and holds its previous value when the base is flat.
//! Coral = EMA(level, period).
//! Trend: +1 when close > coral, -1 when close < coral, 0 when equal.
//! Lookback: 2 * period candles.

use crate::components::indicator::{Indicator, IndicatorSeries};
use crate::domain::Candle;
use crate::indicators::atr::{true_range, wilder_smooth};
use crate::indicators::series::{ema, ema_opt};

pub const KEYS: &[&str] = &["coral", "coral_trend"];

#[derive(Debug, Clone)]
pub struct CoralTrend {
    period: usize,
    multiplier: f64,
    name: String,
}

impl CoralTrend {
    pub fn new(period: usize, multiplier: f64) -> Self {
        assert!(period >= 1, "Coral period must be >= 1");
        assert!(
            multiplier.is_finite() && multiplier >= 0.0,
            "Coral multiplier must be finite and non-negative"
        );
        Self {
            period,
            multiplier,
            name: format!("coral_{period}"),
        }
    }
}

impl Indicator for CoralTrend {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        2 * self.period
    }

    fn keys(&self) -> &'static [&'static str] {
        KEYS
    }

    fn compute(&self, candles: &[Candle]) -> IndicatorSeries {
        let n = candles.len();
        if n < self.lookback() {
            return IndicatorSeries::unset(KEYS, n);
        }

        let median: Vec<f64> = candles.iter().map(Candle::median).collect();
        let atr = wilder_smooth(&true_range(candles), self.period);
        let base = ema(&median, self.period);

        let mut level = vec![None; n];
        let mut last: Option<f64> = None;
        for i in 1..n {
            let (Some(band), Some(now), Some(before)) = (atr[i], base[i], base[i - 1]) else {
                continue;
            };
            let offset = band * self.multiplier;
            let value = if now > before {
                median[i] - offset
            } else if now < before {
                median[i] + offset
            } else {
                last.unwrap_or(median[i])
            };
            level[i] = Some(value);
            last = Some(value);
        }

        let coral = ema_opt(&level, self.period);
        let trend: Vec<Option<f64>> = coral
            .iter()
            .zip(candles)
            .map(|(c, candle)| {
                let c = (*c)?;
                Some(if candle.close > c {
                    1.0
                } else if candle.close < c {
                    -1.0
                } else {
                    0.0
                })
            })
            .collect();

        let mut out = IndicatorSeries::new();
        out.insert(KEYS[0], coral);
        out.insert(KEYS[1], trend);
        out
    }
}
