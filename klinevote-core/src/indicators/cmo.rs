//! Chande Momentum Oscillator (CMO).
//!
//! Over the last `length` price changes of the chosen source:
//! CMO = 100 * (sum_up - sum_down) / (sum_up + sum_down)
//! Lookback: length + 1 candles. Range [-100, 100].
//! Edge cases: no movement in the window → 0.0.

use serde::{Deserialize, Serialize};

use crate::components::indicator::{Indicator, IndicatorSeries};
use crate::domain::Candle;

pub const KEYS: &[&str] = &["cmo"];

/// Which candle field the momentum is measured on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    Open,
    High,
    #[default]
    Low,
    Close,
}

impl PriceSource {
    pub fn pick(self, candle: &Candle) -> f64 {
        match self {
            PriceSource::Open => candle.open,
            PriceSource::High => candle.high,
            PriceSource::Low => candle.low,
            PriceSource::Close => candle.close,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cmo {
    length: usize,
    source: PriceSource,
    name: String,
}

impl Cmo {
    pub fn new(length: usize, source: PriceSource) -> Self {
        assert!(length >= 1, "CMO length must be >= 1");
        Self {
            length,
            source,
            name: format!("cmo_{length}"),
        }
    }
}

impl Indicator for Cmo {
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
        let n = candles.len();
        let mut result = vec![None; n];

        if n >= self.lookback() {
            let prices: Vec<f64> = candles.iter().map(|c| self.source.pick(c)).collect();
            for i in self.length..n {
                let (mut up, mut down) = (0.0, 0.0);
                for j in (i + 1 - self.length)..=i {
                    let change = prices[j] - prices[j - 1];
                    if change > 0.0 {
                        up += change;
                    } else {
                        down -= change;
                    }
                }
                let total = up + down;
                result[i] = Some(if total == 0.0 {
                    0.0
                } else {
                    100.0 * (up - down) / total
                });
            }
        }

        let mut out = IndicatorSeries::new();
        out.insert(KEYS[0], result);
        out
    }
}
