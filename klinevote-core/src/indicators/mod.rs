//! Concrete indicator implementations.
//!
//! The eight voting indicators implement the `Indicator` trait from
//! `components::indicator`. `IndicatorSuite` is the closed set the vote
//! runs; `series` and `atr` hold the smoothing primitives they share.
//!
//! Multi-output indicators (Stochastic, MACD, Stochastic RSI, Fisher, Coral)
//! write one named series per output into the same `IndicatorSeries`.

pub mod atr;
pub mod cmo;
pub mod coral;
pub mod fisher;
pub mod macd;
pub mod rsi;
pub mod series;
pub mod stoch_rsi;
pub mod stochastic;
pub mod suite;
pub mod williams_r;

pub use cmo::{Cmo, PriceSource};
pub use coral::CoralTrend;
pub use fisher::FisherTransform;
pub use macd::Macd;
pub use rsi::Rsi;
pub use stoch_rsi::StochRsi;
pub use stochastic::Stochastic;
pub use suite::{IndicatorParams, IndicatorSuite, ParamError};
pub use williams_r::WilliamsR;

/// Create synthetic 5-minute candles from close prices for testing.
///
/// Generates plausible OHLC: open = prev_close (or close for the first candle),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_candles(closes: &[f64]) -> Vec<crate::domain::Candle> {
    use crate::domain::Candle;
    const INTERVAL: i64 = 300_000;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let open_time = i as i64 * INTERVAL;
            Candle {
                open_time,
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000.0,
                close_time: open_time + INTERVAL,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Unwrap a set slot and compare.
#[cfg(test)]
pub fn assert_some_approx(actual: Option<f64>, expected: f64, epsilon: f64) {
    match actual {
        Some(v) => assert_approx(v, expected, epsilon),
        None => panic!("expected Some({expected}), got None"),
    }
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
