//! Deterministic synthetic candles for dry runs.
//!
//! Prices follow a slow sine wave around `base_price` with hash-seeded noise.
//! Every candle is a pure function of (symbol, timeframe, open time), so
//! repeated fetches agree on history and consecutive candles join up
//! (`open[i] == close[i - 1]`). The last candle returned is the one
//! containing the clock's current time.

use std::f64::consts::TAU;
use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use klinevote_core::clock::Clock;
use klinevote_core::data::{DataError, MarketDataProvider};
use klinevote_core::domain::{Candle, Timeframe};

pub struct SyntheticProvider {
    clock: Arc<dyn Clock>,
    base_price: f64,
    /// Relative swing of the sine wave.
    amplitude: f64,
    /// Candles per full sine period.
    cycle_candles: u32,
    /// Relative noise added to each boundary price.
    noise: f64,
}

impl SyntheticProvider {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            base_price: 2_000.0,
            amplitude: 0.02,
            cycle_candles: 60,
            noise: 0.002,
        }
    }

    pub fn with_base_price(mut self, base_price: f64) -> Self {
        self.base_price = base_price;
        self
    }

    fn rng(symbol: &str, tf: Timeframe, time_ms: i64, salt: &str) -> StdRng {
        let mut hasher = blake3::Hasher::new();
        hasher.update(symbol.as_bytes());
        hasher.update(tf.as_str().as_bytes());
        hasher.update(&time_ms.to_le_bytes());
        hasher.update(salt.as_bytes());
        StdRng::from_seed(*hasher.finalize().as_bytes())
    }

    /// Price at a candle boundary.
    fn boundary_price(&self, symbol: &str, tf: Timeframe, time_ms: i64) -> f64 {
        let step = time_ms.div_euclid(tf.interval_ms()) as f64;
        let wave = (step * TAU / f64::from(self.cycle_candles.max(1))).sin();
        let jitter: f64 =
            Self::rng(symbol, tf, time_ms, "close").gen_range(-self.noise..=self.noise);
        self.base_price * (1.0 + self.amplitude * wave) * (1.0 + jitter)
    }

    pub fn candle_at(&self, symbol: &str, tf: Timeframe, open_time: i64) -> Candle {
        let close_time = open_time + tf.interval_ms();
        let open = self.boundary_price(symbol, tf, open_time);
        let close = self.boundary_price(symbol, tf, close_time);
        let mut rng = Self::rng(symbol, tf, open_time, "wick");
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.001));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.001));
        Candle {
            open_time,
            open,
            high,
            low,
            close,
            volume: rng.gen_range(100.0..10_000.0),
            close_time,
        }
    }
}

#[async_trait]
impl MarketDataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    async fn get_klines(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candle>, DataError> {
        let interval = timeframe.interval_ms();
        let active_open = self.clock.now_ms().div_euclid(interval) * interval;
        let first_open = active_open - interval * limit.saturating_sub(1) as i64;
        Ok((0..limit as i64)
            .map(|i| self.candle_at(symbol, timeframe, first_open + i * interval))
            .collect())
    }
}
