//! Indicator trait and named indicator series container.
//!
//! Indicators are pure functions: candle history in, aligned series out.
//! Every series has exactly one slot per input candle; slots before the
//! indicator's warm-up is satisfied hold `None`.

use crate::domain::Candle;
use std::collections::BTreeMap;

/// Trait for indicators.
///
/// # Look-ahead contamination guard
/// No value at index t may depend on candles after t. Every indicator must
/// pass the truncated-vs-full series test in `tests/indicator_properties.rs`.
pub trait Indicator: Send + Sync {
    /// Short name (e.g., "rsi", "macd").
    fn name(&self) -> &str;

    /// Minimum number of candles before any output slot is set.
    /// Shorter inputs produce all-`None` series.
    fn lookback(&self) -> usize;

    /// Series keys this indicator writes, in display order.
    fn keys(&self) -> &'static [&'static str];

    /// Compute every output series for the whole candle sequence.
    fn compute(&self, candles: &[Candle]) -> IndicatorSeries;
}

/// Named mapping from series key to values aligned with the input candles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorSeries {
    series: BTreeMap<String, Vec<Option<f64>>>,
}

impl IndicatorSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// All `keys` present, every slot unset.
    pub fn unset(keys: &[&str], len: usize) -> Self {
        let mut out = Self::new();
        for key in keys {
            out.insert(*key, vec![None; len]);
        }
        out
    }

    /// Insert a named series, replacing any previous one with the same key.
    pub fn insert(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) {
        self.series.insert(name.into(), values);
    }

    /// Move every series of `other` into `self`.
    pub fn merge(&mut self, other: IndicatorSeries) {
        self.series.extend(other.series);
    }

    /// Value of a series at a candle index. `None` for unknown keys,
    /// out-of-range indices and warm-up slots alike.
    pub fn get(&self, name: &str, index: usize) -> Option<f64> {
        self.series
            .get(name)
            .and_then(|v| v.get(index).copied())
            .flatten()
    }

    /// Get the full series for a key.
    pub fn get_series(&self, name: &str) -> Option<&[Option<f64>]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(|k| k.as_str())
    }

    /// Number of series stored.
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
