//! Last non-neutral signal per (symbol, timeframe).
//!
//! Display-only memory: the vote never reads it. The orchestrator records
//! BUY/SELL results and the formatter shows "last signal … ago" for
//! timeframes that were not analyzed in a batch.

use std::collections::HashMap;

use crate::domain::{Signal, Timeframe};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrackerState {
    pub last_signal: Signal,
    /// Epoch seconds of the candle that produced the signal; 0 when never set.
    pub last_signal_timestamp: i64,
}

#[derive(Debug, Clone, Default)]
pub struct SignalTracker {
    entries: HashMap<(String, Timeframe), TrackerState>,
}

impl SignalTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the entry. Returns true when the signal differs from the
    /// previously recorded one.
    pub fn record(&mut self, symbol: &str, tf: Timeframe, signal: Signal, timestamp: i64) -> bool {
        let previous = self.entries.insert(
            (symbol.to_string(), tf),
            TrackerState {
                last_signal: signal,
                last_signal_timestamp: timestamp,
            },
        );
        previous.map_or(true, |p| p.last_signal != signal)
    }

    /// `(NEUTRAL, 0)` when nothing was recorded.
    pub fn get_last(&self, symbol: &str, tf: Timeframe) -> (Signal, i64) {
        let state = self.state(symbol, tf);
        (state.last_signal, state.last_signal_timestamp)
    }

    pub fn state(&self, symbol: &str, tf: Timeframe) -> TrackerState {
        self.entries
            .get(&(symbol.to_string(), tf))
            .copied()
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
