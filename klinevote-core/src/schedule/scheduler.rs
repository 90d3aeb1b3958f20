//! Per-timeframe candle-close scheduler.
//!
//! For every configured timeframe the scheduler remembers when the next
//! candle is expected to close. A timeframe becomes due `close_buffer_ms`
//! after that moment, giving the provider time to publish the candle.
//! When the fetched data still ends before the expected close the scheduler
//! counts a stale retry; after `max_retries` it gives up on that candle and
//! advances, so one broken timeframe cannot stall the loop.
//!
//! Life cycle per timeframe:
//! `Uninitialized → Armed → AwaitingConfirmation → (Armed | StaleRetry)`.
//!
//! Timing anomalies never produce errors; the worst case is a skipped candle.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{Candle, Timeframe};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Delay after the expected close before a timeframe is due.
    pub close_buffer_ms: i64,
    /// Stale / failed attempts tolerated before the candle is skipped.
    pub max_retries: u32,
    /// Poll interval while any timeframe is retrying.
    pub retry_poll_ms: u64,
    /// Poll interval before any timeframe is initialized.
    pub idle_poll_ms: u64,
    /// Lower bound on every computed poll delay.
    pub min_poll_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            close_buffer_ms: 5_000,
            max_retries: 6,
            retry_poll_ms: 10_000,
            idle_poll_ms: 60_000,
            min_poll_ms: 1_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleState {
    /// Epoch ms at which the next candle is expected to close.
    pub next_expected_close: i64,
    pub retry_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    /// Waiting for the expected close plus buffer.
    Armed,
    /// Due; the next fetch should confirm the close.
    AwaitingConfirmation,
    /// A previous attempt saw stale data or failed.
    StaleRetry,
}

/// Result of checking fetched data against the expected close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseCheck {
    /// The expected candle has closed; analyze it.
    Confirmed,
    /// Data is behind; try again on a later cycle.
    Stale { retry_count: u32 },
    /// Retry budget exhausted; the expectation moved one interval on.
    Skipped { skipped_close: i64 },
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    timeframes: Vec<Timeframe>,
    states: HashMap<Timeframe, ScheduleState>,
    config: ScheduleConfig,
}

impl Scheduler {
    /// Duplicate timeframes are dropped; the first occurrence fixes the order.
    pub fn new(timeframes: &[Timeframe], config: ScheduleConfig) -> Self {
        let mut ordered = Vec::with_capacity(timeframes.len());
        for tf in timeframes {
            if !ordered.contains(tf) {
                ordered.push(*tf);
            }
        }
        Self {
            timeframes: ordered,
            states: HashMap::new(),
            config,
        }
    }

    pub fn timeframes(&self) -> &[Timeframe] {
        &self.timeframes
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    pub fn state(&self, tf: Timeframe) -> Option<&ScheduleState> {
        self.states.get(&tf)
    }

    pub fn is_initialized(&self, tf: Timeframe) -> bool {
        self.states.contains_key(&tf)
    }

    /// Timeframes that still need their first successful fetch.
    pub fn uninitialized(&self) -> Vec<Timeframe> {
        self.timeframes
            .iter()
            .copied()
            .filter(|tf| !self.is_initialized(*tf))
            .collect()
    }

    /// Arm a timeframe from a fresh fetch: the active (last) candle's close
    /// is the next expected close. Returns false when nothing changed
    /// (already initialized, not configured, or no candles).
    pub fn initialize(&mut self, tf: Timeframe, candles: &[Candle]) -> bool {
        if self.is_initialized(tf) || !self.timeframes.contains(&tf) {
            return false;
        }
        let Some(active) = candles.last() else {
            return false;
        };
        debug!(timeframe = %tf, next_close = active.close_time, "schedule armed");
        self.states.insert(
            tf,
            ScheduleState {
                next_expected_close: active.close_time,
                retry_count: 0,
            },
        );
        true
    }

    pub fn is_due(&self, tf: Timeframe, now_ms: i64) -> bool {
        self.states
            .get(&tf)
            .is_some_and(|s| now_ms >= s.next_expected_close + self.config.close_buffer_ms)
    }

    /// Due timeframes in configured order.
    pub fn due_timeframes(&self, now_ms: i64) -> Vec<Timeframe> {
        self.timeframes
            .iter()
            .copied()
            .filter(|tf| self.is_due(*tf, now_ms))
            .collect()
    }

    pub fn phase(&self, tf: Timeframe, now_ms: i64) -> Phase {
        match self.states.get(&tf) {
            None => Phase::Uninitialized,
            Some(s) if s.retry_count > 0 => Phase::StaleRetry,
            Some(_) if self.is_due(tf, now_ms) => Phase::AwaitingConfirmation,
            Some(_) => Phase::Armed,
        }
    }

    /// Compare the last completed candle's close time with the expectation.
    ///
    /// Unknown timeframes have no expectation and are reported confirmed.
    pub fn confirm_close(&mut self, tf: Timeframe, last_completed_close: i64) -> CloseCheck {
        let Some(state) = self.states.get(&tf) else {
            return CloseCheck::Confirmed;
        };
        if last_completed_close < state.next_expected_close {
            debug!(
                timeframe = %tf,
                expected = state.next_expected_close,
                got = last_completed_close,
                "candle not closed yet"
            );
            return self.defer(tf);
        }
        if let Some(state) = self.states.get_mut(&tf) {
            state.retry_count = 0;
        }
        CloseCheck::Confirmed
    }

    /// Count a failed attempt (stale data, fetch error, short history)
    /// against the retry budget.
    pub fn defer(&mut self, tf: Timeframe) -> CloseCheck {
        let max_retries = self.config.max_retries;
        let interval = tf.interval_ms();
        let Some(state) = self.states.get_mut(&tf) else {
            return CloseCheck::Stale { retry_count: 0 };
        };
        state.retry_count += 1;
        if state.retry_count < max_retries {
            return CloseCheck::Stale {
                retry_count: state.retry_count,
            };
        }
        let skipped_close = state.next_expected_close;
        state.next_expected_close += interval;
        state.retry_count = 0;
        warn!(
            timeframe = %tf,
            skipped_close,
            attempts = max_retries,
            "retry budget exhausted, skipping candle"
        );
        CloseCheck::Skipped { skipped_close }
    }

    /// Advance past an analyzed candle. If the provider was already further
    /// ahead than one interval, keep advancing so the same closed candle is
    /// never analyzed twice.
    pub fn mark_analyzed(&mut self, tf: Timeframe, confirmed_close: i64) {
        let interval = tf.interval_ms();
        let Some(state) = self.states.get_mut(&tf) else {
            return;
        };
        state.next_expected_close += interval;
        let mut caught_up = 0;
        while state.next_expected_close <= confirmed_close {
            state.next_expected_close += interval;
            caught_up += 1;
        }
        state.retry_count = 0;
        if caught_up > 0 {
            debug!(timeframe = %tf, caught_up, "schedule caught up with provider");
        }
    }

    /// How long the polling loop should sleep before the next cycle.
    /// While any configured timeframe is still unarmed the delay never
    /// exceeds `idle_poll_ms`, so arming is retried on a short cadence.
    pub fn next_poll_delay(&self, now_ms: i64) -> Duration {
        let c = &self.config;
        let idle = Duration::from_millis(c.idle_poll_ms.max(c.min_poll_ms));
        if self.states.is_empty() {
            return idle;
        }
        if self.states.values().any(|s| s.retry_count > 0) {
            return Duration::from_millis(c.retry_poll_ms);
        }
        let soonest = self
            .states
            .values()
            .map(|s| s.next_expected_close + c.close_buffer_ms - now_ms)
            .filter(|remaining| *remaining > 0)
            .min();
        let delay = match soonest {
            Some(ms) => Duration::from_millis((ms as u64).max(c.min_poll_ms)),
            None => Duration::from_millis(c.min_poll_ms),
        };
        if self.states.len() < self.timeframes.len() {
            delay.min(idle)
        } else {
            delay
        }
    }
}
