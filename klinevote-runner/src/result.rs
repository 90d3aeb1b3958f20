//! Results produced by one orchestrator cycle.

use serde::{Deserialize, Serialize};

use klinevote_core::domain::{Horizon, Signal, Timeframe};
use klinevote_core::strategy::{IndicatorSnapshot, VoteBreakdown};

/// Vote result for one timeframe at one closed candle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeframeResult {
    pub timeframe: Timeframe,
    pub signal: Signal,
    /// Close price of the analyzed candle.
    pub price: f64,
    /// Open time of the analyzed candle, epoch seconds.
    pub timestamp: i64,
    /// Close time of the analyzed candle, epoch milliseconds.
    pub close_time: i64,
    pub breakdown: VoteBreakdown,
    pub snapshot: IndicatorSnapshot,
}

impl TimeframeResult {
    pub fn is_actionable(&self) -> bool {
        !self.signal.is_neutral()
    }
}

/// What happened to one due timeframe during a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeframeOutcome {
    Analyzed(TimeframeResult),
    /// The provider has not published the expected candle yet.
    Stale { retry_count: u32 },
    /// Retry budget exhausted; the schedule moved past this close.
    Skipped { skipped_close: i64 },
    /// Fetch failed or history was too short; counted against the budget.
    Failed { reason: String },
}

/// One horizon's worth of analyzed timeframes.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub horizon: Horizon,
    pub outcomes: Vec<(Timeframe, TimeframeOutcome)>,
    /// True when a message was delivered for this batch.
    pub dispatched: bool,
}

impl BatchReport {
    pub fn results(&self) -> impl Iterator<Item = &TimeframeResult> {
        self.outcomes.iter().filter_map(|(_, o)| match o {
            TimeframeOutcome::Analyzed(r) => Some(r),
            _ => None,
        })
    }

    pub fn has_actionable(&self) -> bool {
        self.results().any(TimeframeResult::is_actionable)
    }
}

/// Summary of one `run_cycle` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub initialized: Vec<Timeframe>,
    pub batches: Vec<BatchReport>,
}

impl CycleReport {
    pub fn messages_sent(&self) -> usize {
        self.batches.iter().filter(|b| b.dispatched).count()
    }

    pub fn outcome(&self, tf: Timeframe) -> Option<&TimeframeOutcome> {
        self.batches
            .iter()
            .flat_map(|b| b.outcomes.iter())
            .find(|(t, _)| *t == tf)
            .map(|(_, o)| o)
    }
}
