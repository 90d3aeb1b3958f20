//! Majority vote across the eight indicators.
//!
//! Each indicator is classified BUY / SELL / NEUTRAL at the last completed
//! candle (index `len - 2`). The final signal is BUY when at least `quorum`
//! indicators say BUY, SELL when at least `quorum` say SELL, NEUTRAL
//! otherwise. Both sides reaching the quorum is resolved by `ConflictPolicy`.
//!
//! Thresholds are exclusive: a reading exactly on a band edge is NEUTRAL,
//! as is any unset reading.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::indicator::IndicatorSeries;
use crate::domain::{Candle, Signal};
use crate::indicators::{IndicatorParams, IndicatorSuite, ParamError};
use crate::strategy::snapshot::IndicatorSnapshot;

/// Number of voting indicators.
pub const VOTERS: usize = 8;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StrategyError {
    #[error("quorum must be between 1 and 8, got {0}")]
    InvalidQuorum(usize),

    #[error("{name}: oversold ({oversold}) must be below overbought ({overbought})")]
    InvertedBand {
        name: &'static str,
        oversold: f64,
        overbought: f64,
    },

    #[error("invalid indicator parameters: {0}")]
    Params(#[from] ParamError),
}

/// Voting indicators in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorKind {
    Cmo,
    Stochastic,
    Rsi,
    Macd,
    StochRsi,
    WilliamsR,
    Fisher,
    Coral,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; VOTERS] = [
        IndicatorKind::Cmo,
        IndicatorKind::Stochastic,
        IndicatorKind::Rsi,
        IndicatorKind::Macd,
        IndicatorKind::StochRsi,
        IndicatorKind::WilliamsR,
        IndicatorKind::Fisher,
        IndicatorKind::Coral,
    ];

    pub fn label(self) -> &'static str {
        match self {
            IndicatorKind::Cmo => "CMO",
            IndicatorKind::Stochastic => "Stochastic",
            IndicatorKind::Rsi => "RSI",
            IndicatorKind::Macd => "MACD",
            IndicatorKind::StochRsi => "Stoch RSI",
            IndicatorKind::WilliamsR => "Williams %R",
            IndicatorKind::Fisher => "Fisher",
            IndicatorKind::Coral => "Coral Trend",
        }
    }
}

/// Oversold / overbought pair for an oscillator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub oversold: f64,
    pub overbought: f64,
}

impl Band {
    pub const fn new(oversold: f64, overbought: f64) -> Self {
        Self {
            oversold,
            overbought,
        }
    }

    /// Strictly below oversold → BUY, strictly above overbought → SELL.
    pub fn classify(&self, value: Option<f64>) -> Signal {
        match value {
            Some(v) if v < self.oversold => Signal::Buy,
            Some(v) if v > self.overbought => Signal::Sell,
            _ => Signal::Neutral,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub cmo: Band,
    pub stochastic: Band,
    pub rsi: Band,
    pub stoch_rsi: Band,
    pub williams_r: Band,
    /// Fisher must exceed this magnitude (and cross its trigger) to vote.
    pub fisher_level: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cmo: Band::new(-62.01, 62.01),
            stochastic: Band::new(15.0, 85.0),
            rsi: Band::new(15.0, 85.0),
            stoch_rsi: Band::new(15.0, 85.0),
            williams_r: Band::new(-80.0, -20.0),
            fisher_level: 1.5,
        }
    }
}

impl Thresholds {
    pub fn validate(&self) -> Result<(), StrategyError> {
        let bands = [
            ("cmo", self.cmo),
            ("stochastic", self.stochastic),
            ("rsi", self.rsi),
            ("stoch_rsi", self.stoch_rsi),
            ("williams_r", self.williams_r),
        ];
        for (name, band) in bands {
            if band.oversold >= band.overbought {
                return Err(StrategyError::InvertedBand {
                    name,
                    oversold: band.oversold,
                    overbought: band.overbought,
                });
            }
        }
        Ok(())
    }
}

/// Outcome when BUY and SELL both reach the quorum in the same cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    #[default]
    Neutral,
    Buy,
    Sell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoteConfig {
    pub quorum: usize,
    pub thresholds: Thresholds,
    pub on_conflict: ConflictPolicy,
}

impl Default for VoteConfig {
    fn default() -> Self {
        Self {
            quorum: 4,
            thresholds: Thresholds::default(),
            on_conflict: ConflictPolicy::Neutral,
        }
    }
}

impl VoteConfig {
    pub fn validate(&self) -> Result<(), StrategyError> {
        if !(1..=VOTERS).contains(&self.quorum) {
            return Err(StrategyError::InvalidQuorum(self.quorum));
        }
        self.thresholds.validate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndicatorVote {
    pub kind: IndicatorKind,
    pub signal: Signal,
}

/// Per-indicator classifications plus tallies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteBreakdown {
    pub votes: Vec<IndicatorVote>,
    pub buy: usize,
    pub sell: usize,
    pub neutral: usize,
    pub quorum: usize,
}

impl VoteBreakdown {
    pub fn from_votes(votes: Vec<IndicatorVote>, quorum: usize) -> Self {
        let count = |s: Signal| votes.iter().filter(|v| v.signal == s).count();
        let (buy, sell, neutral) = (count(Signal::Buy), count(Signal::Sell), count(Signal::Neutral));
        Self {
            votes,
            buy,
            sell,
            neutral,
            quorum,
        }
    }

    pub fn signal_of(&self, kind: IndicatorKind) -> Signal {
        self.votes
            .iter()
            .find(|v| v.kind == kind)
            .map(|v| v.signal)
            .unwrap_or_default()
    }
}

/// Full result of one vote.
#[derive(Debug, Clone)]
pub struct VoteOutcome {
    pub signal: Signal,
    pub breakdown: VoteBreakdown,
    pub snapshot: IndicatorSnapshot,
    pub series: IndicatorSeries,
    /// Index that was classified; `None` when fewer than two candles were given.
    pub index: Option<usize>,
}

/// Majority-vote strategy: indicator suite plus voting rules.
#[derive(Debug)]
pub struct MajorityVote {
    suite: IndicatorSuite,
    config: VoteConfig,
}

impl Default for MajorityVote {
    fn default() -> Self {
        Self {
            suite: IndicatorSuite::default(),
            config: VoteConfig::default(),
        }
    }
}

impl MajorityVote {
    pub fn new(params: &IndicatorParams, config: VoteConfig) -> Result<Self, StrategyError> {
        config.validate()?;
        let suite = IndicatorSuite::new(params)?;
        Ok(Self { suite, config })
    }

    pub fn config(&self) -> &VoteConfig {
        &self.config
    }

    pub fn suite(&self) -> &IndicatorSuite {
        &self.suite
    }

    /// Compute every indicator and vote at the last completed candle.
    pub fn vote(&self, candles: &[Candle]) -> VoteOutcome {
        let series = self.suite.compute(candles);
        let index = candles.len().checked_sub(2);
        let snapshot = index
            .map(|i| IndicatorSnapshot::at(&series, i))
            .unwrap_or_default();
        let breakdown = self.classify(&snapshot);
        let signal = self.decide(&breakdown);
        VoteOutcome {
            signal,
            breakdown,
            snapshot,
            series,
            index,
        }
    }

    /// Classify every indicator reading in `snapshot`.
    pub fn classify(&self, snapshot: &IndicatorSnapshot) -> VoteBreakdown {
        let t = &self.config.thresholds;
        let votes = IndicatorKind::ALL
            .iter()
            .map(|&kind| {
                let signal = match kind {
                    IndicatorKind::Cmo => t.cmo.classify(snapshot.cmo),
                    IndicatorKind::Stochastic => t.stochastic.classify(snapshot.stoch_k),
                    IndicatorKind::Rsi => t.rsi.classify(snapshot.rsi),
                    IndicatorKind::Macd => crossing(snapshot.macd, snapshot.macd_signal),
                    IndicatorKind::StochRsi => t.stoch_rsi.classify(snapshot.stoch_rsi_k),
                    IndicatorKind::WilliamsR => t.williams_r.classify(snapshot.williams_r),
                    IndicatorKind::Fisher => {
                        fisher_vote(snapshot.fisher, snapshot.fisher_trigger, t.fisher_level)
                    }
                    IndicatorKind::Coral => trend_vote(snapshot.coral_trend),
                };
                IndicatorVote { kind, signal }
            })
            .collect();
        VoteBreakdown::from_votes(votes, self.config.quorum)
    }

    /// Apply the quorum rule to a breakdown.
    pub fn decide(&self, breakdown: &VoteBreakdown) -> Signal {
        let quorum = self.config.quorum;
        match (breakdown.buy >= quorum, breakdown.sell >= quorum) {
            (true, true) => match self.config.on_conflict {
                ConflictPolicy::Neutral => Signal::Neutral,
                ConflictPolicy::Buy => Signal::Buy,
                ConflictPolicy::Sell => Signal::Sell,
            },
            (true, false) => Signal::Buy,
            (false, true) => Signal::Sell,
            (false, false) => Signal::Neutral,
        }
    }
}

fn crossing(line: Option<f64>, signal: Option<f64>) -> Signal {
    match (line, signal) {
        (Some(m), Some(s)) if m > s => Signal::Buy,
        (Some(m), Some(s)) if m < s => Signal::Sell,
        _ => Signal::Neutral,
    }
}

fn fisher_vote(fisher: Option<f64>, trigger: Option<f64>, level: f64) -> Signal {
    match (fisher, trigger) {
        (Some(f), Some(t)) if f > t && f > level => Signal::Buy,
        (Some(f), Some(t)) if f < t && f < -level => Signal::Sell,
        _ => Signal::Neutral,
    }
}

fn trend_vote(trend: Option<f64>) -> Signal {
    match trend {
        Some(t) if t > 0.0 => Signal::Buy,
        Some(t) if t < 0.0 => Signal::Sell,
        _ => Signal::Neutral,
    }
}
