//! Majority-vote strategy over the indicator suite.

pub mod snapshot;
pub mod vote;

pub use snapshot::IndicatorSnapshot;
pub use vote::{
    Band, ConflictPolicy, IndicatorKind, IndicatorVote, MajorityVote, StrategyError, Thresholds,
    VoteBreakdown, VoteConfig, VoteOutcome,
};
