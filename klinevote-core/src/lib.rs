//! klinevote core: candles, indicators, voting, scheduling.
//!
//! This crate holds everything that does not talk to the outside world:
//! - Domain types (candles, timeframes, signals)
//! - Eight technical indicators behind the `Indicator` trait
//! - Majority-vote strategy with per-indicator thresholds
//! - Candle-close scheduler with bounded stale-data retry
//! - Signal tracker for "last signal" display
//! - Market data provider trait, retry helper and circuit breaker

pub mod clock;
pub mod components;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod schedule;
pub mod strategy;
pub mod tracker;
