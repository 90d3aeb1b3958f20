//! Candle-close scheduling.

pub mod scheduler;

pub use scheduler::{CloseCheck, Phase, ScheduleConfig, ScheduleState, Scheduler};
