//! Component traits shared by the indicator library and the vote.

pub mod indicator;

pub use indicator::{Indicator, IndicatorSeries};
