//! Domain types for klinevote

pub mod candle;
pub mod signal;
pub mod timeframe;

pub use candle::{last_completed, Candle};
pub use signal::Signal;
pub use timeframe::{Horizon, Timeframe, TimeframeParseError};
