//! Candle timeframes and their batching horizon.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MINUTE_MS: i64 = 60_000;

/// Supported candle intervals.
///
/// Serialized as the short label (`"5m"`, `"1h"`, `"1d"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Timeframe {
    M1,
    M3,
    M5,
    M15,
    M30,
    H1,
    H2,
    H4,
    D1,
}

/// Which alert batch a timeframe belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Horizon {
    Short,
    Long,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown timeframe '{0}' (expected one of 1m, 3m, 5m, 15m, 30m, 1h, 2h, 4h, 1d)")]
pub struct TimeframeParseError(pub String);

impl Timeframe {
    pub const ALL: [Timeframe; 9] = [
        Timeframe::M1,
        Timeframe::M3,
        Timeframe::M5,
        Timeframe::M15,
        Timeframe::M30,
        Timeframe::H1,
        Timeframe::H2,
        Timeframe::H4,
        Timeframe::D1,
    ];

    /// Length of one candle in milliseconds.
    pub fn interval_ms(self) -> i64 {
        match self {
            Timeframe::M1 => MINUTE_MS,
            Timeframe::M3 => 3 * MINUTE_MS,
            Timeframe::M5 => 5 * MINUTE_MS,
            Timeframe::M15 => 15 * MINUTE_MS,
            Timeframe::M30 => 30 * MINUTE_MS,
            Timeframe::H1 => 60 * MINUTE_MS,
            Timeframe::H2 => 120 * MINUTE_MS,
            Timeframe::H4 => 240 * MINUTE_MS,
            Timeframe::D1 => 1440 * MINUTE_MS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::M1 => "1m",
            Timeframe::M3 => "3m",
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::M30 => "30m",
            Timeframe::H1 => "1h",
            Timeframe::H2 => "2h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }

    /// Intraday timeframes up to one hour go out in the short batch.
    pub fn horizon(self) -> Horizon {
        match self {
            Timeframe::M1
            | Timeframe::M3
            | Timeframe::M5
            | Timeframe::M15
            | Timeframe::M30
            | Timeframe::H1 => Horizon::Short,
            Timeframe::H2 | Timeframe::H4 | Timeframe::D1 => Horizon::Long,
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = TimeframeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Timeframe::ALL
            .iter()
            .copied()
            .find(|tf| tf.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| TimeframeParseError(s.to_string()))
    }
}

impl TryFrom<String> for Timeframe {
    type Error = TimeframeParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timeframe> for String {
    fn from(tf: Timeframe) -> Self {
        tf.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_lengths() {
        assert_eq!(Timeframe::M5.interval_ms(), 300_000);
        assert_eq!(Timeframe::M15.interval_ms(), 900_000);
        assert_eq!(Timeframe::H1.interval_ms(), 3_600_000);
        assert_eq!(Timeframe::H4.interval_ms(), 14_400_000);
        assert_eq!(Timeframe::D1.interval_ms(), 86_400_000);
    }

    #[test]
    fn parse_roundtrip_all() {
        for tf in Timeframe::ALL {
            assert_eq!(tf.as_str().parse::<Timeframe>().unwrap(), tf);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("1H".parse::<Timeframe>().unwrap(), Timeframe::H1);
    }

    #[test]
    fn parse_rejects_unknown() {
        let err = "7m".parse::<Timeframe>().unwrap_err();
        assert_eq!(err, TimeframeParseError("7m".into()));
    }

    #[test]
    fn horizons() {
        assert_eq!(Timeframe::M5.horizon(), Horizon::Short);
        assert_eq!(Timeframe::H1.horizon(), Horizon::Short);
        assert_eq!(Timeframe::H4.horizon(), Horizon::Long);
        assert_eq!(Timeframe::D1.horizon(), Horizon::Long);
    }

    #[test]
    fn serde_uses_labels() {
        assert_eq!(serde_json::to_string(&Timeframe::M15).unwrap(), "\"15m\"");
        let tf: Timeframe = serde_json::from_str("\"4h\"").unwrap();
        assert_eq!(tf, Timeframe::H4);
        assert!(serde_json::from_str::<Timeframe>("\"2d\"").is_err());
    }
}
