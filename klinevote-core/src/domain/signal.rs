//! Trading signal produced by the vote.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Final or per-indicator verdict.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
    #[default]
    Neutral,
}

impl Signal {
    pub fn is_neutral(self) -> bool {
        self == Signal::Neutral
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Signal::Buy => "BUY",
            Signal::Sell => "SELL",
            Signal::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_neutral() {
        assert_eq!(Signal::default(), Signal::Neutral);
        assert!(Signal::default().is_neutral());
    }

    #[test]
    fn display_is_uppercase() {
        assert_eq!(Signal::Buy.to_string(), "BUY");
        assert_eq!(Signal::Sell.to_string(), "SELL");
        assert_eq!(Signal::Neutral.to_string(), "NEUTRAL");
    }

    #[test]
    fn serde_uses_uppercase() {
        assert_eq!(serde_json::to_string(&Signal::Sell).unwrap(), "\"SELL\"");
        let s: Signal = serde_json::from_str("\"BUY\"").unwrap();
        assert_eq!(s, Signal::Buy);
    }
}
