//! The closed set of eight voting indicators and their parameters.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::components::indicator::{Indicator, IndicatorSeries};
use crate::domain::Candle;
use crate::indicators::{
    Cmo, CoralTrend, FisherTransform, Macd, PriceSource, Rsi, StochRsi, Stochastic, WilliamsR,
};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParamError {
    #[error("{indicator}: {field} must be >= 1")]
    ZeroPeriod {
        indicator: &'static str,
        field: &'static str,
    },

    #[error("macd: fast ({fast}) must be shorter than slow ({slow})")]
    MacdOrder { fast: usize, slow: usize },

    #[error("coral: multiplier must be finite and non-negative, got {0}")]
    CoralMultiplier(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CmoParams {
    pub length: usize,
    pub source: PriceSource,
}

impl Default for CmoParams {
    fn default() -> Self {
        Self {
            length: 13,
            source: PriceSource::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StochasticParams {
    pub period_k: usize,
    pub smooth_k: usize,
    pub smooth_d: usize,
}

impl Default for StochasticParams {
    fn default() -> Self {
        Self {
            period_k: 9,
            smooth_k: 3,
            smooth_d: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiParams {
    pub length: usize,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self { length: 4 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: 8,
            slow: 13,
            signal: 8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StochRsiParams {
    pub length_rsi: usize,
    pub length_stoch: usize,
    pub smooth_k: usize,
    pub smooth_d: usize,
}

impl Default for StochRsiParams {
    fn default() -> Self {
        Self {
            length_rsi: 5,
            length_stoch: 8,
            smooth_k: 3,
            smooth_d: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WilliamsRParams {
    pub length: usize,
}

impl Default for WilliamsRParams {
    fn default() -> Self {
        Self { length: 10 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FisherParams {
    pub length: usize,
}

impl Default for FisherParams {
    fn default() -> Self {
        Self { length: 8 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoralParams {
    pub period: usize,
    pub multiplier: f64,
}

impl Default for CoralParams {
    fn default() -> Self {
        Self {
            period: 21,
            multiplier: 0.4,
        }
    }
}

/// Parameters for every indicator in the suite. Missing TOML keys fall back
/// to the defaults below.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorParams {
    pub cmo: CmoParams,
    pub stochastic: StochasticParams,
    pub rsi: RsiParams,
    pub macd: MacdParams,
    pub stoch_rsi: StochRsiParams,
    pub williams_r: WilliamsRParams,
    pub fisher: FisherParams,
    pub coral: CoralParams,
}

impl IndicatorParams {
    pub fn validate(&self) -> Result<(), ParamError> {
        let periods: [(&'static str, &'static str, usize); 15] = [
            ("cmo", "length", self.cmo.length),
            ("stochastic", "period_k", self.stochastic.period_k),
            ("stochastic", "smooth_k", self.stochastic.smooth_k),
            ("stochastic", "smooth_d", self.stochastic.smooth_d),
            ("rsi", "length", self.rsi.length),
            ("macd", "fast", self.macd.fast),
            ("macd", "slow", self.macd.slow),
            ("macd", "signal", self.macd.signal),
            ("stoch_rsi", "length_rsi", self.stoch_rsi.length_rsi),
            ("stoch_rsi", "length_stoch", self.stoch_rsi.length_stoch),
            ("stoch_rsi", "smooth_k", self.stoch_rsi.smooth_k),
            ("stoch_rsi", "smooth_d", self.stoch_rsi.smooth_d),
            ("williams_r", "length", self.williams_r.length),
            ("fisher", "length", self.fisher.length),
            ("coral", "period", self.coral.period),
        ];
        if let Some(&(indicator, field, _)) = periods.iter().find(|(_, _, p)| *p == 0) {
            return Err(ParamError::ZeroPeriod { indicator, field });
        }
        if self.macd.fast >= self.macd.slow {
            return Err(ParamError::MacdOrder {
                fast: self.macd.fast,
                slow: self.macd.slow,
            });
        }
        let m = self.coral.multiplier;
        if !m.is_finite() || m < 0.0 {
            return Err(ParamError::CoralMultiplier(m));
        }
        Ok(())
    }
}

/// The eight voting indicators, built once from validated parameters.
pub struct IndicatorSuite {
    indicators: Vec<Box<dyn Indicator>>,
}

impl std::fmt::Debug for IndicatorSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.indicators.iter().map(|i| i.name()))
            .finish()
    }
}

impl IndicatorSuite {
    pub fn new(params: &IndicatorParams) -> Result<Self, ParamError> {
        params.validate()?;
        Ok(Self::build(params))
    }

    // Constructors assert their own preconditions; `new` checks them first.
    fn build(p: &IndicatorParams) -> Self {
        let indicators: Vec<Box<dyn Indicator>> = vec![
            Box::new(Cmo::new(p.cmo.length, p.cmo.source)),
            Box::new(Stochastic::new(
                p.stochastic.period_k,
                p.stochastic.smooth_k,
                p.stochastic.smooth_d,
            )),
            Box::new(Rsi::new(p.rsi.length)),
            Box::new(Macd::new(p.macd.fast, p.macd.slow, p.macd.signal)),
            Box::new(StochRsi::new(
                p.stoch_rsi.length_rsi,
                p.stoch_rsi.length_stoch,
                p.stoch_rsi.smooth_k,
                p.stoch_rsi.smooth_d,
            )),
            Box::new(WilliamsR::new(p.williams_r.length)),
            Box::new(FisherTransform::new(p.fisher.length)),
            Box::new(CoralTrend::new(p.coral.period, p.coral.multiplier)),
        ];
        Self { indicators }
    }

    pub fn indicators(&self) -> &[Box<dyn Indicator>] {
        &self.indicators
    }

    /// Candles needed before every indicator has at least one set slot.
    pub fn max_lookback(&self) -> usize {
        self.indicators.iter().map(|i| i.lookback()).max().unwrap_or(0)
    }

    /// Compute every indicator over the full candle sequence.
    pub fn compute(&self, candles: &[Candle]) -> IndicatorSeries {
        let mut all = IndicatorSeries::new();
        for indicator in &self.indicators {
            all.merge(indicator.compute(candles));
        }
        all
    }
}

impl Default for IndicatorSuite {
    fn default() -> Self {
        Self::build(&IndicatorParams::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_candles;

    #[test]
    fn default_params_validate() {
        assert!(IndicatorParams::default().validate().is_ok());
    }

    #[test]
    fn zero_period_rejected() {
        let mut p = IndicatorParams::default();
        p.stoch_rsi.smooth_d = 0;
        assert_eq!(
            p.validate(),
            Err(ParamError::ZeroPeriod {
                indicator: "stoch_rsi",
                field: "smooth_d"
            })
        );
    }

    #[test]
    fn macd_order_rejected() {
        let mut p = IndicatorParams::default();
        p.macd.fast = 13;
        assert!(matches!(p.validate(), Err(ParamError::MacdOrder { .. })));
    }

    #[test]
    fn negative_multiplier_rejected() {
        let mut p = IndicatorParams::default();
        p.coral.multiplier = -1.0;
        assert!(matches!(p.validate(), Err(ParamError::CoralMultiplier(_))));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let p: IndicatorParams =
            serde_json::from_str(r#"{"rsi": {"length": 7}, "cmo": {"source": "close"}, "fisher": {}}"#)
                .unwrap();
        assert_eq!(p.rsi.length, 7);
        assert_eq!(p.cmo.length, 13);
        assert_eq!(p.cmo.source, PriceSource::Close);
        assert_eq!(p.fisher.length, 8);
        assert_eq!(p.williams_r.length, 10);
    }

    #[test]
    fn suite_writes_every_key() {
        let suite = IndicatorSuite::new(&IndicatorParams::default()).unwrap();
        let closes: Vec<f64> = (0..101).map(|i| 2000.0 + ((i * 7) % 13) as f64).collect();
        let series = suite.compute(&make_candles(&closes));
        let keys: Vec<&str> = series.keys().collect();
        for key in [
            "cmo",
            "stoch_k",
            "stoch_d",
            "rsi",
            "macd",
            "macd_signal",
            "macd_histogram",
            "stoch_rsi_k",
            "stoch_rsi_d",
            "williams_r",
            "fisher",
            "fisher_trigger",
            "coral",
            "coral_trend",
        ] {
            assert!(keys.contains(&key), "missing {key}");
            assert_eq!(series.get_series(key).unwrap().len(), 101);
        }
    }

    #[test]
    fn default_suite_max_lookback_is_coral() {
        assert_eq!(IndicatorSuite::default().max_lookback(), 42);
        assert_eq!(IndicatorSuite::default().indicators().len(), 8);
    }
}
