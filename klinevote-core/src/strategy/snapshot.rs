//! Typed view of every indicator value at one candle index.

use serde::{Deserialize, Serialize};

use crate::components::indicator::IndicatorSeries;

/// Indicator readings at the analyzed candle. Unset slots stay `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub cmo: Option<f64>,
    pub stoch_k: Option<f64>,
    pub stoch_d: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
    pub macd_signal: Option<f64>,
    pub macd_histogram: Option<f64>,
    pub stoch_rsi_k: Option<f64>,
    pub stoch_rsi_d: Option<f64>,
    pub williams_r: Option<f64>,
    pub fisher: Option<f64>,
    pub fisher_trigger: Option<f64>,
    pub coral: Option<f64>,
    pub coral_trend: Option<f64>,
}

impl IndicatorSnapshot {
    pub fn at(series: &IndicatorSeries, index: usize) -> Self {
        let get = |key: &str| series.get(key, index);
        Self {
            cmo: get("cmo"),
            stoch_k: get("stoch_k"),
            stoch_d: get("stoch_d"),
            rsi: get("rsi"),
            macd: get("macd"),
            macd_signal: get("macd_signal"),
            macd_histogram: get("macd_histogram"),
            stoch_rsi_k: get("stoch_rsi_k"),
            stoch_rsi_d: get("stoch_rsi_d"),
            williams_r: get("williams_r"),
            fisher: get("fisher"),
            fisher_trigger: get("fisher_trigger"),
            coral: get("coral"),
            coral_trend: get("coral_trend"),
        }
    }
}
