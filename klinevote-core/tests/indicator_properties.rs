//! Property tests for indicator invariants.
//!
//! Uses proptest to verify, for all eight voting indicators:
//! 1. Alignment: every series has one slot per input candle
//! 2. Warm-up: inputs shorter than `lookback()` yield all-unset series
//! 3. Purity: computing twice gives identical output
//! 4. No look-ahead: a prefix computes the same values as the full series
//! 5. Bounds: oscillators stay inside their documented ranges

use proptest::prelude::*;
use klinevote_core::components::Indicator;
use klinevote_core::domain::Candle;
use klinevote_core::indicators::IndicatorSuite;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_closes(min: usize, max: usize) -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-15.0..15.0_f64, min..max).prop_map(|steps| {
        let mut price = 2000.0;
        steps
            .into_iter()
            .map(|s| {
                price = (price + s).max(10.0);
                (price * 100.0).round() / 100.0
            })
            .collect()
    })
}

fn candles_from(closes: &[f64]) -> Vec<Candle> {
    const INTERVAL: i64 = 900_000;
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let wick = 0.5 + (i % 4) as f64;
            let open_time = i as i64 * INTERVAL;
            Candle {
                open_time,
                open,
                high: open.max(close) + wick,
                low: open.min(close) - wick,
                close,
                volume: 100.0,
                close_time: open_time + INTERVAL,
            }
        })
        .collect()
}

fn suite() -> IndicatorSuite {
    IndicatorSuite::default()
}

// ── 1. Alignment ─────────────────────────────────────────────────────

proptest! {
    #[test]
    fn every_series_matches_input_length(closes in arb_closes(0, 120)) {
        let candles = candles_from(&closes);
        for ind in suite().indicators() {
            let out = ind.compute(&candles);
            for key in ind.keys() {
                let series = out.get_series(key).expect("declared key missing");
                prop_assert_eq!(series.len(), candles.len(), "{} / {}", ind.name(), key);
            }
        }
    }
}

// ── 2. Warm-up ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn short_input_is_all_unset(closes in arb_closes(0, 60)) {
        let candles = candles_from(&closes);
        for ind in suite().indicators() {
            if candles.len() >= ind.lookback() {
                continue;
            }
            let out = ind.compute(&candles);
            for key in ind.keys() {
                prop_assert!(
                    out.get_series(key).unwrap().iter().all(|v| v.is_none()),
                    "{} produced a value below its lookback", ind.name()
                );
            }
        }
    }

    #[test]
    fn lookback_length_sets_last_slot(closes in arb_closes(45, 46)) {
        for ind in suite().indicators() {
            let candles = candles_from(&closes[..ind.lookback()]);
            let out = ind.compute(&candles);
            let first_key = ind.keys()[0];
            prop_assert!(
                out.get(first_key, candles.len() - 1).is_some(),
                "{} unset at exactly lookback candles", ind.name()
            );
        }
    }
}

// ── 3. Purity ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn compute_is_idempotent(closes in arb_closes(50, 120)) {
        let candles = candles_from(&closes);
        let s = suite();
        prop_assert_eq!(s.compute(&candles), s.compute(&candles));
    }
}

// ── 4. No look-ahead ─────────────────────────────────────────────────

proptest! {
    #[test]
    fn prefix_values_do_not_change(closes in arb_closes(60, 120), cut in 0.3..0.9_f64) {
        let candles = candles_from(&closes);
        let prefix_len = ((candles.len() as f64) * cut) as usize;
        let s = suite();
        let full = s.compute(&candles);
        let prefix = s.compute(&candles[..prefix_len]);
        for key in prefix.keys() {
            let a = prefix.get_series(key).unwrap();
            let b = &full.get_series(key).unwrap()[..prefix_len];
            prop_assert_eq!(a, b, "look-ahead in {}", key);
        }
    }
}

// ── 5. Bounds ────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn oscillators_stay_in_range(closes in arb_closes(50, 150)) {
        let out = suite().compute(&candles_from(&closes));
        let within = |key: &str, lo: f64, hi: f64| {
            out.get_series(key)
                .unwrap()
                .iter()
                .flatten()
                .all(|v| *v >= lo - 1e-9 && *v <= hi + 1e-9)
        };
        prop_assert!(within("cmo", -100.0, 100.0));
        prop_assert!(within("stoch_k", 0.0, 100.0));
        prop_assert!(within("stoch_d", 0.0, 100.0));
        prop_assert!(within("rsi", 0.0, 100.0));
        prop_assert!(within("stoch_rsi_k", 0.0, 100.0));
        prop_assert!(within("stoch_rsi_d", 0.0, 100.0));
        prop_assert!(within("williams_r", -100.0, 0.0));
        prop_assert!(within("coral_trend", -1.0, 1.0));
        // |atanh(0.999)| < 3.81
        prop_assert!(within("fisher", -3.81, 3.81));
    }
}
