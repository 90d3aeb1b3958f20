//! Property tests for the candle-close scheduler.
//!
//! 1. Retry bound: retry_count never reaches max_retries after any call
//! 2. Progress: after mark_analyzed the expectation is past the confirmed close
//! 3. Poll delay: always within [min_poll, max(idle, interval + buffer)],
//!    and at most idle while a configured timeframe is unarmed

use proptest::prelude::*;
use std::time::Duration;
use klinevote_core::domain::{Candle, Timeframe};
use klinevote_core::schedule::{CloseCheck, ScheduleConfig, Scheduler};

const T0: i64 = 1_700_000_100_000;

fn active_candle(close_time: i64, tf: Timeframe) -> Candle {
    Candle {
        open_time: close_time - tf.interval_ms(),
        open: 1.0,
        high: 1.0,
        low: 1.0,
        close: 1.0,
        volume: 0.0,
        close_time,
    }
}

fn arb_timeframe() -> impl Strategy<Value = Timeframe> {
    prop::sample::select(Timeframe::ALL.to_vec())
}

#[derive(Debug, Clone)]
enum Step {
    /// Offset of the last completed close relative to the expectation, in intervals.
    Check(i64),
    Defer,
}

fn arb_step() -> impl Strategy<Value = Step> {
    prop_oneof![(-3i64..4).prop_map(Step::Check), Just(Step::Defer)]
}

// ── 1. Retry bound ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn retry_count_stays_below_budget(
        tf in arb_timeframe(),
        steps in prop::collection::vec(arb_step(), 1..60),
    ) {
        let config = ScheduleConfig::default();
        let max = config.max_retries;
        let mut s = Scheduler::new(&[tf], config);
        s.initialize(tf, &[active_candle(T0, tf)]);

        for step in steps {
            let expected = s.state(tf).unwrap().next_expected_close;
            let before = expected;
            let check = match step {
                Step::Check(k) => s.confirm_close(tf, expected + k * tf.interval_ms()),
                Step::Defer => s.defer(tf),
            };
            let state = *s.state(tf).unwrap();
            prop_assert!(state.retry_count < max);
            match check {
                CloseCheck::Confirmed => {
                    prop_assert_eq!(state.retry_count, 0);
                    s.mark_analyzed(tf, expected);
                }
                CloseCheck::Stale { retry_count } => {
                    prop_assert_eq!(retry_count, state.retry_count);
                    prop_assert_eq!(state.next_expected_close, before);
                }
                CloseCheck::Skipped { skipped_close } => {
                    prop_assert_eq!(skipped_close, before);
                    prop_assert_eq!(state.next_expected_close, before + tf.interval_ms());
                }
            }
        }
    }
}

// ── 2. Progress ──────────────────────────────────────────────────────

proptest! {
    #[test]
    fn analyzed_candle_is_never_due_again(
        tf in arb_timeframe(),
        lag in 0i64..10,
    ) {
        let mut s = Scheduler::new(&[tf], ScheduleConfig::default());
        s.initialize(tf, &[active_candle(T0, tf)]);
        let confirmed = T0 + lag * tf.interval_ms();
        prop_assert_eq!(s.confirm_close(tf, confirmed), CloseCheck::Confirmed);
        s.mark_analyzed(tf, confirmed);
        let next = s.state(tf).unwrap().next_expected_close;
        prop_assert!(next > confirmed);
        prop_assert!(next - confirmed <= tf.interval_ms());
        prop_assert_eq!(s.confirm_close(tf, confirmed), CloseCheck::Stale { retry_count: 1 });
    }
}

// ── 3. Poll delay ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn poll_delay_is_bounded(
        tfs in prop::collection::vec(arb_timeframe(), 1..5),
        offsets in prop::collection::vec(0i64..86_400_000, 5),
        now_offset in -100_000_000i64..100_000_000,
    ) {
        let config = ScheduleConfig::default();
        let mut s = Scheduler::new(&tfs, config.clone());
        for (tf, off) in tfs.iter().zip(&offsets) {
            s.initialize(*tf, &[active_candle(T0 + off, *tf)]);
        }
        let delay = s.next_poll_delay(T0 + now_offset);
        let longest = 86_400_000 + config.close_buffer_ms as u64 + 100_000_000;
        prop_assert!(delay >= Duration::from_millis(config.min_poll_ms));
        prop_assert!(delay <= Duration::from_millis(longest));
    }
}

proptest! {
    #[test]
    fn unarmed_timeframe_keeps_polling_on_idle_cadence(
        armed in arb_timeframe(),
        offset in 0i64..86_400_000,
        now_offset in -100_000_000i64..100_000_000,
    ) {
        let config = ScheduleConfig::default();
        let unarmed = if armed == Timeframe::M5 { Timeframe::H1 } else { Timeframe::M5 };
        let mut s = Scheduler::new(&[armed, unarmed], config.clone());
        s.initialize(armed, &[active_candle(T0 + offset, armed)]);
        prop_assert_eq!(s.uninitialized(), vec![unarmed]);
        let delay = s.next_poll_delay(T0 + now_offset);
        prop_assert!(delay <= Duration::from_millis(config.idle_poll_ms));
        prop_assert!(delay >= Duration::from_millis(config.min_poll_ms));
    }
}
