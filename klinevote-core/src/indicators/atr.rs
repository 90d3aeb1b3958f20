//! True range and Wilder smoothing, the building blocks of ATR.
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|).
//! The first candle has no previous close, so `tr[0]` is unset.
//! Wilder smoothing is an EMA with alpha = 1/period, seeded with the mean of
//! the first `period` set values.

use crate::domain::Candle;

/// True Range series aligned with `candles`.
pub fn true_range(candles: &[Candle]) -> Vec<Option<f64>> {
    let mut tr = vec![None; candles.len()];
    for (i, pair) in candles.windows(2).enumerate() {
        let (prev, cur) = (&pair[0], &pair[1]);
        let range = (cur.high - cur.low)
            .max((cur.high - prev.close).abs())
            .max((cur.low - prev.close).abs());
        tr[i + 1] = Some(range);
    }
    tr
}

/// Wilder-smoothed series.
///
/// The seed window begins at the first set slot; the output stops at the
/// first gap after it.
pub fn wilder_smooth(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];

    if period == 0 {
        return result;
    }
    let Some(start) = values.iter().position(|v| v.is_some()) else {
        return result;
    };
    if n - start < period {
        return result;
    }

    let Some(sum) = values[start..start + period].iter().copied().sum::<Option<f64>>() else {
        return result;
    };
    let mut prev = sum / period as f64;
    result[start + period - 1] = Some(prev);

    let alpha = 1.0 / period as f64;
    for i in (start + period)..n {
        let Some(v) = values[i] else {
            break;
        };
        prev = alpha * v + (1.0 - alpha) * prev;
        result[i] = Some(prev);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_some_approx, make_candles, DEFAULT_EPSILON};

    #[test]
    fn true_range_first_is_unset() {
        let candles = make_candles(&[100.0, 102.0]);
        let tr = true_range(&candles);
        assert_eq!(tr[0], None);
        // candle 1: open 100, close 102 → high 103, low 99; prev close 100
        assert_some_approx(tr[1], 4.0, DEFAULT_EPSILON);
    }

    #[test]
    fn true_range_uses_gap_from_prev_close() {
        let mut candles = make_candles(&[100.0, 100.0]);
        candles[1].high = 95.0;
        candles[1].low = 94.0;
        let tr = true_range(&candles);
        // |low - prev_close| = 6 dominates high - low = 1
        assert_some_approx(tr[1], 6.0, DEFAULT_EPSILON);
    }

    #[test]
    fn wilder_known_values() {
        // seed mean(2, 4) = 3; then 3 + (6 - 3)/2 = 4.5
        let values = [None, Some(2.0), Some(4.0), Some(6.0)];
        let result = wilder_smooth(&values, 2);
        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_some_approx(result[2], 3.0, DEFAULT_EPSILON);
        assert_some_approx(result[3], 4.5, DEFAULT_EPSILON);
    }

    #[test]
    fn wilder_short_input_is_unset() {
        let result = wilder_smooth(&[None, Some(1.0)], 2);
        assert!(result.iter().all(|v| v.is_none()));
    }

    #[test]
    fn wilder_constant_series() {
        let values = vec![Some(5.0); 10];
        let result = wilder_smooth(&values, 3);
        for v in result.iter().skip(2) {
            assert_some_approx(*v, 5.0, DEFAULT_EPSILON);
        }
    }
}
