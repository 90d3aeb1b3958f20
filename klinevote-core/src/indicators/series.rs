//! Smoothing primitives over plain and partially-set series.
//!
//! `Option<f64>` slots mark warm-up; a `None` inside a window makes that
//! window's output `None` as well.

/// Exponential moving average of a fully-set series.
///
/// Seed: `ema[period-1]` = SMA of the first `period` values.
/// Recursive: `ema[t] = alpha * x[t] + (1 - alpha) * ema[t-1]`, alpha = 2/(period+1).
pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];

    if n < period || period == 0 {
        return result;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let seed = values[..period].iter().sum::<f64>() / period as f64;
    result[period - 1] = Some(seed);

    let mut prev = seed;
    for i in period..n {
        let next = alpha * values[i] + (1.0 - alpha) * prev;
        result[i] = Some(next);
        prev = next;
    }

    result
}

/// EMA of a series with a warm-up prefix.
///
/// Runs `ema` over the contiguous set run that starts at the first `Some`;
/// slots after that run ends stay `None`.
pub fn ema_opt(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];

    let Some((start, run)) = first_run(values) else {
        return result;
    };

    for (i, v) in ema(&run, period).into_iter().enumerate() {
        result[start + i] = v;
    }
    result
}

/// Simple moving average; a window containing any `None` yields `None`.
pub fn sma_opt(values: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut result = vec![None; n];

    if period == 0 || n < period {
        return result;
    }

    for i in (period - 1)..n {
        let window = &values[i + 1 - period..=i];
        if let Some(sum) = window.iter().copied().sum::<Option<f64>>() {
            result[i] = Some(sum / period as f64);
        }
    }
    result
}

/// Lowest and highest value in `values[end + 1 - len ..= end]`.
///
/// Caller guarantees `end + 1 >= len` and `len >= 1`.
pub fn window_min_max(values: &[f64], end: usize, len: usize) -> (f64, f64) {
    values[end + 1 - len..=end]
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

/// Start index and values of the first contiguous run of set slots.
fn first_run(values: &[Option<f64>]) -> Option<(usize, Vec<f64>)> {
    let start = values.iter().position(|v| v.is_some())?;
    let run: Vec<f64> = values[start..].iter().map_while(|v| *v).collect();
    Some((start, run))
}
