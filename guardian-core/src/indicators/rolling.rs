//! Rolling-window primitives shared by the concrete indicators.
//!
//! All functions are causal and NaN-propagating: a window containing a NaN
//! yields NaN.

/// Rolling mean over `period` values; NaN until the window is full.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    rolling_sum(values, period)
        .into_iter()
        .map(|s| s / period as f64)
        .collect()
}

/// Rolling sum over `period` values; NaN until the window is full.
pub fn rolling_sum(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 || n < period {
        return result;
    }

    let mut sum = 0.0;
    let mut nan_count = 0usize;
    for (i, &v) in values.iter().enumerate() {
        if v.is_nan() {
            nan_count += 1;
        } else {
            sum += v;
        }
        if i >= period {
            let leaving = values[i - period];
            if leaving.is_nan() {
                nan_count -= 1;
            } else {
                sum -= leaving;
            }
        }
        if i + 1 >= period && nan_count == 0 {
            result[i] = sum;
        }
    }

    // Re-sum each defined window to shed accumulated float drift on long series.
    if n > 4 * period {
        for i in (period - 1)..n {
            if !result[i].is_nan() {
                result[i] = values[(i + 1 - period)..=i].iter().sum();
            }
        }
    }
    result
}

/// Maximum over the `period` values ending `shift` bars before each index.
///
/// `shift = 1` gives the prior-bars-only window used for stop levels.
pub fn rolling_max(values: &[f64], period: usize, shift: usize) -> Vec<f64> {
    rolling_extreme(values, period, shift, f64::max)
}

/// Minimum over the `period` values ending `shift` bars before each index.
pub fn rolling_min(values: &[f64], period: usize, shift: usize) -> Vec<f64> {
    rolling_extreme(values, period, shift, f64::min)
}

fn rolling_extreme(
    values: &[f64],
    period: usize,
    shift: usize,
    pick: fn(f64, f64) -> f64,
) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    if period == 0 {
        return result;
    }
    for i in (period - 1 + shift)..n {
        let end = i - shift;
        let window = &values[(end + 1 - period)..=end];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = window.iter().copied().reduce(pick).unwrap_or(f64::NAN);
    }
    result
}

/// Percentage change over `period` bars: (v[t] / v[t-period] - 1) x 100.
///
/// NaN when the base value is zero.
pub fn pct_change(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];
    for i in period..n {
        let base = values[i - period];
        if base != 0.0 && base.is_finite() && values[i].is_finite() {
            result[i] = (values[i] / base - 1.0) * 100.0;
        }
    }
    result
}
