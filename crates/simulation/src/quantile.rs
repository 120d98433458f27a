//! Type-7 percentile estimation with linear interpolation.

/// Percentile of `values` at probability `p`.
///
/// Input need not be sorted. `p` is clamped to `[0, 1]`. Empty input or a
/// non-finite `p` yields `NaN`, which callers propagate rather than coerce.
///
/// ```
/// use survival_simulation::quantile::percentile;
///
/// let values = [4.0, 1.0, 3.0, 2.0];
/// assert_eq!(percentile(&values, 0.0), 1.0);
/// assert_eq!(percentile(&values, 0.5), 2.5);
/// assert_eq!(percentile(&values, 1.0), 4.0);
/// ```
#[must_use]
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    percentile_sorted(&sorted, p)
}

/// Percentile of an ascending slice. See [`percentile`].
#[must_use]
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() || !p.is_finite() {
        return f64::NAN;
    }
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let idx = p.clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = idx.floor() as usize;
    let hi = (idx.ceil() as usize).min(n - 1);
    if lo == hi {
        return sorted[lo];
    }
    let frac = idx - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Several percentiles from one sort.
#[must_use]
pub fn percentiles<const N: usize>(values: &[f64], ps: [f64; N]) -> [f64; N] {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    ps.map(|p| percentile_sorted(&sorted, p))
}
