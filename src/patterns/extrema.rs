//! Local extrema over a value series.
//!
//! An index is a minimum (maximum) when its value is `<=` (`>=`) every
//! neighbor within `order` positions, with the neighborhood clamped at the
//! array bounds. Equal plateau values all qualify, so consumers must expect
//! runs of adjacent extrema on flat data.

/// Indices whose value is `<=` every neighbor within `order` positions.
pub fn local_minima(values: &[f64], order: usize) -> Vec<usize> {
    extrema(values, order, |candidate, neighbor| candidate <= neighbor)
}

/// Indices whose value is `>=` every neighbor within `order` positions.
pub fn local_maxima(values: &[f64], order: usize) -> Vec<usize> {
    extrema(values, order, |candidate, neighbor| candidate >= neighbor)
}

fn extrema(values: &[f64], order: usize, keep: impl Fn(f64, f64) -> bool) -> Vec<usize> {
    let n = values.len();
    let mut out = Vec::new();
    for i in 0..n {
        let lo = i.saturating_sub(order);
        let hi = (i + order).min(n.saturating_sub(1));
        if (lo..=hi).all(|j| keep(values[i], values[j])) {
            out.push(i);
        }
    }
    out
}
