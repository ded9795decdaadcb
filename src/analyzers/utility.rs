/// Rounds to two decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Share of `part` in `total` as a percentage. `None` when `total` is zero.
pub fn pct(part: f64, total: f64) -> Option<f64> {
    if total == 0.0 {
        None
    } else {
        Some(part / total * 100.0)
    }
}

/// Same as [`pct`] for counts, with an empty total treated as 0%.
pub fn count_pct(part: usize, total: usize) -> f64 {
    pct(part as f64, total as f64).unwrap_or(0.0)
}
