//! Window arithmetic shared by the metrics, fatigue and prop engines.

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Mean of the trailing `window` values ending at `end` (inclusive).
///
/// The window shrinks to the available history near the start of the
/// series. Returns the mean and the number of values actually used.
/// Callers guarantee `end < values.len()` and `window > 0`.
pub fn trailing_mean(values: &[f64], end: usize, window: usize) -> (f64, usize) {
    let start = (end + 1).saturating_sub(window);
    let slice = &values[start..=end];
    (slice.iter().sum::<f64>() / slice.len() as f64, slice.len())
}

/// Trailing rolling mean at every index (minimum one observation).
pub fn rolling_means(values: &[f64], window: usize) -> Vec<f64> {
    (0..values.len())
        .map(|i| trailing_mean(values, i, window).0)
        .collect()
}

/// Mean of the last `window` values (or all of them when fewer exist).
pub fn tail_mean(values: &[f64], window: usize) -> Option<(f64, usize)> {
    if values.is_empty() || window == 0 {
        return None;
    }
    Some(trailing_mean(values, values.len() - 1, window))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_trailing_mean_shrinks_at_start() {
        let values = [10.0, 20.0, 30.0];
        assert_eq!(trailing_mean(&values, 0, 2), (10.0, 1));
        assert_eq!(trailing_mean(&values, 2, 2), (25.0, 2));
    }

    #[test]
    fn test_rolling_means_match_manual() {
        let values = [2.0, 4.0, 6.0, 8.0];
        assert_eq!(rolling_means(&values, 3), vec![2.0, 3.0, 4.0, 6.0]);
    }

    #[test]
    fn test_tail_mean_partial() {
        assert_eq!(tail_mean(&[1.0, 3.0], 5), Some((2.0, 2)));
        assert_eq!(tail_mean(&[1.0, 3.0], 0), None);
    }
}
