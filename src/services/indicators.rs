/// Exponentially weighted mean with span-based smoothing, without bias
/// adjustment (pandas `ewm(span, adjust=False).mean()`).
///
/// - `alpha = 2 / (span + 1)`
/// - `out[0] = values[0]`
/// - `out[i] = alpha * values[i] + (1 - alpha) * out[i - 1]`
///
/// Every position gets a value; there is no warm-up gap.
pub fn ewm_mean(values: &[f64], span: usize) -> Vec<f64> {
    if values.is_empty() || span == 0 {
        return Vec::new();
    }

    let alpha = 2.0 / (span as f64 + 1.0);

    values
        .iter()
        .scan(None::<f64>, move |prev, &v| {
            let next = match *prev {
                Some(p) => alpha * v + (1.0 - alpha) * p,
                None => v,
            };
            *prev = Some(next);
            Some(next)
        })
        .collect()
}

/// Mean absolute error between two equally long slices.
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ewm_first_value_is_seed() {
        let out = ewm_mean(&[10.0, 20.0, 30.0], 20);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0], 10.0);
    }

    #[test]
    fn test_ewm_known_values() {
        // span 3 -> alpha 0.5
        let out = ewm_mean(&[2.0, 4.0, 8.0, 8.0], 3);
        let expected = [2.0, 3.0, 5.5, 6.75];
        for (o, e) in out.iter().zip(expected.iter()) {
            assert!((o - e).abs() < 1e-12, "{} != {}", o, e);
        }
    }

    #[test]
    fn test_ewm_flat_series_stays_flat() {
        let out = ewm_mean(&vec![42.0; 50], 20);
        assert!(out.iter().all(|v| (v - 42.0).abs() < 1e-12));
    }

    #[test]
    fn test_ewm_uptrend_lags_price() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let out = ewm_mean(&prices, 20);
        let last = *out.last().unwrap();
        assert!(last < 139.0, "EMA should lag a rising series");
        assert!(last > 120.0);
    }

    #[test]
    fn test_ewm_empty_and_zero_span() {
        assert!(ewm_mean(&[], 20).is_empty());
        assert!(ewm_mean(&[1.0, 2.0], 0).is_empty());
    }

    #[test]
    fn test_mean_absolute_error() {
        assert_eq!(mean_absolute_error(&[1.0, 2.0, 3.0], &[2.0, 2.0, 1.0]), 1.0);
        assert_eq!(mean_absolute_error(&[], &[]), 0.0);
    }
}
