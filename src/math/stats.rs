//! Summary statistics over plain `f64` samples.

/// Arithmetic mean; `None` for an empty sample.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (`n - 1` denominator).
///
/// A single value has a standard deviation of 0; an empty sample has none.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    if values.len() < 2 {
        return Some(0.0);
    }
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Round to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_dev_uses_sample_denominator() {
        let sd = sample_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        // Population sd of this sample is exactly 2; sample sd is sqrt(32/7).
        assert!((sd - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn degenerate_samples() {
        assert_eq!(mean(&[]), None);
        assert_eq!(sample_std_dev(&[]), None);
        assert_eq!(sample_std_dev(&[42.0]), Some(0.0));
        assert_eq!(sample_std_dev(&[3.0, 3.0, 3.0]), Some(0.0));
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(10.0 / 3.0, 2), 3.33);
        assert_eq!(round_to(2.0 / 3.0, 2), 0.67);
        assert_eq!(round_to(10.0, 2), 10.0);
    }
}
