//! Descriptive statistics per parameter

use serde::Serialize;

/// Summary of one (parameter, unit) series. Count, min, max and mean come
/// from SQL aggregates; the distribution figures are computed here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterStatistics {
    pub parameter_name: String,
    pub unit: Option<String>,
    pub data_points: i64,
    pub min_value: f64,
    pub max_value: f64,
    pub avg_value: f64,
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
    pub std_dev: f64,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

/// Median, quartiles and sample standard deviation of a value set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Distribution {
    pub median: f64,
    pub q1: f64,
    pub q3: f64,
    pub std_dev: f64,
}

impl Distribution {
    /// `None` for an empty set. Sorts `values` in place.
    pub fn of(values: &mut [f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        Some(Self {
            median: quantile(values, 0.5)?,
            q1: quantile(values, 0.25)?,
            q3: quantile(values, 0.75)?,
            std_dev: sample_std_dev(values, mean),
        })
    }
}

/// Quantile of sorted data, interpolating linearly between the closest
/// ranks at position `(n - 1) * p`.
pub fn quantile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return None;
    }
    let pos = (sorted.len() - 1) as f64 * p;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Standard deviation with `n - 1` in the denominator; 0 below two values.
pub fn sample_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_quartiles_even_count() {
        let mut values = vec![4.0, 1.0, 3.0, 2.0];
        let d = Distribution::of(&mut values).unwrap();
        assert!(close(d.median, 2.5));
        assert!(close(d.q1, 1.75));
        assert!(close(d.q3, 3.25));
    }

    #[test]
    fn test_quartiles_odd_count() {
        let sorted = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(quantile(&sorted, 0.5), Some(3.0));
        assert_eq!(quantile(&sorted, 0.25), Some(2.0));
        assert_eq!(quantile(&sorted, 0.75), Some(4.0));
        assert_eq!(quantile(&sorted, 0.0), Some(1.0));
        assert_eq!(quantile(&sorted, 1.0), Some(5.0));
    }

    #[test]
    fn test_sample_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let std = sample_std_dev(&values, 5.0);
        assert!((std - (32.0f64 / 7.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_single_point() {
        let mut values = vec![42.0];
        let d = Distribution::of(&mut values).unwrap();
        assert_eq!(d.median, 42.0);
        assert_eq!(d.q1, 42.0);
        assert_eq!(d.std_dev, 0.0);
        assert!(Distribution::of(&mut []).is_none());
    }
}
