//! Statistics kernel
//!
//! Pure numeric helpers over bounded usage series. All helpers require a
//! non-empty slice; minimum-length gating for the analysis operations is the
//! caller's responsibility. `growth_rate` and `volatility` saturate to 0 on a
//! zero denominator so downstream classification stays total.

use serde::{Deserialize, Serialize};

/// Arithmetic mean of a non-empty series.
///
/// # Panics
/// Panics on an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    assert!(!values.is_empty(), "mean of empty series");
    values.iter().sum::<f64>() / values.len() as f64
}

/// Maximum of a non-empty series.
///
/// # Panics
/// Panics on an empty slice.
pub fn max(values: &[f64]) -> f64 {
    assert!(!values.is_empty(), "max of empty series");
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Minimum of a non-empty series.
///
/// # Panics
/// Panics on an empty slice.
pub fn min(values: &[f64]) -> f64 {
    assert!(!values.is_empty(), "min of empty series");
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

/// Spread of the series, defined as max minus min.
///
/// # Panics
/// Panics on an empty slice.
pub fn variance(values: &[f64]) -> f64 {
    max(values) - min(values)
}

/// Relative growth from the first to the last sample; 0 when `first` is 0.
pub fn growth_rate(first: f64, last: f64) -> f64 {
    if first == 0.0 {
        return 0.0;
    }
    (last - first) / first
}

/// Spread relative to the average; 0 when `average` is 0.
pub fn volatility(variance: f64, average: f64) -> f64 {
    if average == 0.0 {
        return 0.0;
    }
    variance / average
}

/// All derived statistics for one series, computed in a single pass over the
/// helpers above. Ephemeral; never cached by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub average: f64,
    pub maximum: f64,
    pub minimum: f64,
    pub variance: f64,
    pub growth_rate: f64,
    pub volatility: f64,
}

impl Statistics {
    /// # Panics
    /// Panics on an empty slice.
    pub fn from_series(values: &[f64]) -> Self {
        let average = mean(values);
        let maximum = max(values);
        let minimum = min(values);
        let spread = maximum - minimum;
        Self {
            average,
            maximum,
            minimum,
            variance: spread,
            growth_rate: growth_rate(values[0], values[values.len() - 1]),
            volatility: volatility(spread, average),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_helpers() {
        let series = [5.2, 4.8, 6.1, 92.5, 5.9];
        assert!((mean(&series) - 22.9).abs() < 1e-9);
        assert!((max(&series) - 92.5).abs() < 1e-12);
        assert!((min(&series) - 4.8).abs() < 1e-12);
        assert!((variance(&series) - 87.7).abs() < 1e-9);
    }

    #[test]
    fn growth_rate_guards_zero_denominator() {
        assert_eq!(growth_rate(0.0, 100.0), 0.0);
        assert!((growth_rate(100.0, 450.0) - 3.5).abs() < 1e-12);
        assert!((growth_rate(200.0, 100.0) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn volatility_guards_zero_denominator() {
        assert_eq!(volatility(50.0, 0.0), 0.0);
        assert!((volatility(50.0, 100.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn statistics_from_series() {
        let stats = Statistics::from_series(&[100.0, 150.0, 200.0, 280.0, 350.0, 450.0]);
        assert!((stats.average - 255.0).abs() < 1e-9);
        assert!((stats.growth_rate - 3.5).abs() < 1e-12);
        assert!((stats.variance - 350.0).abs() < 1e-12);
        assert!((stats.volatility - 350.0 / 255.0).abs() < 1e-9);
    }

    #[test]
    #[should_panic(expected = "empty series")]
    fn mean_rejects_empty_input() {
        let _ = mean(&[]);
    }
}
