//! Module implementing the firing-rate nonlinearity estimate.

use itertools::izip;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::histogram::Histogram;

/// The estimated static nonlinearity of a cell, as an ordered curve of
/// (match value, firing rate estimate) pairs aligned to histogram bucket
/// centers.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Nonlinearity {
    points: Vec<(f64, f64)>,
}

impl Nonlinearity {
    /// Create a nonlinearity curve from its points.
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Nonlinearity { points }
    }

    /// Returns the points of the curve.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points[..]
    }
}

/// Estimates the firing-rate nonlinearity from the raw and spike-triggered
/// match-value histograms via Bayes' rule.
///
/// Per bucket, `P(spike | x)` is approximated as the ratio of the
/// spike-triggered relative count to the raw relative count, scaled by the
/// overall mean firing rate (spike-triggered samples per raw sample). Buckets
/// with a zero raw count report exactly zero; stimulus regions that were never
/// shown support no estimate.
///
/// The two histograms must share one binning. The function returns an error
/// when the binnings differ or when the raw histogram holds no samples.
pub fn estimate(
    raw: &Histogram,
    spike_triggered: &Histogram,
) -> Result<Nonlinearity, AnalysisError> {
    if !raw.same_binning(spike_triggered) {
        return Err(AnalysisError::DimensionMismatch(format!(
            "The histograms must share one binning, got {} buckets over [{}, {}] against {} buckets over [{}, {}].",
            raw.bucket_count(),
            raw.lower_bound(),
            raw.upper_bound(),
            spike_triggered.bucket_count(),
            spike_triggered.lower_bound(),
            spike_triggered.upper_bound()
        )));
    }
    if raw.data_count() == 0 {
        return Err(AnalysisError::DivisionByZero(
            "The raw histogram holds no samples.".to_string(),
        ));
    }

    let mean_rate = spike_triggered.data_count() as f64 / raw.data_count() as f64;
    let points = izip!(
        raw.bucket_centers(),
        raw.counts(),
        spike_triggered.relative_counts()
    )
    .map(|(center, &raw_count, spike_triggered_relative)| {
        let rate = if raw_count == 0 {
            0.0
        } else {
            let raw_relative = raw_count as f64 / raw.data_count() as f64;
            spike_triggered_relative / raw_relative * mean_rate
        };
        (center, rate)
    })
    .collect();
    Ok(Nonlinearity::new(points))
}

/// Samples the Gaussian density with the given mean and variance at the
/// centers of `num_points` equal-width intervals spanning `[lower, upper]`,
/// matching the bucket centers of a histogram with the same bounds. Used to
/// overlay a normal fit on match-value histograms.
///
/// The function returns an error for a non-positive variance, invalid bounds
/// or zero points.
pub fn normal_density(
    mean: f64,
    variance: f64,
    num_points: usize,
    lower: f64,
    upper: f64,
) -> Result<Vec<(f64, f64)>, AnalysisError> {
    if !variance.is_finite() || variance <= 0.0 {
        return Err(AnalysisError::InvalidParameter(format!(
            "The variance must be a positive number, got {}.",
            variance
        )));
    }
    if num_points == 0 {
        return Err(AnalysisError::InvalidParameter(
            "The number of points must be at least one.".to_string(),
        ));
    }
    if !lower.is_finite() || !upper.is_finite() || lower > upper {
        return Err(AnalysisError::InvalidParameter(format!(
            "The bounds must be finite with {} <= {}.",
            lower, upper
        )));
    }

    let width = (upper - lower) / num_points as f64;
    let scale = 1.0 / (2.0 * std::f64::consts::PI * variance).sqrt();
    let points = (0..num_points)
        .map(|index| {
            let x = lower + width * (index as f64 + 0.5);
            let density = scale * (-(x - mean) * (x - mean) / (2.0 * variance)).exp();
            (x, density)
        })
        .collect();
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_estimate() {
        // Ten raw samples against four spike-triggered ones on a shared binning
        let raw = Histogram::with_bounds(
            &[0.1, 0.2, 0.3, 0.4, 1.2, 1.3, 1.4, 2.1, 2.2, 2.3],
            3,
            0.0,
            3.0,
        )
        .unwrap();
        let spike_triggered =
            Histogram::with_bounds(&[1.1, 2.1, 2.2, 2.3], 3, 0.0, 3.0).unwrap();

        let nonlinearity = estimate(&raw, &spike_triggered).unwrap();
        let points = nonlinearity.points();
        assert_eq!(points.len(), 3);

        // Mean rate is 4/10; per bucket the rate is (st/4) / (raw/10) * 0.4
        assert_relative_eq!(points[0].1, 0.0, epsilon = 1e-12);
        assert_relative_eq!(points[1].1, (0.25 / 0.3) * 0.4, epsilon = 1e-12);
        assert_relative_eq!(points[2].1, (0.75 / 0.3) * 0.4, epsilon = 1e-12);

        // The curve is aligned to the bucket centers
        assert_relative_eq!(points[0].0, 0.5, epsilon = 1e-12);
        assert_relative_eq!(points[2].0, 2.5, epsilon = 1e-12);
    }

    #[test]
    fn test_estimate_zero_raw_bucket() {
        // The middle bucket was never shown and must report exactly zero
        let raw = Histogram::with_bounds(&[0.5, 2.5], 3, 0.0, 3.0).unwrap();
        let spike_triggered = Histogram::with_bounds(&[1.5], 3, 0.0, 3.0).unwrap();

        let nonlinearity = estimate(&raw, &spike_triggered).unwrap();
        assert_eq!(nonlinearity.points()[1].1, 0.0);
        assert!(nonlinearity.points().iter().all(|(_, rate)| rate.is_finite()));
    }

    #[test]
    fn test_estimate_empty_spike_triggered() {
        let raw = Histogram::with_bounds(&[0.5, 1.5, 2.5], 3, 0.0, 3.0).unwrap();
        let spike_triggered = Histogram::with_bounds(&[], 3, 0.0, 3.0).unwrap();

        // No spikes: the curve is identically zero
        let nonlinearity = estimate(&raw, &spike_triggered).unwrap();
        assert!(nonlinearity.points().iter().all(|(_, rate)| *rate == 0.0));
    }

    #[test]
    fn test_estimate_invalid() {
        let raw = Histogram::with_bounds(&[0.5], 3, 0.0, 3.0).unwrap();

        // Test mismatched binnings
        let coarser = Histogram::with_bounds(&[0.5], 2, 0.0, 3.0).unwrap();
        let shifted = Histogram::with_bounds(&[0.5], 3, 0.0, 4.0).unwrap();
        assert!(matches!(
            estimate(&raw, &coarser),
            Err(AnalysisError::DimensionMismatch(_))
        ));
        assert!(matches!(
            estimate(&raw, &shifted),
            Err(AnalysisError::DimensionMismatch(_))
        ));

        // Test an empty raw histogram
        let empty = Histogram::with_bounds(&[], 3, 0.0, 3.0).unwrap();
        let spike_triggered = Histogram::with_bounds(&[1.5], 3, 0.0, 3.0).unwrap();
        assert!(matches!(
            estimate(&empty, &spike_triggered),
            Err(AnalysisError::DivisionByZero(_))
        ));
    }

    #[test]
    fn test_normal_density() {
        let points = normal_density(0.0, 1.0, 1000, -5.0, 5.0).unwrap();

        // The density peaks near the mean and integrates to one over a wide range
        let peak = points
            .iter()
            .map(|(_, density)| *density)
            .fold(f64::NEG_INFINITY, f64::max);
        assert_relative_eq!(peak, 1.0 / (2.0 * std::f64::consts::PI).sqrt(), epsilon = 1e-4);

        let integral: f64 = points.iter().map(|(_, density)| density * 0.01).sum();
        assert_relative_eq!(integral, 1.0, epsilon = 1e-4);

        // Test invalid parameters
        assert!(matches!(
            normal_density(0.0, 0.0, 10, -1.0, 1.0),
            Err(AnalysisError::InvalidParameter(_))
        ));
        assert!(matches!(
            normal_density(0.0, 1.0, 0, -1.0, 1.0),
            Err(AnalysisError::InvalidParameter(_))
        ));
        assert!(matches!(
            normal_density(0.0, 1.0, 10, 1.0, -1.0),
            Err(AnalysisError::InvalidParameter(_))
        ));
    }
}
