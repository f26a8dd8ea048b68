//! Module implementing fixed-bucket-count histograms over a value range.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::matrix;

/// Represents a histogram with a fixed number of equal-width buckets over
/// `[lower_bound, upper_bound]`.
///
/// Buckets partition the range half-open, except that values at the upper
/// bound fall into the last bucket; values outside the range are clamped into
/// the edge buckets.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Histogram {
    lower_bound: f64,
    upper_bound: f64,
    counts: Vec<usize>,
    data_count: usize,
}

impl Histogram {
    /// Create a histogram of the given values, binned over their observed range.
    /// The function returns an error for an empty value sequence or a zero bucket count.
    pub fn build(values: &[f64], bucket_count: usize) -> Result<Self, AnalysisError> {
        let (lower_bound, upper_bound) = matrix::min_max(values)?;
        Histogram::with_bounds(values, bucket_count, lower_bound, upper_bound)
    }

    /// Create a histogram of the given values over explicit bounds, so that
    /// several histograms can share one binning. The value sequence may be
    /// empty, yielding all-zero counts.
    /// The function returns an error for a zero bucket count or invalid bounds.
    pub fn with_bounds(
        values: &[f64],
        bucket_count: usize,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<Self, AnalysisError> {
        if bucket_count == 0 {
            return Err(AnalysisError::InvalidParameter(
                "The bucket count must be at least one.".to_string(),
            ));
        }
        if !lower_bound.is_finite() || !upper_bound.is_finite() || lower_bound > upper_bound {
            return Err(AnalysisError::InvalidParameter(format!(
                "The bounds must be finite with {} <= {}.",
                lower_bound, upper_bound
            )));
        }

        let span = upper_bound - lower_bound;
        let mut counts = vec![0; bucket_count];
        for &value in values {
            let index = if span <= 0.0 {
                0
            } else {
                let position = (value - lower_bound) / span * bucket_count as f64;
                (position.floor() as i64).clamp(0, bucket_count as i64 - 1) as usize
            };
            counts[index] += 1;
        }

        Ok(Histogram {
            lower_bound,
            upper_bound,
            counts,
            data_count: values.len(),
        })
    }

    /// Returns the lower bound of the covered value range.
    pub fn lower_bound(&self) -> f64 {
        self.lower_bound
    }

    /// Returns the upper bound of the covered value range.
    pub fn upper_bound(&self) -> f64 {
        self.upper_bound
    }

    /// Returns the number of buckets.
    pub fn bucket_count(&self) -> usize {
        self.counts.len()
    }

    /// Returns the width of a single bucket.
    pub fn bucket_width(&self) -> f64 {
        (self.upper_bound - self.lower_bound) / self.bucket_count() as f64
    }

    /// Returns the per-bucket counts.
    pub fn counts(&self) -> &[usize] {
        &self.counts[..]
    }

    /// Returns the number of binned values.
    pub fn data_count(&self) -> usize {
        self.data_count
    }

    /// Returns the center value of every bucket.
    pub fn bucket_centers(&self) -> Vec<f64> {
        let width = self.bucket_width();
        (0..self.bucket_count())
            .map(|index| self.lower_bound + width * (index as f64 + 0.5))
            .collect()
    }

    /// Returns the per-bucket counts normalized by the number of binned values,
    /// or all zeros for a histogram holding no values.
    pub fn relative_counts(&self) -> Vec<f64> {
        if self.data_count == 0 {
            return vec![0.0; self.bucket_count()];
        }
        self.counts
            .iter()
            .map(|&count| count as f64 / self.data_count as f64)
            .collect()
    }

    /// Returns true when the other histogram uses the same bucket count and bounds.
    pub fn same_binning(&self, other: &Histogram) -> bool {
        self.bucket_count() == other.bucket_count()
            && self.lower_bound == other.lower_bound
            && self.upper_bound == other.upper_bound
    }
}
