//! Module implementing receptive-field match values and response histograms.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::convolution::Kernel;
use crate::ensemble;
use crate::error::AnalysisError;
use crate::histogram::Histogram;
use crate::spike_train::{RoundStrategy, SpikeTrain};
use crate::sta;
use crate::stimulus::Stimulus;

/// The order of the matrix product reducing a stimulus window against the
/// receptive field.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum MatchOperation {
    /// Multiply the receptive field on the left of the transposed window.
    FilterStimuli,
    /// Multiply the transposed window on the left of the receptive field.
    StimuliFilter,
}

/// A match-value histogram together with the raw match values it was binned
/// from, the latter kept for downstream curve fitting and diagnostics.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ResponseHistogram {
    histogram: Histogram,
    match_values: Vec<f64>,
}

impl ResponseHistogram {
    /// Create a response histogram from its parts.
    pub fn new(histogram: Histogram, match_values: Vec<f64>) -> Self {
        ResponseHistogram {
            histogram,
            match_values,
        }
    }

    /// Returns the binned match values.
    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    /// Returns the raw match values.
    pub fn match_values(&self) -> &[f64] {
        &self.match_values[..]
    }
}

/// Computes the match value of every sliding stimulus window against the
/// receptive field.
///
/// For each window position `i` in `[0, len(frames) - dim)` (`dim` being the
/// number of receptive-field rows), the window stacks the `dim` frames ending
/// at `i + dim - 1` in reverse chronological order, i.e., its row `k` is
/// `frames[dim - 1 - k + i]`. The window is matrix-multiplied against the
/// receptive field in the order selected by `operation` and the product is
/// reduced to the mean of its entries.
///
/// The function returns an error for an empty receptive field or mismatched
/// row lengths.
pub fn match_values<F: AsRef<[f64]>>(
    frames: &[F],
    receptive_field: &[Vec<f64>],
    operation: MatchOperation,
) -> Result<Vec<f64>, AnalysisError> {
    let dim = receptive_field.len();
    if dim == 0 {
        return Err(AnalysisError::EmptyInput(
            "The receptive field must contain at least one row.".to_string(),
        ));
    }
    let space = receptive_field[0].len();
    if space == 0 {
        return Err(AnalysisError::EmptyInput(
            "The receptive field rows must contain at least one value.".to_string(),
        ));
    }
    for row in receptive_field.iter() {
        if row.len() != space {
            return Err(AnalysisError::DimensionMismatch(format!(
                "Expected receptive field rows of length {}, found {}.",
                space,
                row.len()
            )));
        }
    }
    for frame in frames.iter() {
        if frame.as_ref().len() != space {
            return Err(AnalysisError::DimensionMismatch(format!(
                "Expected frames of length {}, found {}.",
                space,
                frame.as_ref().len()
            )));
        }
    }

    let values = (0..frames.len().saturating_sub(dim))
        .map(|i| {
            let window: Vec<&[f64]> = (0..dim).map(|k| frames[dim - 1 - k + i].as_ref()).collect();
            match operation {
                MatchOperation::FilterStimuli => {
                    // Mean of the entries of field * window^T
                    let mut acc = 0.0;
                    for field_row in receptive_field.iter() {
                        for window_row in window.iter() {
                            acc += inner(field_row, window_row);
                        }
                    }
                    acc / (dim * dim) as f64
                }
                MatchOperation::StimuliFilter => {
                    // Mean of the entries of window^T * field
                    let mut acc = 0.0;
                    for (window_row, field_row) in window.iter().zip(receptive_field.iter()) {
                        acc += window_row.iter().sum::<f64>() * field_row.iter().sum::<f64>();
                    }
                    acc / (space * space) as f64
                }
            }
        })
        .collect();
    Ok(values)
}

/// Computes the distribution of receptive-field match values as a histogram.
///
/// The receptive field is estimated from the full recording (4-parameter shape
/// of [`sta::receptive_field`]), the frame sequence is matched against it, and
/// the match values are binned over their observed range.
///
/// # Parameters
/// - `for_spike_triggered_stimuli_only`: when true, only the spike-triggered
///   ensemble at `offset` is scanned for match values, yielding the
///   distribution conditioned on a spike; when false, the full raw stimulus
///   sequence is scanned.
/// - `offset`, `max_lags`, `strategy`, `smooth_kernel`,
///   `use_dynamic_divisor_for_edges`: receptive-field parameters, see
///   [`sta::receptive_field`].
/// - `operation`: the product order reducing windows against the field.
/// - `bucket_count`: the number of histogram buckets.
pub fn response_histogram(
    stimulus: &Stimulus,
    spike_trains: &[SpikeTrain],
    for_spike_triggered_stimuli_only: bool,
    offset: i64,
    max_lags: usize,
    strategy: RoundStrategy,
    operation: MatchOperation,
    smooth_kernel: Option<&Kernel>,
    use_dynamic_divisor_for_edges: bool,
    bucket_count: usize,
) -> Result<ResponseHistogram, AnalysisError> {
    let receptive_field = sta::receptive_field(
        stimulus,
        spike_trains,
        offset,
        max_lags,
        strategy,
        smooth_kernel,
        use_dynamic_divisor_for_edges,
    )?;

    let values = if for_spike_triggered_stimuli_only {
        let ensemble = ensemble::collect(stimulus, spike_trains, offset, strategy)?;
        debug!(
            "Matching {} spike-triggered frames against the receptive field",
            ensemble.len()
        );
        match_values(&ensemble, &receptive_field, operation)?
    } else {
        match_values(stimulus.frames(), &receptive_field, operation)?
    };

    let histogram = Histogram::build(&values, bucket_count)?;
    Ok(ResponseHistogram::new(histogram, values))
}

fn inner(x: &[f64], y: &[f64]) -> f64 {
    x.iter().zip(y.iter()).map(|(xi, yi)| xi * yi).sum()
}
