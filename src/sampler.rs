//! Module implementing synthetic recordings for pipeline validation.

use rand::Rng;
use rand_distr::{Bernoulli, Distribution};

use crate::error::AnalysisError;
use crate::spike_train::SpikeTrain;
use crate::stimulus::Stimulus;

/// Samples a binary white-noise stimulus with the specified shape.
///
/// Every frame value is drawn independently and uniformly from {-1, +1}.
pub fn rand_stimulus<R: Rng>(
    num_frames: usize,
    frame_len: usize,
    frame_interval: f64,
    rng: &mut R,
) -> Result<Stimulus, AnalysisError> {
    let frames = (0..num_frames)
        .map(|_| {
            (0..frame_len)
                .map(|_| if rng.gen::<bool>() { 1.0 } else { -1.0 })
                .collect()
        })
        .collect();
    Stimulus::build(frames, frame_interval)
}

/// Samples a spike train from a linear-nonlinear model cell watching the given
/// stimulus.
///
/// The planted filter follows the receptive-field row convention: its first
/// row acts on the frame furthest back in the history window, its last row on
/// the frame on display at spike time. At every frame with a complete history
/// window, the window is projected onto the filter, the projection is squashed
/// through the logistic function `1 / (1 + exp(-gain * (projection - threshold)))`,
/// and a Bernoulli draw with that probability decides whether the cell fires.
/// Spike times lie exactly on the frame grid.
///
/// The function returns an error for an empty filter, filter rows not matching
/// the frame length, or non-finite model parameters.
pub fn ln_spike_train<R: Rng>(
    stimulus: &Stimulus,
    cell_id: usize,
    filter: &[Vec<f64>],
    gain: f64,
    threshold: f64,
    rng: &mut R,
) -> Result<SpikeTrain, AnalysisError> {
    let dim = filter.len();
    if dim == 0 {
        return Err(AnalysisError::EmptyInput(
            "The planted filter must contain at least one row.".to_string(),
        ));
    }
    for row in filter.iter() {
        if row.len() != stimulus.frame_len() {
            return Err(AnalysisError::DimensionMismatch(format!(
                "Expected filter rows of length {}, found {}.",
                stimulus.frame_len(),
                row.len()
            )));
        }
    }
    if !gain.is_finite() || !threshold.is_finite() {
        return Err(AnalysisError::InvalidParameter(format!(
            "The gain and threshold must be finite, got {} and {}.",
            gain, threshold
        )));
    }

    let mut times = Vec::new();
    for frame in (dim - 1)..stimulus.num_frames() {
        let mut projection = 0.0;
        for (lag, weights) in filter.iter().enumerate() {
            let history = &stimulus.frames()[frame + 1 - dim + lag];
            projection += weights
                .iter()
                .zip(history.iter())
                .map(|(w, value)| w * value)
                .sum::<f64>();
        }

        let rate = 1.0 / (1.0 + (-gain * (projection - threshold)).exp());
        let fires = Bernoulli::new(rate)
            .map_err(|e| {
                AnalysisError::InvalidParameter(format!("Invalid spiking probability: {}", e))
            })?
            .sample(rng);
        if fires {
            times.push(frame as f64 * stimulus.frame_interval());
        }
    }

    SpikeTrain::build(cell_id, &times)
}
