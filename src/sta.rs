//! Module implementing the spike-triggered average and the receptive field.

use log::debug;
use rayon::prelude::*;

use crate::convolution::{self, Kernel};
use crate::ensemble;
use crate::error::AnalysisError;
use crate::matrix;
use crate::spike_train::{RoundStrategy, SpikeTrain};
use crate::stimulus::Stimulus;

/// Computes the spike-triggered average of the stimulus at the given offset.
///
/// The average over the spike-triggered ensemble is centered by the overall
/// stimulus mean, so that a non-responsive cell yields a near-zero result. An
/// empty ensemble degenerates to the negated stimulus mean; an empty spike set
/// is a valid zero-response recording, not an error.
pub fn calculate(
    stimulus: &Stimulus,
    spike_trains: &[SpikeTrain],
    frame_offset: i64,
    strategy: RoundStrategy,
) -> Result<Vec<f64>, AnalysisError> {
    let ensemble = ensemble::collect(stimulus, spike_trains, frame_offset, strategy)?;
    let stimulus_mean = matrix::mean(stimulus.frames())?;

    if ensemble.is_empty() {
        debug!(
            "Empty ensemble at offset {}, the average degenerates to the negated stimulus mean",
            frame_offset
        );
        return Ok(matrix::negate(&stimulus_mean));
    }

    let ensemble_mean = matrix::mean(&ensemble)?;
    matrix::subtract(&ensemble_mean, &stimulus_mean)
}

/// Computes the receptive field of the cells as a lag-by-space matrix.
///
/// Row `time` holds the spike-triggered average at `frame_offset = offset - time`,
/// so the first row looks furthest back into the stimulus history and the rows
/// step forward in time. The rows are computed in parallel. If a smoothing
/// kernel is supplied, the assembled matrix is convolved with it before being
/// returned.
///
/// # Parameters
/// - `offset`: the look-back of the first row, in frames.
/// - `max_lags`: the number of rows; zero yields an empty matrix.
/// - `smooth_kernel`: optional smoothing kernel applied to the assembled matrix.
/// - `use_dynamic_divisor_for_edges`: edge policy of the smoothing pass.
pub fn receptive_field(
    stimulus: &Stimulus,
    spike_trains: &[SpikeTrain],
    offset: i64,
    max_lags: usize,
    strategy: RoundStrategy,
    smooth_kernel: Option<&Kernel>,
    use_dynamic_divisor_for_edges: bool,
) -> Result<Vec<Vec<f64>>, AnalysisError> {
    let rows = (0..max_lags)
        .into_par_iter()
        .map(|time| calculate(stimulus, spike_trains, offset - time as i64, strategy))
        .collect::<Result<Vec<Vec<f64>>, AnalysisError>>()?;

    match smooth_kernel {
        Some(kernel) if !rows.is_empty() => {
            convolution::convolve(&rows, kernel, use_dynamic_divisor_for_edges)
        }
        _ => Ok(rows),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn alternating_stimulus(num_frames: usize) -> Stimulus {
        let frames = (0..num_frames)
            .map(|i| vec![if i % 2 == 0 { 1.0 } else { -1.0 }])
            .collect();
        Stimulus::build(frames, 1.0).unwrap()
    }

    #[test]
    fn test_calculate() {
        let stimulus = alternating_stimulus(10);
        let spike_trains = vec![SpikeTrain::build(0, &[2.0, 4.0, 6.0]).unwrap()];

        // Every spike lands on a +1 frame and the stimulus mean vanishes
        let sta = calculate(&stimulus, &spike_trains, 0, RoundStrategy::Round).unwrap();
        assert_eq!(sta, vec![1.0]);

        // Shifted by one frame, every ensemble member is -1
        let sta = calculate(&stimulus, &spike_trains, 1, RoundStrategy::Round).unwrap();
        assert_eq!(sta, vec![-1.0]);
    }

    #[test]
    fn test_calculate_centering() {
        // A biased stimulus is centered by its own mean
        let frames = vec![vec![2.0, 0.0], vec![4.0, 2.0], vec![6.0, 4.0], vec![8.0, 2.0]];
        let stimulus = Stimulus::build(frames, 1.0).unwrap();
        let spike_trains = vec![SpikeTrain::build(0, &[1.0, 3.0]).unwrap()];

        let sta = calculate(&stimulus, &spike_trains, 0, RoundStrategy::Round).unwrap();
        assert_relative_eq!(sta[0], 6.0 - 5.0, epsilon = 1e-12);
        assert_relative_eq!(sta[1], 2.0 - 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_calculate_empty_ensemble() {
        let frames = vec![vec![1.0, -3.0], vec![3.0, -1.0]];
        let stimulus = Stimulus::build(frames, 1.0).unwrap();
        let spike_trains = vec![SpikeTrain::build(0, &[]).unwrap()];

        // No spikes: the average degenerates to the negated stimulus mean
        let sta = calculate(&stimulus, &spike_trains, 0, RoundStrategy::Round).unwrap();
        assert_eq!(sta, vec![-2.0, 2.0]);

        // Same degenerate result when the offset pushes every spike out of range
        let spike_trains = vec![SpikeTrain::build(0, &[0.0, 1.0]).unwrap()];
        let sta = calculate(&stimulus, &spike_trains, 10, RoundStrategy::Round).unwrap();
        assert_eq!(sta, vec![-2.0, 2.0]);
    }

    #[test]
    fn test_receptive_field_rows() {
        let stimulus = alternating_stimulus(10);
        let spike_trains = vec![SpikeTrain::build(0, &[6.0]).unwrap()];

        // Row `time` is the average at offset 3 - time: frames 3, 4 and 5
        let rf = receptive_field(
            &stimulus,
            &spike_trains,
            3,
            3,
            RoundStrategy::Round,
            None,
            false,
        )
        .unwrap();
        assert_eq!(rf, vec![vec![-1.0], vec![1.0], vec![-1.0]]);

        // Zero lags yield an empty matrix
        let rf = receptive_field(
            &stimulus,
            &spike_trains,
            3,
            0,
            RoundStrategy::Round,
            None,
            false,
        )
        .unwrap();
        assert!(rf.is_empty());
    }

    #[test]
    fn test_receptive_field_smoothing() {
        let stimulus = alternating_stimulus(12);
        let spike_trains = vec![SpikeTrain::build(0, &[4.0, 6.0, 8.0]).unwrap()];

        let mut weights = vec![vec![0.0; 3]; 3];
        weights[1][1] = 1.0;
        let identity = Kernel::build(weights).unwrap();

        // Smoothing with the identity kernel changes nothing
        let plain = receptive_field(
            &stimulus,
            &spike_trains,
            2,
            3,
            RoundStrategy::Round,
            None,
            false,
        )
        .unwrap();
        let smoothed = receptive_field(
            &stimulus,
            &spike_trains,
            2,
            3,
            RoundStrategy::Round,
            Some(&identity),
            true,
        )
        .unwrap();
        assert_eq!(plain, smoothed);
    }
}
