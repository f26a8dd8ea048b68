//! Module implementing the spike-triggered stimulus ensemble.

use log::debug;

use crate::error::AnalysisError;
use crate::spike_train::{aligned_frame_index, RoundStrategy, SpikeTrain};
use crate::stimulus::Stimulus;

/// Collects the stimulus frames on display when the cells spiked.
///
/// For every spike of every cell, the spike time is aligned to a frame number
/// and shifted back by `frame_offset`, so that larger offsets look further
/// into the stimulus history. Frames outside `[0, num_frames)` are silently
/// dropped; spikes near the recording boundaries are expected to map out of
/// range. The result is a multiset: one entry per spike, with repetitions when
/// several spikes land on the same frame.
pub fn collect<'a>(
    stimulus: &'a Stimulus,
    spike_trains: &[SpikeTrain],
    frame_offset: i64,
    strategy: RoundStrategy,
) -> Result<Vec<&'a [f64]>, AnalysisError> {
    let num_frames = stimulus.num_frames() as i64;

    let mut ensemble = Vec::new();
    let mut num_dropped = 0;
    for spike_train in spike_trains {
        for &time in spike_train.times() {
            let frame =
                aligned_frame_index(time, stimulus.frame_interval(), strategy)? - frame_offset;
            if (0..num_frames).contains(&frame) {
                ensemble.push(stimulus.frames()[frame as usize].as_slice());
            } else {
                num_dropped += 1;
            }
        }
    }

    if num_dropped > 0 {
        debug!(
            "Dropped {} out-of-range spikes while collecting the ensemble at offset {}",
            num_dropped, frame_offset
        );
    }
    Ok(ensemble)
}
