//! Module implementing spike trains and their alignment to the stimulus frame clock.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::DIVISION_EPSILON;

/// The rounding policy applied when converting a spike time to a frame number.
///
/// The choice is a deliberate analysis parameter: running the same analysis
/// under all three policies and comparing the results is a standard
/// sensitivity check.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum RoundStrategy {
    /// Round up to the next frame.
    Ceiling,
    /// Round down to the previous frame.
    Floor,
    /// Round to the nearest frame, ties to the even frame number.
    Round,
}

/// Represents the spike train recorded from a single cell.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SpikeTrain {
    cell_id: usize,
    times: Vec<f64>,
}

impl SpikeTrain {
    /// Create a spike train with the specified parameters.
    /// If necessary, the spike times are sorted.
    /// The function returns an error for non-finite spike times.
    pub fn build(cell_id: usize, times: &[f64]) -> Result<Self, AnalysisError> {
        for t in times {
            if !t.is_finite() {
                return Err(AnalysisError::InvalidParameter(format!(
                    "The spike times must be finite, got {}.",
                    t
                )));
            }
        }

        let mut times = times.to_vec();
        times.sort_by(|t1, t2| {
            t1.partial_cmp(t2).unwrap_or_else(|| {
                panic!("Comparison failed: NaN values should have been caught earlier")
            })
        });

        Ok(SpikeTrain { cell_id, times })
    }

    /// Returns the ID of the cell associated with the spike train.
    pub fn cell_id(&self) -> usize {
        self.cell_id
    }

    /// Returns the spike times of the spike train.
    pub fn times(&self) -> &[f64] {
        &self.times[..]
    }

    /// Returns the number of spikes in the spike train.
    pub fn num_spikes(&self) -> usize {
        self.times.len()
    }
}

/// Converts a spike time to the number of the frame on display when the spike occurred.
///
/// The fractional frame number `spike_time / frame_interval` is turned into an
/// integer according to the given strategy. The result may lie outside the
/// recorded stimulus; bounds are the caller's concern.
///
/// The function returns an error for a numerically zero frame interval.
///
/// # Examples
///
/// ```rust
/// use revcorr::spike_train::{aligned_frame_index, RoundStrategy};
///
/// assert_eq!(aligned_frame_index(2.5, 1.0, RoundStrategy::Floor).unwrap(), 2);
/// assert_eq!(aligned_frame_index(2.5, 1.0, RoundStrategy::Ceiling).unwrap(), 3);
/// assert_eq!(aligned_frame_index(2.5, 1.0, RoundStrategy::Round).unwrap(), 2);
/// ```
pub fn aligned_frame_index(
    spike_time: f64,
    frame_interval: f64,
    strategy: RoundStrategy,
) -> Result<i64, AnalysisError> {
    if frame_interval.abs() < DIVISION_EPSILON {
        return Err(AnalysisError::DivisionByZero(format!(
            "The frame interval {} is numerically zero.",
            frame_interval
        )));
    }

    let fractional = spike_time / frame_interval;
    let frame = match strategy {
        RoundStrategy::Ceiling => fractional.ceil(),
        RoundStrategy::Floor => fractional.floor(),
        RoundStrategy::Round => fractional.round_ties_even(),
    };
    Ok(frame as i64)
}
