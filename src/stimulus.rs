//! Module implementing the concept of a white-noise stimulus recording.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Represents a stimulus as an ordered sequence of equal-length frames.
///
/// Each frame holds one value per spatial position (typically ±1 for a binary
/// white-noise stimulus). The frame interval is the presentation duration of a
/// single frame and defines the mapping from spike times to frame numbers.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Stimulus {
    frames: Vec<Vec<f64>>,
    frame_interval: f64,
}

impl Stimulus {
    /// Create a stimulus with the specified parameters.
    /// The function returns an error for an empty or ragged frame sequence and for a
    /// non-positive frame interval.
    pub fn build(frames: Vec<Vec<f64>>, frame_interval: f64) -> Result<Self, AnalysisError> {
        if !frame_interval.is_finite() || frame_interval <= 0.0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "The frame interval must be a positive number, got {}.",
                frame_interval
            )));
        }

        let frame_len = match frames.first() {
            Some(frame) => frame.len(),
            None => {
                return Err(AnalysisError::EmptyInput(
                    "A stimulus must contain at least one frame.".to_string(),
                ))
            }
        };
        if frame_len == 0 {
            return Err(AnalysisError::EmptyInput(
                "A stimulus frame must contain at least one value.".to_string(),
            ));
        }
        for frame in frames.iter() {
            if frame.len() != frame_len {
                return Err(AnalysisError::DimensionMismatch(format!(
                    "Expected frames of length {}, found {}.",
                    frame_len,
                    frame.len()
                )));
            }
        }

        Ok(Stimulus {
            frames,
            frame_interval,
        })
    }

    /// Returns the number of frames in the stimulus.
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Returns the number of values per frame.
    pub fn frame_len(&self) -> usize {
        self.frames[0].len()
    }

    /// Returns the frames of the stimulus.
    pub fn frames(&self) -> &[Vec<f64>] {
        &self.frames[..]
    }

    /// Returns the presentation duration of a single frame.
    pub fn frame_interval(&self) -> f64 {
        self.frame_interval
    }

    /// Returns the total presentation duration of the stimulus.
    pub fn duration(&self) -> f64 {
        self.num_frames() as f64 * self.frame_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stimulus_build() {
        let stimulus = Stimulus::build(vec![vec![1.0, -1.0], vec![-1.0, 1.0]], 0.5).unwrap();
        assert_eq!(stimulus.num_frames(), 2);
        assert_eq!(stimulus.frame_len(), 2);
        assert_eq!(stimulus.frame_interval(), 0.5);
        assert_eq!(stimulus.duration(), 1.0);
        assert_eq!(stimulus.frames()[1], vec![-1.0, 1.0]);

        // Test empty frame sequences
        assert!(matches!(
            Stimulus::build(vec![], 0.5),
            Err(AnalysisError::EmptyInput(_))
        ));
        assert!(matches!(
            Stimulus::build(vec![vec![]], 0.5),
            Err(AnalysisError::EmptyInput(_))
        ));

        // Test ragged frames
        assert!(matches!(
            Stimulus::build(vec![vec![1.0, -1.0], vec![1.0]], 0.5),
            Err(AnalysisError::DimensionMismatch(_))
        ));

        // Test invalid frame intervals
        assert!(matches!(
            Stimulus::build(vec![vec![1.0]], 0.0),
            Err(AnalysisError::InvalidParameter(_))
        ));
        assert!(matches!(
            Stimulus::build(vec![vec![1.0]], -1.0),
            Err(AnalysisError::InvalidParameter(_))
        ));
        assert!(matches!(
            Stimulus::build(vec![vec![1.0]], f64::NAN),
            Err(AnalysisError::InvalidParameter(_))
        ));
    }
}
