//! This crate provides tools for the reverse-correlation analysis of neural recordings in Rust.
//!
//! A recording pairs a binary white-noise stimulus with the spike trains it evoked.
//! The pipeline aligns spikes to stimulus frames, collects the spike-triggered
//! stimulus ensemble, and estimates the cell's linear receptive field (spike-triggered
//! average across time lags), its spike-triggered covariance, and the static
//! nonlinearity mapping filter output to firing rate.
//!
//! # Computing Spike-Triggered Averages
//!
//! ```rust
//! use revcorr::spike_train::{RoundStrategy, SpikeTrain};
//! use revcorr::stimulus::Stimulus;
//! use revcorr::sta;
//!
//! // A ten-frame stimulus alternating between +1 and -1, one value per frame
//! let frames = (0..10).map(|i| vec![if i % 2 == 0 { 1.0 } else { -1.0 }]).collect();
//! let stimulus = Stimulus::build(frames, 1.0).unwrap();
//!
//! // One cell spiking exactly on frames 2, 4 and 6
//! let spike_train = SpikeTrain::build(0, &[2.0, 4.0, 6.0]).unwrap();
//!
//! // Every spike lands on a +1 frame and the stimulus mean vanishes
//! let sta = sta::calculate(&stimulus, &[spike_train], 0, RoundStrategy::Round).unwrap();
//! assert_eq!(sta, vec![1.0]);
//! ```
//!
//! # Sampling Recordings
//!
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use revcorr::sampler;
//!
//! // Sample a binary white-noise stimulus with 500 frames of 16 values each
//! let mut rng = StdRng::seed_from_u64(42);
//! let stimulus = sampler::rand_stimulus(500, 16, revcorr::DEFAULT_FRAME_INTERVAL, &mut rng).unwrap();
//!
//! assert_eq!(stimulus.num_frames(), 500);
//! assert_eq!(stimulus.frame_len(), 16);
//! ```
//!
//! # Analyzing Recordings
//!
//! ```rust
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use revcorr::sampler;
//! use revcorr::session::Session;
//! use revcorr::spike_train::RoundStrategy;
//!
//! // Sample a recording from a linear-nonlinear model cell
//! let mut rng = StdRng::seed_from_u64(42);
//! let stimulus = sampler::rand_stimulus(500, 8, 1.0, &mut rng).unwrap();
//! let filter = vec![vec![0.5; 8], vec![-0.25; 8]];
//! let spike_train = sampler::ln_spike_train(&stimulus, 0, &filter, 1.0, 0.0, &mut rng).unwrap();
//!
//! // Estimate the receptive field over two time lags, memoized by the session
//! let mut session = Session::new(stimulus, vec![spike_train]).unwrap();
//! let rf = session.receptive_field(&[0], 1, 2, RoundStrategy::Round, None, false).unwrap();
//! assert_eq!(rf.len(), 2);
//! assert_eq!(rf[0].len(), 8);
//! ```

pub mod convolution;
pub mod ensemble;
pub mod error;
pub mod histogram;
pub mod matrix;
pub mod nonlinearity;
pub mod response;
pub mod sampler;
pub mod session;
pub mod spike_train;
pub mod sta;
pub mod stc;
pub mod stimulus;

/// The frame rate of the reference recording setup, in frames per second.
pub const FRAME_RATE: f64 = 59.721395;
/// The presentation duration of a single stimulus frame, in seconds.
pub const DEFAULT_FRAME_INTERVAL: f64 = 1.0 / FRAME_RATE;
/// The magnitude below which a divisor is considered numerically zero.
pub const DIVISION_EPSILON: f64 = 1e-8;
