//! Module implementing memoized analysis sessions over a fixed recording.

use std::collections::HashMap;

use itertools::Itertools;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::convolution::Kernel;
use crate::error::AnalysisError;
use crate::histogram::Histogram;
use crate::nonlinearity::{self, Nonlinearity};
use crate::response::{self, MatchOperation, ResponseHistogram};
use crate::spike_train::{RoundStrategy, SpikeTrain};
use crate::sta;
use crate::stc::{self, EigenDecomposition};
use crate::stimulus::Stimulus;

/// The composed result of a nonlinearity estimation: the curve itself plus the
/// pair of identically binned match-value histograms it was derived from.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct NonlinearityEstimate {
    curve: Nonlinearity,
    raw: Histogram,
    spike_triggered: Histogram,
}

impl NonlinearityEstimate {
    /// Create a nonlinearity estimate from its parts.
    pub fn new(curve: Nonlinearity, raw: Histogram, spike_triggered: Histogram) -> Self {
        NonlinearityEstimate {
            curve,
            raw,
            spike_triggered,
        }
    }

    /// Returns the estimated nonlinearity curve.
    pub fn curve(&self) -> &Nonlinearity {
        &self.curve
    }

    /// Returns the raw match-value histogram.
    pub fn raw(&self) -> &Histogram {
        &self.raw
    }

    /// Returns the spike-triggered match-value histogram.
    pub fn spike_triggered(&self) -> &Histogram {
        &self.spike_triggered
    }
}

/// The parameters identifying one receptive-field estimate.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
struct FieldKey {
    cells: Vec<usize>,
    offset: i64,
    max_lags: usize,
    strategy: RoundStrategy,
    kernel: Option<Vec<u64>>,
    dynamic_edges: bool,
}

/// The parameters identifying one match-value analysis.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
struct MatchKey {
    field: FieldKey,
    operation: MatchOperation,
    bucket_count: usize,
}

/// The parameters identifying one response histogram.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
struct ResponseKey {
    matching: MatchKey,
    spike_triggered_only: bool,
}

/// An analysis session over one immutable recording.
///
/// The session owns the stimulus and the spike trains of all recorded cells
/// and memoizes every derived result, keyed by the complete parameter tuple of
/// the operation (cell selection, offset, lags, round strategy, smoothing
/// kernel, edge policy, match operation, bucket count). Since the recording
/// never changes, cached entries never go stale.
///
/// # Examples
///
/// ```rust
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
/// use revcorr::sampler;
/// use revcorr::session::Session;
/// use revcorr::spike_train::RoundStrategy;
///
/// let mut rng = StdRng::seed_from_u64(42);
/// let stimulus = sampler::rand_stimulus(200, 4, 1.0, &mut rng).unwrap();
/// let spike_train = sampler::ln_spike_train(&stimulus, 0, &[vec![1.0; 4]], 1.0, 0.0, &mut rng).unwrap();
///
/// let mut session = Session::new(stimulus, vec![spike_train]).unwrap();
/// let covariance = session.covariance(&[0], RoundStrategy::Round).unwrap();
/// assert_eq!(covariance.len(), 4);
/// ```
#[derive(Debug, Clone)]
pub struct Session {
    stimulus: Stimulus,
    spike_trains: Vec<SpikeTrain>,
    receptive_fields: HashMap<FieldKey, Vec<Vec<f64>>>,
    covariances: HashMap<(Vec<usize>, RoundStrategy), Vec<Vec<f64>>>,
    eigen_decompositions: HashMap<(Vec<usize>, RoundStrategy), EigenDecomposition>,
    response_histograms: HashMap<ResponseKey, ResponseHistogram>,
    nonlinearities: HashMap<MatchKey, NonlinearityEstimate>,
}

impl Session {
    /// Create a session over the given recording.
    /// The function returns an error for duplicate cell IDs.
    pub fn new(stimulus: Stimulus, spike_trains: Vec<SpikeTrain>) -> Result<Self, AnalysisError> {
        let duplicates: Vec<usize> = spike_trains
            .iter()
            .map(|spike_train| spike_train.cell_id())
            .duplicates()
            .collect();
        if !duplicates.is_empty() {
            return Err(AnalysisError::InvalidParameter(format!(
                "The cell IDs must be unique, found duplicates: {:?}.",
                duplicates
            )));
        }

        Ok(Session {
            stimulus,
            spike_trains,
            receptive_fields: HashMap::new(),
            covariances: HashMap::new(),
            eigen_decompositions: HashMap::new(),
            response_histograms: HashMap::new(),
            nonlinearities: HashMap::new(),
        })
    }

    /// Returns the stimulus of the recording.
    pub fn stimulus(&self) -> &Stimulus {
        &self.stimulus
    }

    /// Returns the spike trains of all recorded cells.
    pub fn spike_trains(&self) -> &[SpikeTrain] {
        &self.spike_trains[..]
    }

    /// Returns the number of recorded cells.
    pub fn num_cells(&self) -> usize {
        self.spike_trains.len()
    }

    /// Computes the receptive field of the selected cells, see
    /// [`sta::receptive_field`]. Results are memoized per parameter tuple.
    pub fn receptive_field(
        &mut self,
        cells: &[usize],
        offset: i64,
        max_lags: usize,
        strategy: RoundStrategy,
        smooth_kernel: Option<&Kernel>,
        use_dynamic_divisor_for_edges: bool,
    ) -> Result<Vec<Vec<f64>>, AnalysisError> {
        let key = self.field_key(
            cells,
            offset,
            max_lags,
            strategy,
            smooth_kernel,
            use_dynamic_divisor_for_edges,
        )?;
        if let Some(field) = self.receptive_fields.get(&key) {
            return Ok(field.clone());
        }

        trace!(
            "Computing the receptive field for cells {:?} at offset {}",
            key.cells,
            offset
        );
        let spike_trains = self.select_trains(&key.cells);
        let field = sta::receptive_field(
            &self.stimulus,
            &spike_trains,
            offset,
            max_lags,
            strategy,
            smooth_kernel,
            use_dynamic_divisor_for_edges,
        )?;
        self.receptive_fields.insert(key, field.clone());
        Ok(field)
    }

    /// Computes the spike-triggered covariance of the selected cells, see
    /// [`stc::calculate`]. Results are memoized per parameter tuple.
    pub fn covariance(
        &mut self,
        cells: &[usize],
        strategy: RoundStrategy,
    ) -> Result<Vec<Vec<f64>>, AnalysisError> {
        let key = (self.normalize_cells(cells)?, strategy);
        if let Some(covariance) = self.covariances.get(&key) {
            return Ok(covariance.clone());
        }

        trace!("Computing the covariance for cells {:?}", key.0);
        let spike_trains = self.select_trains(&key.0);
        let covariance = stc::calculate(&self.stimulus, &spike_trains, strategy)?;
        self.covariances.insert(key, covariance.clone());
        Ok(covariance)
    }

    /// Computes the eigen-decomposition of the spike-triggered covariance of
    /// the selected cells, see [`stc::eigen_decomposition`]. Results are
    /// memoized per parameter tuple.
    pub fn eigen_decomposition(
        &mut self,
        cells: &[usize],
        strategy: RoundStrategy,
    ) -> Result<EigenDecomposition, AnalysisError> {
        let key = (self.normalize_cells(cells)?, strategy);
        if let Some(eigen) = self.eigen_decompositions.get(&key) {
            return Ok(eigen.clone());
        }

        let covariance = self.covariance(&key.0, strategy)?;
        let eigen = stc::eigen_decomposition(&covariance)?;
        self.eigen_decompositions.insert(key, eigen.clone());
        Ok(eigen)
    }

    /// Computes a match-value response histogram for the selected cells, see
    /// [`response::response_histogram`]. Results are memoized per parameter
    /// tuple.
    pub fn response_histogram(
        &mut self,
        cells: &[usize],
        for_spike_triggered_stimuli_only: bool,
        offset: i64,
        max_lags: usize,
        strategy: RoundStrategy,
        operation: MatchOperation,
        smooth_kernel: Option<&Kernel>,
        use_dynamic_divisor_for_edges: bool,
        bucket_count: usize,
    ) -> Result<ResponseHistogram, AnalysisError> {
        let key = ResponseKey {
            matching: MatchKey {
                field: self.field_key(
                    cells,
                    offset,
                    max_lags,
                    strategy,
                    smooth_kernel,
                    use_dynamic_divisor_for_edges,
                )?,
                operation,
                bucket_count,
            },
            spike_triggered_only: for_spike_triggered_stimuli_only,
        };
        if let Some(histogram) = self.response_histograms.get(&key) {
            return Ok(histogram.clone());
        }

        trace!(
            "Computing the {} response histogram for cells {:?}",
            if for_spike_triggered_stimuli_only {
                "spike-triggered"
            } else {
                "raw"
            },
            key.matching.field.cells
        );
        let spike_trains = self.select_trains(&key.matching.field.cells);
        let histogram = response::response_histogram(
            &self.stimulus,
            &spike_trains,
            for_spike_triggered_stimuli_only,
            offset,
            max_lags,
            strategy,
            operation,
            smooth_kernel,
            use_dynamic_divisor_for_edges,
            bucket_count,
        )?;
        self.response_histograms.insert(key, histogram.clone());
        Ok(histogram)
    }

    /// Estimates the firing-rate nonlinearity of the selected cells.
    ///
    /// The raw and spike-triggered response histograms are computed (through
    /// their caches), rebinned over the union of their observed ranges so that
    /// they share one binning, and combined via [`nonlinearity::estimate`].
    /// Results are memoized per parameter tuple.
    pub fn nonlinearity(
        &mut self,
        cells: &[usize],
        offset: i64,
        max_lags: usize,
        strategy: RoundStrategy,
        operation: MatchOperation,
        smooth_kernel: Option<&Kernel>,
        use_dynamic_divisor_for_edges: bool,
        bucket_count: usize,
    ) -> Result<NonlinearityEstimate, AnalysisError> {
        let key = MatchKey {
            field: self.field_key(
                cells,
                offset,
                max_lags,
                strategy,
                smooth_kernel,
                use_dynamic_divisor_for_edges,
            )?,
            operation,
            bucket_count,
        };
        if let Some(estimate) = self.nonlinearities.get(&key) {
            return Ok(estimate.clone());
        }

        let raw = self.response_histogram(
            cells,
            false,
            offset,
            max_lags,
            strategy,
            operation,
            smooth_kernel,
            use_dynamic_divisor_for_edges,
            bucket_count,
        )?;
        let spike_triggered = self.response_histogram(
            cells,
            true,
            offset,
            max_lags,
            strategy,
            operation,
            smooth_kernel,
            use_dynamic_divisor_for_edges,
            bucket_count,
        )?;

        // Rebin both match-value sets over the union of the observed ranges
        let lower = raw
            .histogram()
            .lower_bound()
            .min(spike_triggered.histogram().lower_bound());
        let upper = raw
            .histogram()
            .upper_bound()
            .max(spike_triggered.histogram().upper_bound());
        let raw_histogram = Histogram::with_bounds(raw.match_values(), bucket_count, lower, upper)?;
        let spike_triggered_histogram =
            Histogram::with_bounds(spike_triggered.match_values(), bucket_count, lower, upper)?;

        let curve = nonlinearity::estimate(&raw_histogram, &spike_triggered_histogram)?;
        let estimate =
            NonlinearityEstimate::new(curve, raw_histogram, spike_triggered_histogram);
        self.nonlinearities.insert(key, estimate.clone());
        Ok(estimate)
    }

    /// Returns the selection as sorted, deduplicated cell IDs.
    /// The function returns an error for IDs absent from the recording.
    fn normalize_cells(&self, cells: &[usize]) -> Result<Vec<usize>, AnalysisError> {
        let cells: Vec<usize> = cells.iter().copied().sorted().dedup().collect();
        for &cell in cells.iter() {
            if !self
                .spike_trains
                .iter()
                .any(|spike_train| spike_train.cell_id() == cell)
            {
                return Err(AnalysisError::InvalidParameter(format!(
                    "Unknown cell ID {}.",
                    cell
                )));
            }
        }
        Ok(cells)
    }

    fn select_trains(&self, cells: &[usize]) -> Vec<SpikeTrain> {
        cells
            .iter()
            .filter_map(|&cell| {
                self.spike_trains
                    .iter()
                    .find(|spike_train| spike_train.cell_id() == cell)
                    .cloned()
            })
            .collect()
    }

    fn field_key(
        &self,
        cells: &[usize],
        offset: i64,
        max_lags: usize,
        strategy: RoundStrategy,
        smooth_kernel: Option<&Kernel>,
        dynamic_edges: bool,
    ) -> Result<FieldKey, AnalysisError> {
        Ok(FieldKey {
            cells: self.normalize_cells(cells)?,
            offset,
            max_lags,
            strategy,
            kernel: smooth_kernel.map(kernel_fingerprint),
            dynamic_edges,
        })
    }
}

/// Collapses the kernel weights into a hashable bit pattern.
fn kernel_fingerprint(kernel: &Kernel) -> Vec<u64> {
    kernel
        .weights()
        .iter()
        .flatten()
        .map(|weight| weight.to_bits())
        .collect()
}
