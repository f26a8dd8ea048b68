//! Module implementing the spike-triggered covariance and its eigen-decomposition.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::ensemble;
use crate::error::AnalysisError;
use crate::matrix;
use crate::spike_train::{RoundStrategy, SpikeTrain};
use crate::stimulus::Stimulus;

/// The eigenvalues and eigenvectors of a covariance matrix.
///
/// `values()[k]` belongs to `vectors()[k]`; no ordering is imposed beyond what
/// the decomposition produces, callers needing sorted spectra must sort
/// explicitly.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct EigenDecomposition {
    values: Vec<f64>,
    vectors: Vec<Vec<f64>>,
}

impl EigenDecomposition {
    /// Create an eigen-decomposition from index-aligned values and vectors.
    pub fn new(values: Vec<f64>, vectors: Vec<Vec<f64>>) -> Self {
        EigenDecomposition { values, vectors }
    }

    /// Returns the eigenvalues.
    pub fn values(&self) -> &[f64] {
        &self.values[..]
    }

    /// Returns the eigenvectors, index-aligned with the eigenvalues.
    pub fn vectors(&self) -> &[Vec<f64>] {
        &self.vectors[..]
    }
}

/// Computes the spike-triggered covariance matrix of the cells.
///
/// The spike-triggered ensemble is collected at offset zero, every member is
/// centered by the spike-triggered average, and the outer products of the
/// centered members are averaged with the unbiased `N - 1` normalization.
///
/// The function returns an error when the ensemble holds fewer than two members.
pub fn calculate(
    stimulus: &Stimulus,
    spike_trains: &[SpikeTrain],
    strategy: RoundStrategy,
) -> Result<Vec<Vec<f64>>, AnalysisError> {
    let ensemble = ensemble::collect(stimulus, spike_trains, 0, strategy)?;
    if ensemble.len() <= 1 {
        return Err(AnalysisError::DivisionByZero(format!(
            "The unbiased covariance estimator needs at least two ensemble members, got {}.",
            ensemble.len()
        )));
    }

    let stimulus_mean = matrix::mean(stimulus.frames())?;
    let ensemble_mean = matrix::mean(&ensemble)?;
    let sta = matrix::subtract(&ensemble_mean, &stimulus_mean)?;

    let centered = matrix::subtract_rows(&ensemble, &sta)?;
    let products: Vec<Vec<Vec<f64>>> = centered
        .iter()
        .map(|member| matrix::tensor(member, member))
        .collect();
    let total = matrix::sum(&products)?;

    matrix::divide_matrix(&total, (ensemble.len() - 1) as f64)
}

/// Computes the eigen-decomposition of the given covariance matrix.
///
/// The matrix is treated as symmetric, which a covariance matrix is by
/// construction, so the spectrum is real.
///
/// The function returns an error for an empty or non-square matrix.
pub fn eigen_decomposition(covariance: &[Vec<f64>]) -> Result<EigenDecomposition, AnalysisError> {
    let size = covariance.len();
    if size == 0 {
        return Err(AnalysisError::EmptyInput(
            "Cannot decompose an empty matrix.".to_string(),
        ));
    }
    for row in covariance.iter() {
        if row.len() != size {
            return Err(AnalysisError::DimensionMismatch(format!(
                "The matrix must be square, expected rows of length {}, found {}.",
                size,
                row.len()
            )));
        }
    }

    let eigen = DMatrix::from_fn(size, size, |i, j| covariance[i][j]).symmetric_eigen();

    let values = eigen.eigenvalues.iter().copied().collect();
    let vectors = (0..size)
        .map(|k| eigen.eigenvectors.column(k).iter().copied().collect())
        .collect();
    Ok(EigenDecomposition::new(values, vectors))
}
