//! Module implementing 2-D convolution against small square smoothing kernels.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::DIVISION_EPSILON;

/// The smallest accepted kernel side length.
pub const MIN_KERNEL_SIZE: usize = 3;
/// The largest accepted kernel side length.
pub const MAX_KERNEL_SIZE: usize = 99;

/// Represents a validated square convolution kernel with an odd side length.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Kernel {
    weights: Vec<Vec<f64>>,
}

impl Kernel {
    /// Create a kernel with the specified weights.
    /// The function returns an error if the weights are not square with an odd
    /// side length in `[MIN_KERNEL_SIZE, MAX_KERNEL_SIZE]`.
    pub fn build(weights: Vec<Vec<f64>>) -> Result<Self, AnalysisError> {
        let size = weights.len();
        if !(MIN_KERNEL_SIZE..=MAX_KERNEL_SIZE).contains(&size) {
            return Err(AnalysisError::InvalidKernel(format!(
                "The kernel side must lie in [{}, {}], got {}.",
                MIN_KERNEL_SIZE, MAX_KERNEL_SIZE, size
            )));
        }
        if size % 2 == 0 {
            return Err(AnalysisError::InvalidKernel(format!(
                "The kernel side must be odd, got {}.",
                size
            )));
        }
        for row in weights.iter() {
            if row.len() != size {
                return Err(AnalysisError::InvalidKernel(format!(
                    "The kernel must be square, expected rows of length {}, found {}.",
                    size,
                    row.len()
                )));
            }
        }

        Ok(Kernel { weights })
    }

    /// Create a uniform (all-ones) smoothing kernel of the given side length.
    pub fn uniform(size: usize) -> Result<Self, AnalysisError> {
        Kernel::build(vec![vec![1.0; size]; size])
    }

    /// Create a 2-D Gaussian smoothing kernel of the given side length and width.
    /// The weights are the values of the bivariate Gaussian density at integer
    /// offsets from the center.
    /// The function returns an error for a non-positive width or an invalid
    /// side length.
    pub fn gaussian(size: usize, sigma: f64) -> Result<Self, AnalysisError> {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "The Gaussian width must be a positive number, got {}.",
                sigma
            )));
        }

        let radius = (size / 2) as i64;
        let scale = 1.0 / (2.0 * std::f64::consts::PI * sigma * sigma);
        let weights = (0..size)
            .map(|y| {
                let vertical = y as i64 - radius;
                (0..size)
                    .map(|x| {
                        let horizontal = x as i64 - radius;
                        let squared_distance =
                            (horizontal * horizontal + vertical * vertical) as f64;
                        scale * (-squared_distance / (2.0 * sigma * sigma)).exp()
                    })
                    .collect()
            })
            .collect();
        Kernel::build(weights)
    }

    /// Returns the side length of the kernel.
    pub fn size(&self) -> usize {
        self.weights.len()
    }

    /// Returns the number of taps on each side of the center.
    pub fn radius(&self) -> usize {
        self.size() >> 1
    }

    /// Returns the weights of the kernel.
    pub fn weights(&self) -> &[Vec<f64>] {
        &self.weights[..]
    }

    /// Returns the normalization divisor of the kernel, i.e., the sum of all
    /// weights, or 1 when that sum vanishes.
    pub fn divisor(&self) -> f64 {
        let sum = self.weights.iter().flatten().sum::<f64>();
        if sum.abs() < f64::EPSILON {
            1.0
        } else {
            sum
        }
    }
}

/// Convolves the source matrix with the given kernel, producing a result of the
/// same shape.
///
/// For each output cell, the kernel is centered on the corresponding source
/// cell and only in-bounds taps are accumulated. Cells whose taps were all
/// in-bounds are normalized by the full kernel divisor. For edge cells,
/// `use_dynamic_divisor_for_edges` selects between normalizing by the sum of
/// the weights actually used (true) or still by the full divisor (false, which
/// biases edges towards zero). A numerically zero divisor skips the
/// normalization and leaves the raw accumulated sum.
///
/// The function returns an error for a ragged source matrix.
pub fn convolve(
    source: &[Vec<f64>],
    kernel: &Kernel,
    use_dynamic_divisor_for_edges: bool,
) -> Result<Vec<Vec<f64>>, AnalysisError> {
    let height = source.len();
    if height == 0 {
        return Ok(Vec::new());
    }
    let width = source[0].len();
    for row in source.iter() {
        if row.len() != width {
            return Err(AnalysisError::DimensionMismatch(format!(
                "Expected source rows of length {}, found {}.",
                width,
                row.len()
            )));
        }
    }

    let radius = kernel.radius() as i64;
    let divisor = kernel.divisor();

    let mut result = vec![vec![0.0; width]; height];
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0.0;
            let mut used_weights = 0.0;
            let mut all_in_bounds = true;

            for (i, kernel_row) in kernel.weights().iter().enumerate() {
                let source_y = y as i64 + i as i64 - radius;
                for (j, &weight) in kernel_row.iter().enumerate() {
                    let source_x = x as i64 + j as i64 - radius;
                    if source_y >= 0
                        && source_y < height as i64
                        && source_x >= 0
                        && source_x < width as i64
                    {
                        acc += weight * source[source_y as usize][source_x as usize];
                        used_weights += weight;
                    } else {
                        all_in_bounds = false;
                    }
                }
            }

            let cell_divisor = if all_in_bounds || !use_dynamic_divisor_for_edges {
                divisor
            } else {
                used_weights
            };
            result[y][x] = if cell_divisor.abs() < DIVISION_EPSILON {
                acc
            } else {
                acc / cell_divisor
            };
        }
    }

    Ok(result)
}
