//! Error module for the revcorr library.
use std::error::Error;
use std::fmt;

/// Error types for the library.
#[derive(Debug, PartialEq)]
pub enum AnalysisError {
    /// Error for operands with incompatible shapes, e.g., vectors of different lengths.
    DimensionMismatch(String),
    /// Error for a division whose divisor is numerically zero.
    DivisionByZero(String),
    /// Error for a malformed convolution kernel, e.g., non-square or even-sized.
    InvalidKernel(String),
    /// Error for an operation requiring at least one sample, e.g., min/max of nothing.
    EmptyInput(String),
    /// Error for invalid parameters.
    InvalidParameter(String),
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AnalysisError::DimensionMismatch(e) => write!(f, "Dimension mismatch: {}", e),
            AnalysisError::DivisionByZero(e) => write!(f, "Division by zero: {}", e),
            AnalysisError::InvalidKernel(e) => write!(f, "Invalid kernel: {}", e),
            AnalysisError::EmptyInput(e) => write!(f, "Empty input: {}", e),
            AnalysisError::InvalidParameter(e) => write!(f, "Invalid parameters: {}", e),
        }
    }
}

impl Error for AnalysisError {}
