//! Element-wise array and tensor utilities shared by every analysis stage.
//!
//! Every operation takes immutable inputs and returns a newly allocated result.

use crate::error::AnalysisError;
use crate::DIVISION_EPSILON;

/// Returns a deep copy of the given tensor.
pub fn copy(data: &[Vec<Vec<f64>>]) -> Vec<Vec<Vec<f64>>> {
    data.to_vec()
}

/// Divides every element of the tensor by the given divisor.
/// The function returns an error for a numerically zero divisor.
pub fn divide(data: &[Vec<Vec<f64>>], divisor: f64) -> Result<Vec<Vec<Vec<f64>>>, AnalysisError> {
    check_divisor(divisor)?;
    Ok(map_tensor(data, |value| value / divisor))
}

/// Divides every element of the matrix by the given divisor.
/// The function returns an error for a numerically zero divisor.
pub fn divide_matrix(data: &[Vec<f64>], divisor: f64) -> Result<Vec<Vec<f64>>, AnalysisError> {
    check_divisor(divisor)?;
    Ok(data
        .iter()
        .map(|row| row.iter().map(|value| value / divisor).collect())
        .collect())
}

/// Multiplies every element of the tensor by the given factor.
pub fn multiply(data: &[Vec<Vec<f64>>], factor: f64) -> Vec<Vec<Vec<f64>>> {
    map_tensor(data, |value| value * factor)
}

/// Rounds every element of the tensor to the nearest integer, ties to even.
pub fn round(data: &[Vec<Vec<f64>>]) -> Vec<Vec<Vec<f64>>> {
    map_tensor(data, f64::round_ties_even)
}

/// Rounds every element of the tensor down to the previous integer.
pub fn floor(data: &[Vec<Vec<f64>>]) -> Vec<Vec<Vec<f64>>> {
    map_tensor(data, f64::floor)
}

/// Rounds every element of the tensor up to the next integer.
pub fn ceiling(data: &[Vec<Vec<f64>>]) -> Vec<Vec<Vec<f64>>> {
    map_tensor(data, f64::ceil)
}

/// Returns the element-wise sum of the two vectors.
/// The function returns an error for vectors of different lengths.
pub fn add(x: &[f64], y: &[f64]) -> Result<Vec<f64>, AnalysisError> {
    check_lengths(x.len(), y.len())?;
    Ok(x.iter().zip(y.iter()).map(|(xi, yi)| xi + yi).collect())
}

/// Returns the element-wise difference of the two vectors.
/// The function returns an error for vectors of different lengths.
pub fn subtract(x: &[f64], y: &[f64]) -> Result<Vec<f64>, AnalysisError> {
    check_lengths(x.len(), y.len())?;
    Ok(x.iter().zip(y.iter()).map(|(xi, yi)| xi - yi).collect())
}

/// Subtracts the vector from every row of the matrix.
/// The function returns an error if any row length differs from the vector length.
pub fn subtract_rows<R: AsRef<[f64]>>(
    data: &[R],
    y: &[f64],
) -> Result<Vec<Vec<f64>>, AnalysisError> {
    data.iter().map(|row| subtract(row.as_ref(), y)).collect()
}

/// Returns the negation of the vector.
pub fn negate(x: &[f64]) -> Vec<f64> {
    x.iter().map(|xi| -xi).collect()
}

/// Returns the element-wise sum of an arbitrary number of equal-shaped matrices.
/// The function returns an error for an empty list or for matrices of different shapes.
pub fn sum(matrices: &[Vec<Vec<f64>>]) -> Result<Vec<Vec<f64>>, AnalysisError> {
    let first = matrices.first().ok_or_else(|| {
        AnalysisError::EmptyInput("The sum of an empty list of matrices is undefined.".to_string())
    })?;

    let mut acc = first.clone();
    for matrix in matrices.iter().skip(1) {
        if matrix.len() != acc.len() {
            return Err(AnalysisError::DimensionMismatch(format!(
                "Expected matrices with {} rows, found {}.",
                acc.len(),
                matrix.len()
            )));
        }
        for (acc_row, row) in acc.iter_mut().zip(matrix.iter()) {
            check_lengths(acc_row.len(), row.len())?;
            for (a, value) in acc_row.iter_mut().zip(row.iter()) {
                *a += value;
            }
        }
    }
    Ok(acc)
}

/// Returns the column-wise average of the matrix rows as a single vector.
/// The function returns an error for an empty or ragged matrix.
pub fn mean<R: AsRef<[f64]>>(data: &[R]) -> Result<Vec<f64>, AnalysisError> {
    let first = data.first().ok_or_else(|| {
        AnalysisError::EmptyInput("The mean of an empty collection of rows is undefined.".to_string())
    })?;

    let mut acc = vec![0.0; first.as_ref().len()];
    for row in data {
        let row = row.as_ref();
        check_lengths(acc.len(), row.len())?;
        for (a, value) in acc.iter_mut().zip(row.iter()) {
            *a += value;
        }
    }

    let count = data.len() as f64;
    Ok(acc.into_iter().map(|a| a / count).collect())
}

/// Returns the smallest and largest value of the sequence as a pair.
/// The function returns an error for an empty sequence.
pub fn min_max(data: &[f64]) -> Result<(f64, f64), AnalysisError> {
    if data.is_empty() {
        return Err(AnalysisError::EmptyInput(
            "The extrema of an empty sequence are undefined.".to_string(),
        ));
    }

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for &value in data {
        min = min.min(value);
        max = max.max(value);
    }
    Ok((min, max))
}

/// Returns the outer product of the two vectors, with `result[y][x] = vertical[y] * horizontal[x]`.
pub fn tensor(horizontal: &[f64], vertical: &[f64]) -> Vec<Vec<f64>> {
    vertical
        .iter()
        .map(|v| horizontal.iter().map(|h| v * h).collect())
        .collect()
}

/// Returns the population variance of the sequence (mean computed internally, no Bessel correction).
/// The function returns an error for an empty sequence.
pub fn variance(data: &[f64]) -> Result<f64, AnalysisError> {
    if data.is_empty() {
        return Err(AnalysisError::EmptyInput(
            "The variance of an empty sequence is undefined.".to_string(),
        ));
    }

    let count = data.len() as f64;
    let mu = data.iter().sum::<f64>() / count;
    Ok(data.iter().map(|value| (value - mu) * (value - mu)).sum::<f64>() / count)
}

/// Returns the population standard deviation of the sequence.
/// The function returns an error for an empty sequence.
pub fn std_deviation(data: &[f64]) -> Result<f64, AnalysisError> {
    Ok(variance(data)?.sqrt())
}

fn map_tensor(data: &[Vec<Vec<f64>>], f: impl Fn(f64) -> f64 + Copy) -> Vec<Vec<Vec<f64>>> {
    data.iter()
        .map(|matrix| {
            matrix
                .iter()
                .map(|row| row.iter().map(|&value| f(value)).collect())
                .collect()
        })
        .collect()
}

fn check_divisor(divisor: f64) -> Result<(), AnalysisError> {
    if divisor.abs() < DIVISION_EPSILON {
        return Err(AnalysisError::DivisionByZero(format!(
            "The divisor {} is numerically zero.",
            divisor
        )));
    }
    Ok(())
}

fn check_lengths(expected: usize, found: usize) -> Result<(), AnalysisError> {
    if expected != found {
        return Err(AnalysisError::DimensionMismatch(format!(
            "Expected vectors of length {}, found {}.",
            expected, found
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_copy() {
        let data = vec![vec![vec![1.0, 2.0], vec![3.0, 4.0]], vec![vec![5.0]]];
        let mut copied = copy(&data);

        assert_eq!(copied, data);

        // Test structural independence of the copy
        copied[0][1][0] = -3.0;
        assert_eq!(data[0][1][0], 3.0);
    }

    #[test]
    fn test_divide() {
        let data = vec![vec![vec![2.0, -4.0], vec![6.0, 0.0]]];

        assert_eq!(
            divide(&data, 2.0).unwrap(),
            vec![vec![vec![1.0, -2.0], vec![3.0, 0.0]]]
        );

        // Test numerically zero divisors
        assert_eq!(
            divide(&data, 0.0),
            Err(AnalysisError::DivisionByZero(
                "The divisor 0 is numerically zero.".to_string()
            ))
        );
        assert!(divide(&data, 1e-9).is_err());
        assert!(divide(&data, -1e-9).is_err());
        assert!(divide(&data, 1e-7).is_ok());
    }

    #[test]
    fn test_divide_multiply_round_trip() {
        let data = vec![vec![vec![1.5, -2.25, 0.0], vec![3.0, 4.5, -6.75]]];

        for divisor in [0.3, -1.7, 42.0] {
            let round_trip = multiply(&divide(&data, divisor).unwrap(), divisor);
            for (matrix, original_matrix) in round_trip.iter().zip(data.iter()) {
                for (row, original_row) in matrix.iter().zip(original_matrix.iter()) {
                    for (value, original) in row.iter().zip(original_row.iter()) {
                        assert_relative_eq!(*value, *original, epsilon = 1e-12);
                    }
                }
            }
        }
    }

    #[test]
    fn test_rounding() {
        let data = vec![vec![vec![0.5, 1.5, 2.5, -0.5, 1.2, -1.8]]];

        // Ties go to the even integer
        assert_eq!(round(&data), vec![vec![vec![0.0, 2.0, 2.0, -0.0, 1.0, -2.0]]]);
        assert_eq!(floor(&data), vec![vec![vec![0.0, 1.0, 2.0, -1.0, 1.0, -2.0]]]);
        assert_eq!(ceiling(&data), vec![vec![vec![1.0, 2.0, 3.0, -0.0, 2.0, -1.0]]]);

        // Test idempotence of all three rounding functions
        assert_eq!(round(&round(&data)), round(&data));
        assert_eq!(floor(&floor(&data)), floor(&data));
        assert_eq!(ceiling(&ceiling(&data)), ceiling(&data));
    }

    #[test]
    fn test_add_subtract_negate() {
        let x = vec![1.0, -2.0, 3.0];
        let y = vec![0.5, 1.5, -2.5];

        assert_eq!(add(&x, &y).unwrap(), vec![1.5, -0.5, 0.5]);
        assert_eq!(subtract(&x, &y).unwrap(), vec![0.5, -3.5, 5.5]);

        // Round-trip of the additive inverse
        assert_eq!(subtract(&x, &add(&x, &y).unwrap()).unwrap(), negate(&y));

        // Test incompatible lengths
        assert_eq!(
            add(&x, &[1.0]),
            Err(AnalysisError::DimensionMismatch(
                "Expected vectors of length 3, found 1.".to_string()
            ))
        );
        assert!(subtract(&x, &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_subtract_rows() {
        let data = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]];

        assert_eq!(
            subtract_rows(&data, &[1.0, 2.0]).unwrap(),
            vec![vec![0.0, 0.0], vec![2.0, 2.0], vec![4.0, 4.0]]
        );

        // Test incompatible row length
        assert!(subtract_rows(&data, &[1.0]).is_err());
    }

    #[test]
    fn test_sum() {
        let matrices = vec![
            vec![vec![1.0, 2.0], vec![3.0, 4.0]],
            vec![vec![10.0, 20.0], vec![30.0, 40.0]],
            vec![vec![-1.0, -2.0], vec![-3.0, -4.0]],
        ];

        assert_eq!(
            sum(&matrices).unwrap(),
            vec![vec![10.0, 20.0], vec![30.0, 40.0]]
        );

        // Test a single matrix and an empty list
        assert_eq!(sum(&matrices[..1]).unwrap(), matrices[0]);
        assert!(matches!(sum(&[]), Err(AnalysisError::EmptyInput(_))));

        // Test incompatible shapes
        let ragged = vec![vec![vec![1.0, 2.0]], vec![vec![1.0]]];
        assert!(matches!(
            sum(&ragged),
            Err(AnalysisError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_mean() {
        let data = vec![vec![1.0, -1.0, 4.0], vec![3.0, 1.0, 0.0]];
        assert_eq!(mean(&data).unwrap(), vec![2.0, 0.0, 2.0]);

        // The mean of a single row is that row
        assert_eq!(mean(&data[..1]).unwrap(), data[0]);

        // Borrowed rows are accepted as well
        let borrowed: Vec<&[f64]> = data.iter().map(|row| row.as_slice()).collect();
        assert_eq!(mean(&borrowed).unwrap(), vec![2.0, 0.0, 2.0]);

        // Test empty and ragged input
        assert!(matches!(
            mean(&[] as &[Vec<f64>]),
            Err(AnalysisError::EmptyInput(_))
        ));
        assert!(matches!(
            mean(&[vec![1.0, 2.0], vec![3.0]]),
            Err(AnalysisError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_min_max() {
        assert_eq!(min_max(&[3.0, -1.0, 2.5, -1.5, 0.0]).unwrap(), (-1.5, 3.0));
        assert_eq!(min_max(&[42.0]).unwrap(), (42.0, 42.0));
        assert!(matches!(min_max(&[]), Err(AnalysisError::EmptyInput(_))));
    }

    #[test]
    fn test_tensor() {
        let product = tensor(&[1.0, 2.0], &[3.0, 4.0, 5.0]);

        // Shape is (vertical length, horizontal length)
        assert_eq!(
            product,
            vec![vec![3.0, 6.0], vec![4.0, 8.0], vec![5.0, 10.0]]
        );

        // The outer product of a vector with itself is symmetric
        let square = tensor(&[1.0, -2.0, 3.0], &[1.0, -2.0, 3.0]);
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(square[y][x], square[x][y]);
            }
        }
    }

    #[test]
    fn test_variance_std_deviation() {
        let data = vec![1.0, 2.0, 3.0, 4.0];

        assert_relative_eq!(variance(&data).unwrap(), 1.25, epsilon = 1e-12);
        assert_relative_eq!(std_deviation(&data).unwrap(), 1.25_f64.sqrt(), epsilon = 1e-12);

        // A constant sequence has zero variance
        assert_relative_eq!(variance(&[7.0, 7.0, 7.0]).unwrap(), 0.0, epsilon = 1e-12);

        assert!(matches!(variance(&[]), Err(AnalysisError::EmptyInput(_))));
        assert!(matches!(std_deviation(&[]), Err(AnalysisError::EmptyInput(_))));
    }
}
