use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{error::RuntimeError, interpreter::value::complex::ComplexNumber};

/// Relative pivot tolerance for rank and inversion.
const PIVOT_TOLERANCE: f64 = 1e-12;

/// A rectangular matrix of complex numbers in row-major order.
///
/// Matrices are immutable values: every operation builds a new matrix.
/// Entries are stored as [`ComplexNumber`] so that complex results of
/// element arithmetic never need a separate representation; purely real
/// matrices display their entries as reals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<ComplexNumber>,
}

impl Matrix {
    /// Builds a matrix from a list of equally long rows.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if the rows differ in length or the list is
    /// empty.
    ///
    /// # Example
    /// ```
    /// use mensura::interpreter::value::{complex::ComplexNumber, matrix::Matrix};
    ///
    /// let m = Matrix::from_rows(vec![vec![ComplexNumber::new(1.0, 0.0)],
    ///                                vec![ComplexNumber::new(2.0, 0.0)]]).unwrap();
    /// assert_eq!(m.rows(), 2);
    /// assert_eq!(m.cols(), 1);
    /// ```
    pub fn from_rows(rows: Vec<Vec<ComplexNumber>>) -> Result<Self, RuntimeError> {
        let Some(first) = rows.first() else {
            return Err(RuntimeError::ShapeMismatch { details: "a matrix needs at least one row".to_string(), });
        };

        let cols = first.len();
        if rows.iter().any(|row| row.len() != cols) {
            return Err(RuntimeError::ShapeMismatch { details: "matrix rows differ in length".to_string(), });
        }

        let row_count = rows.len();
        let data = rows.into_iter().flatten().collect();

        Ok(Self { rows: row_count,
                  cols,
                  data })
    }

    /// Builds a single-row matrix from a list of entries.
    pub fn row(entries: Vec<ComplexNumber>) -> Result<Self, RuntimeError> {
        Self::from_rows(vec![entries])
    }

    /// The number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// The number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// The entry at `(row, col)`, zero-based.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> ComplexNumber {
        self.data[row * self.cols + col]
    }

    /// Applies `f` to every entry, producing a new matrix of the same shape.
    #[must_use]
    pub fn map(&self, f: impl Fn(ComplexNumber) -> ComplexNumber) -> Self {
        Self { rows: self.rows,
               cols: self.cols,
               data: self.data.iter().map(|&c| f(c)).collect(), }
    }

    /// Combines two matrices entry by entry.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if the shapes differ.
    pub fn zip_map(&self,
                   other: &Self,
                   f: impl Fn(ComplexNumber, ComplexNumber) -> ComplexNumber)
                   -> Result<Self, RuntimeError> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(shape_error("elementwise operation", self, other));
        }

        let data = self.data
                       .iter()
                       .zip(other.data.iter())
                       .map(|(&a, &b)| f(a, b))
                       .collect();

        Ok(Self { rows: self.rows,
                  cols: self.cols,
                  data })
    }

    /// Multiplies every entry by a scalar.
    #[must_use]
    pub fn scale(&self, factor: ComplexNumber) -> Self {
        self.map(|c| c * factor)
    }

    /// Returns the transpose.
    ///
    /// # Example
    /// ```
    /// use mensura::interpreter::value::{complex::ComplexNumber, matrix::Matrix};
    ///
    /// let m = Matrix::row(vec![ComplexNumber::new(2.0, 0.0), ComplexNumber::new(1.0, 0.0)]).unwrap();
    /// let t = m.transpose();
    /// assert_eq!(t.rows(), 2);
    /// assert_eq!(t.cols(), 1);
    /// assert_eq!(t.get(1, 0), ComplexNumber::new(1.0, 0.0));
    /// ```
    #[must_use]
    pub fn transpose(&self) -> Self {
        let mut data = Vec::with_capacity(self.data.len());

        for col in 0..self.cols {
            for row in 0..self.rows {
                data.push(self.get(row, col));
            }
        }

        Self { rows: self.cols,
               cols: self.rows,
               data }
    }

    /// Sums the leading diagonal (the first `min(rows, cols)` entries).
    #[must_use]
    pub fn trace(&self) -> ComplexNumber {
        let mut sum = ComplexNumber::new(0.0, 0.0);

        for i in 0..self.rows.min(self.cols) {
            sum += self.get(i, i);
        }

        sum
    }

    /// Computes the matrix product `self * other`.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` unless `self.cols() == other.rows()`.
    pub fn matmul(&self, other: &Self) -> Result<Self, RuntimeError> {
        if self.cols != other.rows {
            return Err(shape_error("matrix multiplication", self, other));
        }

        let mut data = Vec::with_capacity(self.rows * other.cols);

        for row in 0..self.rows {
            for col in 0..other.cols {
                let mut sum = ComplexNumber::new(0.0, 0.0);
                for k in 0..self.cols {
                    sum += self.get(row, k) * other.get(k, col);
                }
                data.push(sum);
            }
        }

        Ok(Self { rows: self.rows,
                  cols: other.cols,
                  data })
    }

    /// Computes the determinant by Gaussian elimination with partial
    /// pivoting on entry magnitude.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if the matrix is not square.
    ///
    /// # Example
    /// ```
    /// use mensura::interpreter::value::{complex::ComplexNumber, matrix::Matrix};
    ///
    /// let m = Matrix::from_rows(vec![vec![ComplexNumber::from(1.0), ComplexNumber::from(2.0)],
    ///                                vec![ComplexNumber::from(3.0), ComplexNumber::from(4.0)]]).unwrap();
    /// let d = m.determinant().unwrap();
    /// assert!((d.real + 2.0).abs() < 1e-10);
    /// ```
    pub fn determinant(&self) -> Result<ComplexNumber, RuntimeError> {
        if self.rows != self.cols {
            return Err(RuntimeError::ShapeMismatch { details: format!("determinant requires a square matrix, got {}x{}",
                                                                      self.rows, self.cols), });
        }

        let n = self.rows;
        let mut work = self.data.clone();
        let mut det = ComplexNumber::new(1.0, 0.0);

        for col in 0..n {
            let Some(pivot_row) = pivot_below(&work, n, col, 0.0) else {
                return Ok(ComplexNumber::new(0.0, 0.0));
            };

            if pivot_row != col {
                swap_rows(&mut work, n, pivot_row, col);
                det = -det;
            }

            let pivot = work[col * n + col];
            det *= pivot;

            for row in col + 1..n {
                let factor = work[row * n + col] / pivot;
                for k in col..n {
                    let sub = factor * work[col * n + k];
                    work[row * n + k] = work[row * n + k] - sub;
                }
            }
        }

        Ok(det)
    }

    /// Computes the rank by reduction to row echelon form.
    ///
    /// Pivots below a relative tolerance of the largest entry magnitude are
    /// treated as zero.
    ///
    /// # Example
    /// ```
    /// use mensura::interpreter::value::{complex::ComplexNumber, matrix::Matrix};
    ///
    /// let m = Matrix::from_rows(vec![vec![ComplexNumber::from(1.0), ComplexNumber::from(2.0)],
    ///                                vec![ComplexNumber::from(2.0), ComplexNumber::from(4.0)]]).unwrap();
    /// assert_eq!(m.rank(), 1);
    /// ```
    #[must_use]
    pub fn rank(&self) -> usize {
        let tolerance = self.pivot_threshold();
        let mut work = self.data.clone();
        let cols = self.cols;

        let mut rank = 0;

        for col in 0..cols {
            if rank == self.rows {
                break;
            }

            let pivot_row = (rank..self.rows).max_by(|&a, &b| {
                                                 work[a * cols + col].abs()
                                                                     .total_cmp(&work[b * cols + col].abs())
                                             });

            let Some(pivot_row) = pivot_row else { break };
            if work[pivot_row * cols + col].abs() <= tolerance {
                continue;
            }

            swap_rows(&mut work, cols, pivot_row, rank);

            let pivot = work[rank * cols + col];
            for row in rank + 1..self.rows {
                let factor = work[row * cols + col] / pivot;
                for k in col..cols {
                    let sub = factor * work[rank * cols + k];
                    work[row * cols + k] = work[row * cols + k] - sub;
                }
            }

            rank += 1;
        }

        rank
    }

    /// Computes the inverse by Gauss-Jordan elimination of the augmented
    /// matrix.
    ///
    /// # Errors
    /// - `ShapeMismatch` if the matrix is not square.
    /// - `SingularMatrix` if no usable pivot is found for some column.
    pub fn inverse(&self) -> Result<Self, RuntimeError> {
        if self.rows != self.cols {
            return Err(RuntimeError::ShapeMismatch { details: format!("inverse requires a square matrix, got {}x{}",
                                                                      self.rows, self.cols), });
        }

        let n = self.rows;
        let tolerance = self.pivot_threshold();
        let mut work = self.data.clone();

        // Start from the identity and mirror every row operation onto it.
        let mut result = vec![ComplexNumber::new(0.0, 0.0); n * n];
        for i in 0..n {
            result[i * n + i] = ComplexNumber::new(1.0, 0.0);
        }

        for col in 0..n {
            let pivot_row = pivot_below(&work, n, col, tolerance).ok_or(RuntimeError::SingularMatrix)?;

            if pivot_row != col {
                swap_rows(&mut work, n, pivot_row, col);
                swap_rows(&mut result, n, pivot_row, col);
            }

            let pivot = work[col * n + col];
            for k in 0..n {
                work[col * n + k] = work[col * n + k] / pivot;
                result[col * n + k] = result[col * n + k] / pivot;
            }

            for row in 0..n {
                if row == col {
                    continue;
                }
                let factor = work[row * n + col];
                for k in 0..n {
                    let work_sub = factor * work[col * n + k];
                    work[row * n + k] = work[row * n + k] - work_sub;

                    let result_sub = factor * result[col * n + k];
                    result[row * n + k] = result[row * n + k] - result_sub;
                }
            }
        }

        Ok(Self { rows: n,
                  cols: n,
                  data: result })
    }

    /// The magnitude below which a pivot counts as zero for this matrix.
    fn pivot_threshold(&self) -> f64 {
        let largest = self.data
                          .iter()
                          .map(ComplexNumber::abs)
                          .fold(0.0_f64, f64::max);

        (largest * PIVOT_TOLERANCE).max(f64::EPSILON)
    }
}

/// Finds the row at or below `col` with the largest pivot magnitude, or
/// `None` if every candidate is within the tolerance.
fn pivot_below(data: &[ComplexNumber],
               cols: usize,
               col: usize,
               tolerance: f64)
               -> Option<usize> {
    let rows = data.len() / cols;
    let best = (col..rows).max_by(|&a, &b| {
                              data[a * cols + col].abs()
                                                  .total_cmp(&data[b * cols + col].abs())
                          })?;

    if data[best * cols + col].abs() <= tolerance {
        None
    } else {
        Some(best)
    }
}

fn swap_rows(data: &mut [ComplexNumber], cols: usize, a: usize, b: usize) {
    for k in 0..cols {
        data.swap(a * cols + k, b * cols + k);
    }
}

fn shape_error(operation: &str, left: &Matrix, right: &Matrix) -> RuntimeError {
    RuntimeError::ShapeMismatch { details: format!("{operation} with shapes {}x{} and {}x{}",
                                                   left.rows, left.cols, right.rows, right.cols), }
}

impl Display for Matrix {
    /// Renders the matrix in input syntax: `[1 2]` for a single row,
    /// `[[1 2] [3 4]]` otherwise.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let single_row = self.rows == 1;

        if !single_row {
            write!(f, "[")?;
        }

        for row in 0..self.rows {
            if row > 0 {
                write!(f, " ")?;
            }
            write!(f, "[")?;
            for col in 0..self.cols {
                if col > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", self.get(row, col))?;
            }
            write!(f, "]")?;
        }

        if !single_row {
            write!(f, "]")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn real_matrix(rows: &[&[f64]]) -> Matrix {
        Matrix::from_rows(rows.iter()
                              .map(|row| row.iter().map(|&x| ComplexNumber::from(x)).collect())
                              .collect()).unwrap()
    }

    #[test]
    fn matmul_outer_product() {
        let column = real_matrix(&[&[2.0], &[1.0]]);
        let row = real_matrix(&[&[1.0, 2.0]]);

        let product = column.matmul(&row).unwrap();

        assert_eq!(product.rows(), 2);
        assert_eq!(product.cols(), 2);
        assert_eq!(product.get(0, 1), ComplexNumber::from(4.0));
        assert!((product.trace().real - 4.0).abs() < 1e-10);
    }

    #[test]
    fn matmul_rejects_inner_dimension_mismatch() {
        let a = real_matrix(&[&[1.0, 2.0]]);
        let b = real_matrix(&[&[1.0, 2.0]]);

        assert!(matches!(a.matmul(&b), Err(RuntimeError::ShapeMismatch { .. })));
    }

    #[test]
    fn determinant_of_known_matrix() {
        let m = real_matrix(&[&[4.0, 7.0], &[2.0, 6.0]]);
        let d = m.determinant().unwrap();

        assert!((d.real - 10.0).abs() < 1e-10);
        assert!(d.imaginary.abs() < 1e-10);
    }

    #[test]
    fn determinant_requires_square() {
        let m = real_matrix(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]);
        assert!(matches!(m.determinant(), Err(RuntimeError::ShapeMismatch { .. })));
    }

    #[test]
    fn rank_detects_dependent_rows() {
        let m = real_matrix(&[&[1.0, 2.0], &[2.0, 4.0]]);
        assert_eq!(m.rank(), 1);

        let full = real_matrix(&[&[1.0, 0.0], &[0.0, 1.0]]);
        assert_eq!(full.rank(), 2);
    }

    #[test]
    fn inverse_times_original_is_identity() {
        let m = real_matrix(&[&[4.0, 7.0], &[2.0, 6.0]]);
        let inv = m.inverse().unwrap();
        let product = m.matmul(&inv).unwrap();

        for row in 0..2 {
            for col in 0..2 {
                let expected = if row == col { 1.0 } else { 0.0 };
                assert!((product.get(row, col).real - expected).abs() < 1e-10);
                assert!(product.get(row, col).imaginary.abs() < 1e-10);
            }
        }
    }

    #[test]
    fn inverse_of_singular_matrix_fails() {
        let m = real_matrix(&[&[1.0, 2.0], &[2.0, 4.0]]);
        assert!(matches!(m.inverse(), Err(RuntimeError::SingularMatrix)));
    }

    #[test]
    fn display_round_trips_input_syntax() {
        let row = real_matrix(&[&[1.0, 2.0]]);
        assert_eq!(row.to_string(), "[1 2]");

        let square = real_matrix(&[&[1.0, 2.0], &[3.0, 4.0]]);
        assert_eq!(square.to_string(), "[[1 2] [3 4]]");
    }
}
