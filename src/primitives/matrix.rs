//! Matrix type for 2D numeric data.

use super::Vector;
use serde::{Deserialize, Serialize};

/// A 2D matrix of values (row-major storage).
///
/// # Examples
///
/// ```
/// use vfeval::primitives::Matrix;
///
/// let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
///     .expect("data length matches rows * cols");
/// assert_eq!(m.shape(), (2, 3));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T: Copy> Matrix<T> {
    /// Creates a new matrix from a vector of data.
    ///
    /// # Errors
    ///
    /// Returns an error if data length doesn't match rows * cols.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self, &'static str> {
        if data.len() != rows * cols {
            return Err("Data length must equal rows * cols");
        }
        Ok(Self { data, rows, cols })
    }

    /// Returns the shape as (rows, cols).
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.cols
    }

    /// Gets element at (row, col).
    ///
    /// # Panics
    ///
    /// Panics if indices are out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.cols + col]
    }

    /// Sets element at (row, col).
    ///
    /// # Panics
    ///
    /// Panics if indices are out of bounds.
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.data[row * self.cols + col] = value;
    }

    /// Returns a row as a slice.
    #[must_use]
    pub fn row(&self, row_idx: usize) -> &[T] {
        let start = row_idx * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Returns a column as a Vector.
    #[must_use]
    pub fn column(&self, col_idx: usize) -> Vector<T> {
        let data: Vec<T> = (0..self.rows)
            .map(|row| self.data[row * self.cols + col_idx])
            .collect();
        Vector::from_vec(data)
    }

    /// Returns the underlying data as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Builds a new matrix from the given row indices, in order.
    ///
    /// Indices may repeat (bootstrap sampling relies on this).
    ///
    /// # Panics
    ///
    /// Panics if an index is out of bounds.
    #[must_use]
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &idx in indices {
            data.extend_from_slice(self.row(idx));
        }
        Self {
            data,
            rows: indices.len(),
            cols: self.cols,
        }
    }

    /// Builds a new matrix keeping only the given columns, in order.
    ///
    /// # Errors
    ///
    /// Returns an error if a column index is out of bounds.
    pub fn select_columns(&self, columns: &[usize]) -> Result<Self, &'static str> {
        if columns.iter().any(|&c| c >= self.cols) {
            return Err("Column index out of bounds");
        }
        let mut data = Vec::with_capacity(self.rows * columns.len());
        for row in 0..self.rows {
            for &col in columns {
                data.push(self.get(row, col));
            }
        }
        Ok(Self {
            data,
            rows: self.rows,
            cols: columns.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Matrix<f32> {
        Matrix::from_vec(3, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).expect("valid dims")
    }

    #[test]
    fn test_from_vec_shape() {
        let m = sample();
        assert_eq!(m.shape(), (3, 2));
        assert_eq!(m.get(1, 1), 4.0);
    }

    #[test]
    fn test_from_vec_bad_length() {
        assert!(Matrix::from_vec(2, 2, vec![1.0]).is_err());
    }

    #[test]
    fn test_row_and_column() {
        let m = sample();
        assert_eq!(m.row(2), &[5.0, 6.0]);
        assert_eq!(m.column(0).as_slice(), &[1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_select_rows() {
        let m = sample();
        let sub = m.select_rows(&[2, 0, 2]);
        assert_eq!(sub.shape(), (3, 2));
        assert_eq!(sub.row(0), &[5.0, 6.0]);
        assert_eq!(sub.row(1), &[1.0, 2.0]);
        assert_eq!(sub.row(2), &[5.0, 6.0]);
    }

    #[test]
    fn test_select_columns() {
        let m = sample();
        let sub = m.select_columns(&[1]).expect("valid column");
        assert_eq!(sub.shape(), (3, 1));
        assert_eq!(sub.column(0).as_slice(), &[2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_select_columns_out_of_bounds() {
        let m = sample();
        assert!(m.select_columns(&[7]).is_err());
    }
}
