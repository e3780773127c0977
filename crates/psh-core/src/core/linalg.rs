use nalgebra::DMatrix;
use std::ops::{Index, IndexMut};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatrixError {
    #[error("a {width}x{width} matrix needs {expected} entries, found {found}")]
    ShapeMismatch {
        width: usize,
        expected: usize,
        found: usize,
    },
    #[error("block of width {requested} exceeds matrix width {width}")]
    BlockOutOfRange { requested: usize, width: usize },
}

/// Dense square matrix stored row-major, element `(i, j)` at `i * width + j`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SquareMatrix {
    width: usize,
    data: Vec<f64>,
}

impl SquareMatrix {
    pub fn zeros(width: usize) -> Self {
        Self {
            width,
            data: vec![0.0; width * width],
        }
    }

    pub fn from_row_major(width: usize, data: Vec<f64>) -> Result<Self, MatrixError> {
        let expected = width * width;
        if data.len() != expected {
            return Err(MatrixError::ShapeMismatch {
                width,
                expected,
                found: data.len(),
            });
        }
        Ok(Self { width, data })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.width..(i + 1) * self.width]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Element-wise combination of two matrices of equal width.
    pub fn zip_with(
        &self,
        other: &SquareMatrix,
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<SquareMatrix, MatrixError> {
        if other.width != self.width {
            return Err(MatrixError::ShapeMismatch {
                width: self.width,
                expected: self.data.len(),
                found: other.data.len(),
            });
        }
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(Self {
            width: self.width,
            data,
        })
    }

    /// Copy of the upper-left `n x n` block.
    pub fn leading_block(&self, n: usize) -> Result<DMatrix<f64>, MatrixError> {
        if n > self.width {
            return Err(MatrixError::BlockOutOfRange {
                requested: n,
                width: self.width,
            });
        }
        Ok(DMatrix::from_fn(n, n, |i, j| self[(i, j)]))
    }
}

impl Index<(usize, usize)> for SquareMatrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.data[i * self.width + j]
    }
}

impl IndexMut<(usize, usize)> for SquareMatrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        &mut self.data[i * self.width + j]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexing_is_row_major() {
        let m = SquareMatrix::from_row_major(2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(m[(0, 1)], 2.0);
        assert_eq!(m[(1, 0)], 3.0);
        assert_eq!(m.row(1), &[3.0, 4.0]);
    }

    #[test]
    fn from_row_major_rejects_wrong_length() {
        let err = SquareMatrix::from_row_major(3, vec![0.0; 8]).unwrap_err();
        assert_eq!(
            err,
            MatrixError::ShapeMismatch {
                width: 3,
                expected: 9,
                found: 8
            }
        );
    }

    #[test]
    fn zip_with_combines_elementwise() {
        let a = SquareMatrix::from_row_major(2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let b = SquareMatrix::from_row_major(2, vec![10.0, 20.0, 30.0, 40.0]).unwrap();
        let c = a.zip_with(&b, |x, y| y - x).unwrap();
        assert_eq!(c.as_slice(), &[9.0, 18.0, 27.0, 36.0]);
        assert!(a.zip_with(&SquareMatrix::zeros(3), |x, _| x).is_err());
    }

    #[test]
    fn leading_block_copies_upper_left_corner() {
        let mut m = SquareMatrix::zeros(3);
        m[(0, 0)] = 1.0;
        m[(0, 1)] = 2.0;
        m[(1, 0)] = 3.0;
        m[(2, 2)] = 9.0;
        let block = m.leading_block(2).unwrap();
        assert_eq!(block[(0, 1)], 2.0);
        assert_eq!(block[(1, 0)], 3.0);
        assert_eq!(m.leading_block(0).unwrap().nrows(), 0);
        assert!(m.leading_block(4).is_err());
    }
}
