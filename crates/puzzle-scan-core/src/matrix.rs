//! Dense row-major matrix algebra backing the homography solve.
//!
//! Elimination and LU decomposition are deliberately unpivoted: the
//! homography solve feeds well-conditioned normal matrices through them, and
//! an exactly zero pivot (collinear or coincident corners) is surfaced as
//! [`MatrixError::ZeroPivot`] instead of dividing through.

/// Shape or conditioning failures of matrix operations.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixError {
    #[error("dimension mismatch: cannot combine {left_rows}x{left_cols} with {right_rows}x{right_cols}")]
    DimensionMismatch {
        left_rows: usize,
        left_cols: usize,
        right_rows: usize,
        right_cols: usize,
    },

    #[error("singular system: zero pivot at elimination step {step}")]
    ZeroPivot { step: usize },
}

/// Rectangular `f64` matrix, row-major, dimensions fixed at construction.
#[derive(Clone, Debug, PartialEq)]
pub struct DenseMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl DenseMatrix {
    /// Zero-filled `rows x cols` matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// `n x n` identity.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        m
    }

    /// Build a matrix from fixed-width rows.
    pub fn from_rows<const N: usize>(rows: &[[f64; N]]) -> Self {
        let mut m = Self::zeros(rows.len(), N);
        for (r, row) in rows.iter().enumerate() {
            m.data[r * N..(r + 1) * N].copy_from_slice(row);
        }
        m
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Element at `(row, col)`. Panics on out-of-bounds indexes, like slice
    /// indexing.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    /// Borrow one row as a slice.
    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Matrix product `self * rhs`.
    pub fn mul(&self, rhs: &DenseMatrix) -> Result<DenseMatrix, MatrixError> {
        if self.cols != rhs.rows {
            return Err(MatrixError::DimensionMismatch {
                left_rows: self.rows,
                left_cols: self.cols,
                right_rows: rhs.rows,
                right_cols: rhs.cols,
            });
        }
        let mut out = DenseMatrix::zeros(self.rows, rhs.cols);
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.data[i * self.cols + k];
                for j in 0..rhs.cols {
                    out.data[i * rhs.cols + j] += a * rhs.data[k * rhs.cols + j];
                }
            }
        }
        Ok(out)
    }

    pub fn transpose(&self) -> DenseMatrix {
        let mut out = DenseMatrix::zeros(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                out.data[c * self.rows + r] = self.data[r * self.cols + c];
            }
        }
        out
    }

    /// Unpivoted Gauss-Jordan elimination.
    ///
    /// Reduces `self` to the identity in place while applying the same row
    /// operations to `rhs`. On return `rhs` holds the solution of
    /// `self * x = rhs`.
    pub fn gauss_jordan(&mut self, rhs: &mut DenseMatrix) -> Result<(), MatrixError> {
        if self.rows != self.cols || rhs.rows != self.rows {
            return Err(MatrixError::DimensionMismatch {
                left_rows: self.rows,
                left_cols: self.cols,
                right_rows: rhs.rows,
                right_cols: rhs.cols,
            });
        }
        let n = self.rows;
        for step in 0..n {
            let pivot = self.data[step * n + step];
            if pivot == 0.0 {
                return Err(MatrixError::ZeroPivot { step });
            }
            for j in 0..n {
                self.data[step * n + j] /= pivot;
            }
            for j in 0..rhs.cols {
                rhs.data[step * rhs.cols + j] /= pivot;
            }
            for i in 0..n {
                if i == step {
                    continue;
                }
                let factor = self.data[i * n + step];
                for j in 0..n {
                    let sub = self.data[step * n + j] * factor;
                    self.data[i * n + j] -= sub;
                }
                for j in 0..rhs.cols {
                    let sub = rhs.data[step * rhs.cols + j] * factor;
                    rhs.data[i * rhs.cols + j] -= sub;
                }
            }
        }
        Ok(())
    }

    /// Solve `self * x = rhs` without mutating either operand.
    pub fn solve(&self, rhs: &DenseMatrix) -> Result<DenseMatrix, MatrixError> {
        let mut a = self.clone();
        let mut x = rhs.clone();
        a.gauss_jordan(&mut x)?;
        Ok(x)
    }

    /// Inverse via elimination with an identity right-hand side.
    pub fn inverse(&self) -> Result<DenseMatrix, MatrixError> {
        self.solve(&DenseMatrix::identity(self.rows))
    }

    /// Unpivoted LU decomposition (Doolittle, `L` unit-diagonal).
    pub fn lu(&self) -> Result<(DenseMatrix, DenseMatrix), MatrixError> {
        if self.rows != self.cols {
            return Err(MatrixError::DimensionMismatch {
                left_rows: self.rows,
                left_cols: self.cols,
                right_rows: self.rows,
                right_cols: self.cols,
            });
        }
        let n = self.rows;
        let mut l = DenseMatrix::identity(n);
        let mut u = self.clone();
        for step in 0..n {
            let pivot = u.data[step * n + step];
            // The final diagonal entry is never divided by; a zero there just
            // means a zero determinant.
            if pivot == 0.0 && step + 1 < n {
                return Err(MatrixError::ZeroPivot { step });
            }
            for i in step + 1..n {
                let ratio = u.data[i * n + step] / pivot;
                l.data[i * n + step] = ratio;
                for j in 0..n {
                    let sub = u.data[step * n + j] * ratio;
                    u.data[i * n + j] -= sub;
                }
            }
        }
        Ok((l, u))
    }

    /// Determinant as the product of `U`'s diagonal.
    pub fn determinant(&self) -> Result<f64, MatrixError> {
        let (_, u) = self.lu()?;
        let mut det = 1.0;
        for i in 0..self.rows {
            det *= u.data[i * self.rows + i];
        }
        Ok(det)
    }
}
