//! Dense row-major matrices and the few decompositions the learners need.
//!
//! - Sample covariance of column-centered data
//! - Symmetric eigendecomposition by cyclic Jacobi rotations
//! - Minimum-norm least squares through the eigendecomposition of `AᵀA`

use crate::error::{Result, WordspaceError};
use serde::{Deserialize, Serialize};

const JACOBI_MAX_SWEEPS: usize = 100;
const JACOBI_TOLERANCE: f64 = 1e-14;
/// Relative cutoff below which eigenvalues of `AᵀA` are treated as zero.
const RANK_TOLERANCE: f64 = 1e-12;

/// A dense `rows × cols` matrix of f64, stored row-major.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MatrixData")]
pub struct Matrix {
    rows: usize,
    cols: usize,
    /// Flat row-major: data[r * cols + c]
    data: Vec<f64>,
}

/// Unchecked wire form; deserialization goes through [`Matrix::from_vec`].
#[derive(Deserialize)]
struct MatrixData {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl TryFrom<MatrixData> for Matrix {
    type Error = WordspaceError;

    fn try_from(raw: MatrixData) -> Result<Self> {
        Self::from_vec(raw.rows, raw.cols, raw.data)
    }
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.data[i * n + i] = 1.0;
        }
        m
    }

    /// Wrap flat row-major data.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(WordspaceError::DimensionMismatch {
                expected: rows * cols,
                got: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Stack rows. All rows must have the same length.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(WordspaceError::InvalidArgument(format!(
                    "ragged rows: expected {} columns, got {}",
                    cols,
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Stack columns. All columns must have the same length.
    pub fn from_columns<C: AsRef<[f64]>>(columns: &[C]) -> Result<Self> {
        Ok(Self::from_rows(columns)?.transpose())
    }

    /// One 1-dimensional point per value.
    pub fn column_vector(values: &[f64]) -> Self {
        Self {
            rows: values.len(),
            cols: 1,
            data: values.to_vec(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn get(&self, r: usize, c: usize) -> f64 {
        self.data[r * self.cols + c]
    }

    pub fn set(&mut self, r: usize, c: usize, value: f64) {
        self.data[r * self.cols + c] = value;
    }

    pub fn row(&self, r: usize) -> &[f64] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn row_mut(&mut self, r: usize) -> &mut [f64] {
        &mut self.data[r * self.cols..(r + 1) * self.cols]
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.rows).map(move |r| self.row(r))
    }

    pub fn column(&self, c: usize) -> Vec<f64> {
        (0..self.rows).map(|r| self.get(r, c)).collect()
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn transpose(&self) -> Self {
        let mut t = Self::zeros(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                t.data[c * self.rows + r] = self.data[r * self.cols + c];
            }
        }
        t
    }

    /// Keep the first `n` columns.
    pub fn truncate_columns(&self, n: usize) -> Self {
        let n = n.min(self.cols);
        let mut out = Self::zeros(self.rows, n);
        for r in 0..self.rows {
            out.row_mut(r).copy_from_slice(&self.row(r)[..n]);
        }
        out
    }

    /// Matrix product `self · other`.
    pub fn dot(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(WordspaceError::DimensionMismatch {
                expected: self.cols,
                got: other.rows,
            });
        }
        let mut out = Self::zeros(self.rows, other.cols);
        for r in 0..self.rows {
            for k in 0..self.cols {
                let a = self.data[r * self.cols + k];
                if a == 0.0 {
                    continue;
                }
                let src = other.row(k);
                for (o, b) in out.row_mut(r).iter_mut().zip(src) {
                    *o += a * b;
                }
            }
        }
        Ok(out)
    }

    /// Row vector times matrix: `v · self`.
    pub fn left_multiply(&self, v: &[f64]) -> Result<Vec<f64>> {
        if v.len() != self.rows {
            return Err(WordspaceError::DimensionMismatch {
                expected: self.rows,
                got: v.len(),
            });
        }
        let mut out = vec![0.0; self.cols];
        for (k, &a) in v.iter().enumerate() {
            if a == 0.0 {
                continue;
            }
            for (o, b) in out.iter_mut().zip(self.row(k)) {
                *o += a * b;
            }
        }
        Ok(out)
    }

    /// Per-column mean.
    pub fn column_means(&self) -> Vec<f64> {
        let mut means = vec![0.0; self.cols];
        if self.rows == 0 {
            return means;
        }
        for row in self.iter_rows() {
            for (m, x) in means.iter_mut().zip(row) {
                *m += x;
            }
        }
        let n = self.rows as f64;
        means.iter_mut().for_each(|m| *m /= n);
        means
    }

    /// Per-column population variance.
    pub fn column_variances(&self) -> Vec<f64> {
        let means = self.column_means();
        let mut vars = vec![0.0; self.cols];
        if self.rows == 0 {
            return vars;
        }
        for row in self.iter_rows() {
            for ((v, x), m) in vars.iter_mut().zip(row).zip(&means) {
                *v += (x - m) * (x - m);
            }
        }
        let n = self.rows as f64;
        vars.iter_mut().for_each(|v| *v /= n);
        vars
    }

    /// Sample covariance of the columns (observations are rows), after
    /// subtracting each column's mean. A single observation uses a
    /// denominator of 1.
    pub fn covariance(&self) -> Matrix {
        let means = self.column_means();
        let mut centered = self.clone();
        for r in 0..centered.rows {
            for (x, m) in centered.row_mut(r).iter_mut().zip(&means) {
                *x -= m;
            }
        }
        let denom = self.rows.saturating_sub(1).max(1) as f64;
        let mut cov = Self::zeros(self.cols, self.cols);
        for row in centered.iter_rows() {
            for i in 0..self.cols {
                let xi = row[i];
                if xi == 0.0 {
                    continue;
                }
                for j in i..self.cols {
                    cov.data[i * self.cols + j] += xi * row[j];
                }
            }
        }
        for i in 0..self.cols {
            for j in i..self.cols {
                let v = cov.data[i * self.cols + j] / denom;
                cov.data[i * self.cols + j] = v;
                cov.data[j * self.cols + i] = v;
            }
        }
        cov
    }

    /// Eigendecomposition of a symmetric matrix.
    ///
    /// Returns eigenvalues in descending order and the matching unit
    /// eigenvectors as columns.
    pub fn symmetric_eigen(&self) -> Result<(Vec<f64>, Matrix)> {
        if self.rows != self.cols {
            return Err(WordspaceError::DimensionMismatch {
                expected: self.rows,
                got: self.cols,
            });
        }
        let n = self.rows;
        let mut a = self.data.clone();
        let mut v = Self::identity(n).data;

        let scale: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
        for _ in 0..JACOBI_MAX_SWEEPS {
            let off: f64 = (0..n)
                .flat_map(|p| ((p + 1)..n).map(move |q| (p, q)))
                .map(|(p, q)| a[p * n + q] * a[p * n + q])
                .sum::<f64>()
                .sqrt();
            if off <= JACOBI_TOLERANCE * scale.max(f64::MIN_POSITIVE) {
                break;
            }
            for p in 0..n {
                for q in (p + 1)..n {
                    let apq = a[p * n + q];
                    if apq == 0.0 {
                        continue;
                    }
                    let theta = (a[q * n + q] - a[p * n + p]) / (2.0 * apq);
                    let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                    let c = 1.0 / (t * t + 1.0).sqrt();
                    let s = t * c;
                    rotate_columns(&mut a, n, p, q, c, s);
                    rotate_rows(&mut a, n, p, q, c, s);
                    rotate_columns(&mut v, n, p, q, c, s);
                }
            }
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&i, &j| a[j * n + j].total_cmp(&a[i * n + i]));

        let values = order.iter().map(|&i| a[i * n + i]).collect();
        let mut vectors = Self::zeros(n, n);
        for (dst, &src) in order.iter().enumerate() {
            for r in 0..n {
                vectors.data[r * n + dst] = v[r * n + src];
            }
        }
        Ok((values, vectors))
    }

    /// Minimum-norm least-squares solution `x` of `self · x ≈ b`.
    ///
    /// Solving through `AᵀA` squares the condition number: center and scale
    /// the columns first when they sit far from the origin.
    pub fn least_squares(&self, b: &[f64]) -> Result<Vec<f64>> {
        if b.len() != self.rows {
            return Err(WordspaceError::DimensionMismatch {
                expected: self.rows,
                got: b.len(),
            });
        }
        let at = self.transpose();
        let ata = at.dot(self)?;
        let atb = at.mul_vector(b);
        let (values, vectors) = ata.symmetric_eigen()?;

        let largest = values.first().copied().unwrap_or(0.0).max(0.0);
        let cutoff = largest * RANK_TOLERANCE;
        let mut x = vec![0.0; self.cols];
        for (i, &lambda) in values.iter().enumerate() {
            if lambda <= cutoff || lambda <= 0.0 {
                continue;
            }
            let vi = vectors.column(i);
            let coeff = vi.iter().zip(&atb).map(|(a, b)| a * b).sum::<f64>() / lambda;
            for (xj, vj) in x.iter_mut().zip(&vi) {
                *xj += coeff * vj;
            }
        }
        Ok(x)
    }

    /// `self · b` for a column vector `b` (length = cols).
    fn mul_vector(&self, b: &[f64]) -> Vec<f64> {
        self.iter_rows()
            .map(|row| row.iter().zip(b).map(|(x, y)| x * y).sum())
            .collect()
    }
}

fn rotate_columns(m: &mut [f64], n: usize, p: usize, q: usize, c: f64, s: f64) {
    for k in 0..n {
        let mp = m[k * n + p];
        let mq = m[k * n + q];
        m[k * n + p] = c * mp - s * mq;
        m[k * n + q] = s * mp + c * mq;
    }
}

fn rotate_rows(m: &mut [f64], n: usize, p: usize, q: usize, c: f64, s: f64) {
    for k in 0..n {
        let mp = m[p * n + k];
        let mq = m[q * n + k];
        m[p * n + k] = c * mp - s * mq;
        m[q * n + k] = s * mp + c * mq;
    }
}

/// Squared Euclidean distance.
#[inline]
pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[inline]
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "expected {}, got {}", b, a);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let err = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, WordspaceError::InvalidArgument(_)));
    }

    #[test]
    fn test_transpose_and_dot() {
        let a = Matrix::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
        let at = a.transpose();
        assert_eq!(at.rows(), 3);
        assert_eq!(at.row(2), &[3.0, 6.0]);

        let p = a.dot(&at).unwrap();
        assert_eq!(p.row(0), &[14.0, 32.0]);
        assert_eq!(p.row(1), &[32.0, 77.0]);

        assert!(a.dot(&a).is_err());
    }

    #[test]
    fn test_left_multiply() {
        let m = Matrix::from_columns(&[[1.0, 2.0, 3.0], [2.0, 4.0, 0.0]]).unwrap();
        assert_eq!(m.left_multiply(&[1.0, 2.0, 3.0]).unwrap(), vec![14.0, 10.0]);
    }

    #[test]
    fn test_covariance_is_mean_centered() {
        let m = Matrix::from_rows(&[[1.0, 10.0], [3.0, 10.0], [5.0, 10.0]]).unwrap();
        let cov = m.covariance();
        assert_close(cov.get(0, 0), 4.0);
        assert_close(cov.get(1, 1), 0.0);
        assert_close(cov.get(0, 1), 0.0);
    }

    #[test]
    fn test_symmetric_eigen_descending() {
        let m = Matrix::from_rows(&[[2.0, 1.0, 0.0], [1.0, 2.0, 0.0], [0.0, 0.0, 5.0]]).unwrap();
        let (values, vectors) = m.symmetric_eigen().unwrap();
        assert_close(values[0], 5.0);
        assert_close(values[1], 3.0);
        assert_close(values[2], 1.0);

        // A v = λ v for every pair
        for (i, &lambda) in values.iter().enumerate() {
            let v = vectors.column(i);
            let av = m.transpose().left_multiply(&v).unwrap();
            for (x, y) in av.iter().zip(&v) {
                assert_close(*x, lambda * y);
            }
            assert_close(dot(&v, &v), 1.0);
        }
        assert_close(dot(&vectors.column(0), &vectors.column(1)), 0.0);
    }

    #[test]
    fn test_least_squares_exact_line() {
        // y = 1 + 2x
        let a = Matrix::from_rows(&[[1.0, 0.0], [1.0, 1.0], [1.0, 2.0], [1.0, 3.0]]).unwrap();
        let x = a.least_squares(&[1.0, 3.0, 5.0, 7.0]).unwrap();
        assert_close(x[0], 1.0);
        assert_close(x[1], 2.0);
    }

    #[test]
    fn test_least_squares_rank_deficient_is_minimum_norm() {
        // Two identical columns: min-norm solution splits the weight evenly.
        let a = Matrix::from_rows(&[[1.0, 1.0], [2.0, 2.0]]).unwrap();
        let x = a.least_squares(&[2.0, 4.0]).unwrap();
        assert_close(x[0], 1.0);
        assert_close(x[1], 1.0);
    }

    #[test]
    fn test_deserialize_checks_shape() {
        let m: Matrix = serde_json::from_str(r#"{"rows":1,"cols":2,"data":[1.0,2.0]}"#).unwrap();
        assert_eq!(m.row(0), &[1.0, 2.0]);

        let short = serde_json::from_str::<Matrix>(r#"{"rows":2,"cols":2,"data":[1.0]}"#);
        assert!(short.is_err());
    }

    #[test]
    fn test_squared_distance() {
        assert_eq!(squared_distance(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
    }
}
