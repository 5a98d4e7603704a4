//! Linear least-squares regression and the logistic classifier built on it.

use crate::error::{Result, WordspaceError};
use crate::kernel::matrix::Matrix;
use serde::{Deserialize, Serialize};

/// Coefficients `[a0, a1, …, ad]` of `prediction = a0 + a1·x1 + … + ad·xd`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LinearModelData")]
pub struct LinearModel {
    coefficients: Vec<f64>,
}

#[derive(Deserialize)]
struct LinearModelData {
    coefficients: Vec<f64>,
}

impl TryFrom<LinearModelData> for LinearModel {
    type Error = WordspaceError;

    fn try_from(raw: LinearModelData) -> Result<Self> {
        Self::from_coefficients(raw.coefficients)
    }
}

impl LinearModel {
    /// Least-squares fit of `targets` on `points` (one point per row) with an
    /// implicit intercept.
    ///
    /// Columns and targets are centered (and columns scaled to unit RMS)
    /// before solving, so inputs far from the origin keep their intercept.
    /// The intercept is recovered as `ȳ − Σ aᵢ·x̄ᵢ`.
    pub fn fit(points: &Matrix, targets: &[f64]) -> Result<Self> {
        if points.is_empty() {
            return Err(WordspaceError::EmptyInput("no points to fit".to_string()));
        }
        if targets.len() != points.rows() {
            return Err(WordspaceError::DimensionMismatch {
                expected: points.rows(),
                got: targets.len(),
            });
        }

        let n = points.rows() as f64;
        let means = points.column_means();
        let target_mean = targets.iter().sum::<f64>() / n;

        let mut centered = Matrix::zeros(points.rows(), points.cols());
        for (r, point) in points.iter_rows().enumerate() {
            for ((out, x), mean) in centered.row_mut(r).iter_mut().zip(point).zip(&means) {
                *out = x - mean;
            }
        }
        // Constant columns stay all-zero and get a zero slope
        let scales: Vec<f64> = (0..centered.cols())
            .map(|c| {
                let rms = (centered.column(c).iter().map(|x| x * x).sum::<f64>() / n).sqrt();
                if rms > 0.0 {
                    rms
                } else {
                    1.0
                }
            })
            .collect();
        for r in 0..centered.rows() {
            for (x, scale) in centered.row_mut(r).iter_mut().zip(&scales) {
                *x /= scale;
            }
        }
        let residuals: Vec<f64> = targets.iter().map(|y| y - target_mean).collect();

        let slopes: Vec<f64> = centered
            .least_squares(&residuals)?
            .into_iter()
            .zip(&scales)
            .map(|(a, scale)| a / scale)
            .collect();
        let intercept = target_mean
            - slopes
                .iter()
                .zip(&means)
                .map(|(a, mean)| a * mean)
                .sum::<f64>();

        let mut coefficients = Vec::with_capacity(slopes.len() + 1);
        coefficients.push(intercept);
        coefficients.extend(slopes);
        Ok(Self { coefficients })
    }

    /// Use known coefficients, intercept first.
    pub fn from_coefficients(coefficients: Vec<f64>) -> Result<Self> {
        if coefficients.is_empty() {
            return Err(WordspaceError::InvalidArgument(
                "coefficients need at least an intercept".to_string(),
            ));
        }
        Ok(Self { coefficients })
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Number of input dimensions.
    pub fn dimensions(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// `a0 + a·x` for one point.
    pub fn score(&self, point: &[f64]) -> Result<f64> {
        if point.len() != self.dimensions() {
            return Err(WordspaceError::DimensionMismatch {
                expected: self.dimensions(),
                got: point.len(),
            });
        }
        Ok(self.coefficients[0]
            + self.coefficients[1..]
                .iter()
                .zip(point)
                .map(|(a, x)| a * x)
                .sum::<f64>())
    }

    /// One prediction per row of `points`.
    pub fn predict(&self, points: &Matrix) -> Result<Vec<f64>> {
        points.iter_rows().map(|p| self.score(p)).collect()
    }
}

#[inline]
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Binary classifier: the sigmoid of a least-squares fit to 0/1 labels.
/// Returns label 1 when the sigmoid is at least 0.5.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    linear: LinearModel,
}

impl LogisticModel {
    pub fn fit(points: &Matrix, labels: &[u8]) -> Result<Self> {
        if let Some(bad) = labels.iter().find(|&&l| l > 1) {
            return Err(WordspaceError::InvalidArgument(format!(
                "logistic labels must be 0 or 1, got {}",
                bad
            )));
        }
        let targets: Vec<f64> = labels.iter().map(|&l| f64::from(l)).collect();
        Ok(Self {
            linear: LinearModel::fit(points, &targets)?,
        })
    }

    pub fn from_linear(linear: LinearModel) -> Self {
        Self { linear }
    }

    pub fn linear(&self) -> &LinearModel {
        &self.linear
    }

    pub fn probability(&self, point: &[f64]) -> Result<f64> {
        Ok(sigmoid(self.linear.score(point)?))
    }

    pub fn classify(&self, point: &[f64]) -> Result<u8> {
        Ok(u8::from(self.probability(point)? >= 0.5))
    }

    /// One label per row of `points`.
    pub fn predict(&self, points: &Matrix) -> Result<Vec<u8>> {
        points.iter_rows().map(|p| self.classify(p)).collect()
    }
}
