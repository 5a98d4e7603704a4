//! K-means clustering of projected points.
//!
//! Centers start at uniformly random integer coordinates inside the bounding
//! box of the points. Each round assigns every point to its nearest center
//! (squared Euclidean distance, first center wins ties) and moves every
//! center to the mean of its points; a center with no points stays put. The
//! loop ends when an assignment round changes nothing.

use crate::error::{Result, WordspaceError};
use crate::kernel::matrix::{squared_distance, Matrix};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Configuration for [`KMeans`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KMeansConfig {
    /// Seed for center initialization; `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Upper bound on assignment rounds.
    pub max_iterations: usize,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            seed: None,
            max_iterations: 1000,
        }
    }
}

/// Cluster centers and the assignment that produced them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterState {
    /// `[k × dimensions]`
    pub centers: Matrix,
    /// Center index per input point, in input order.
    pub assignments: Vec<usize>,
}

/// K-means clustering.
#[derive(Clone, Debug, Default)]
pub struct KMeans {
    config: KMeansConfig,
}

impl KMeans {
    pub fn new(config: KMeansConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &KMeansConfig {
        &self.config
    }

    /// Partition `points` (one per row) into `k` clusters.
    pub fn fit(&self, points: &Matrix, k: usize) -> Result<ClusterState> {
        let mut rng = match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        self.fit_with_rng(points, k, &mut rng)
    }

    pub fn fit_with_rng<R: Rng>(
        &self,
        points: &Matrix,
        k: usize,
        rng: &mut R,
    ) -> Result<ClusterState> {
        if k == 0 {
            return Err(WordspaceError::InvalidArgument(
                "number of clusters must be positive".to_string(),
            ));
        }
        if points.is_empty() {
            return Err(WordspaceError::EmptyInput("no points to cluster".to_string()));
        }

        let dims = points.cols();
        let mut centers = initial_centers(points, k, rng);
        let mut assignments: Vec<usize> = Vec::new();
        let mut iterations = 0;

        loop {
            let next = nearest_all(points, &centers);
            iterations += 1;
            if next == assignments {
                break;
            }
            assignments = next;

            let mut sums = Matrix::zeros(k, dims);
            let mut counts = vec![0usize; k];
            for (point, &c) in points.iter_rows().zip(&assignments) {
                counts[c] += 1;
                for (s, x) in sums.row_mut(c).iter_mut().zip(point) {
                    *s += x;
                }
            }
            for (c, &count) in counts.iter().enumerate() {
                if count == 0 {
                    continue;
                }
                let n = count as f64;
                for (center, sum) in centers.row_mut(c).iter_mut().zip(sums.row(c)) {
                    *center = sum / n;
                }
            }

            if iterations >= self.config.max_iterations {
                warn!(
                    iterations,
                    k, "k-means did not converge; returning last centers"
                );
                assignments = nearest_all(points, &centers);
                break;
            }
        }

        debug!(iterations, k, points = points.rows(), "k-means finished");
        Ok(ClusterState {
            centers,
            assignments,
        })
    }
}

/// Label each point with the index of its nearest center.
pub fn assign(points: &Matrix, centers: &Matrix) -> Result<Vec<usize>> {
    if centers.is_empty() {
        return Err(WordspaceError::EmptyInput("no cluster centers".to_string()));
    }
    if points.cols() != centers.cols() {
        return Err(WordspaceError::DimensionMismatch {
            expected: centers.cols(),
            got: points.cols(),
        });
    }
    Ok(nearest_all(points, centers))
}

fn nearest_all(points: &Matrix, centers: &Matrix) -> Vec<usize> {
    points.iter_rows().map(|p| nearest(p, centers)).collect()
}

fn nearest(point: &[f64], centers: &Matrix) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (j, center) in centers.iter_rows().enumerate() {
        let dist = squared_distance(point, center);
        if dist < best_dist {
            best = j;
            best_dist = dist;
        }
    }
    best
}

/// Random integer coordinates within each dimension's observed range. A
/// range containing no integer falls back to a uniform real draw.
fn initial_centers<R: Rng>(points: &Matrix, k: usize, rng: &mut R) -> Matrix {
    let dims = points.cols();
    let bounds: Vec<(f64, f64)> = (0..dims)
        .map(|d| {
            points
                .iter_rows()
                .map(|row| row[d])
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
                    (lo.min(x), hi.max(x))
                })
        })
        .collect();

    let mut centers = Matrix::zeros(k, dims);
    for c in 0..k {
        for (d, &(lo, hi)) in bounds.iter().enumerate() {
            let (ilo, ihi) = (lo.ceil(), hi.floor());
            let value = if ilo <= ihi {
                rng.gen_range(ilo as i64..=ihi as i64) as f64
            } else if lo < hi {
                rng.gen_range(lo..=hi)
            } else {
                lo
            };
            centers.set(c, d, value);
        }
    }
    centers
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    fn blobs() -> Matrix {
        Matrix::from_rows(&[
            [0.0, 0.0],
            [0.5, 0.2],
            [0.2, 0.6],
            [10.0, 10.0],
            [10.4, 9.8],
            [9.7, 10.3],
            [20.0, 0.0],
            [20.3, 0.4],
        ])
        .unwrap()
    }

    fn seeded(seed: u64) -> KMeans {
        KMeans::new(KMeansConfig {
            seed: Some(seed),
            ..KMeansConfig::default()
        })
    }

    #[test]
    fn test_shapes() {
        let points = blobs();
        for k in 1..=4 {
            let state = seeded(1).fit(&points, k).unwrap();
            assert_eq!(state.centers.rows(), k);
            assert_eq!(state.centers.cols(), 2);
            assert_eq!(state.assignments.len(), points.rows());
            assert!(state.assignments.iter().all(|&a| a < k));
        }
    }

    #[test]
    fn test_assign_reproduces_fit() {
        let points = blobs();
        for seed in 0..20 {
            let state = seeded(seed).fit(&points, 3).unwrap();
            let again = assign(&points, &state.centers).unwrap();
            assert_eq!(again, state.assignments, "seed {}", seed);
        }
    }

    #[test]
    fn test_deterministic_with_seed() {
        let points = blobs();
        assert_eq!(
            seeded(42).fit(&points, 3).unwrap(),
            seeded(42).fit(&points, 3).unwrap()
        );
    }

    #[test]
    fn test_single_cluster_is_mean() {
        let points = Matrix::column_vector(&[1.0, 2.0, 3.0, 6.0]);
        let state = seeded(3).fit(&points, 1).unwrap();
        assert_eq!(state.assignments, vec![0, 0, 0, 0]);
        assert_eq!(state.centers.row(0), &[3.0]);
    }

    #[test]
    fn test_empty_cluster_keeps_its_center() {
        // An all-zero generator starts every center at the low corner (0, 0).
        // Ties go to center 0, which then moves to the mean and keeps every
        // point, so centers 1 and 2 never receive one.
        let points = Matrix::from_rows(&[[0.0, 10.0], [10.0, 0.0], [10.0, 10.0]]).unwrap();
        let mut rng = StepRng::new(0, 0);
        let state = KMeans::default().fit_with_rng(&points, 3, &mut rng).unwrap();

        assert_eq!(state.assignments, vec![0, 0, 0]);
        assert_eq!(state.centers.row(1), &[0.0, 0.0]);
        assert_eq!(state.centers.row(2), &[0.0, 0.0]);
        let mean = 20.0 / 3.0;
        assert!(state.centers.row(0).iter().all(|&x| (x - mean).abs() < 1e-12));
    }

    #[test]
    fn test_fit_rejects_degenerate_input() {
        assert!(matches!(
            seeded(0).fit(&blobs(), 0),
            Err(WordspaceError::InvalidArgument(_))
        ));
        assert!(matches!(
            seeded(0).fit(&Matrix::zeros(0, 2), 2),
            Err(WordspaceError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_assign_nearest_and_ties() {
        let centers = Matrix::from_rows(&[[0.0], [2.0]]).unwrap();
        let points = Matrix::column_vector(&[-1.0, 1.0, 1.9, 5.0]);
        // 1.0 is equidistant: the first center wins.
        assert_eq!(assign(&points, &centers).unwrap(), vec![0, 0, 1, 1]);
    }

    #[test]
    fn test_assign_dimension_mismatch() {
        let centers = Matrix::from_rows(&[[0.0, 0.0]]).unwrap();
        let points = Matrix::column_vector(&[1.0]);
        assert!(matches!(
            assign(&points, &centers),
            Err(WordspaceError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_initial_centers_within_bounds() {
        let points = Matrix::from_rows(&[[0.2, -3.0], [0.8, 7.0]]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let centers = initial_centers(&points, 50, &mut rng);
        for row in centers.iter_rows() {
            assert!(row[0] >= 0.2 && row[0] <= 0.8);
            assert!(row[1] >= -3.0 && row[1] <= 7.0);
            assert_eq!(row[1].fract(), 0.0);
        }
    }
}
