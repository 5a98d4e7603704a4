//! Breadth-first decision-tree learner with information-gain splits.
//!
//! Each node holds the label frequencies of the training points that reach
//! it. A node splits on the still-splittable axis with the largest positive
//! information gain; the chosen axis is not split again below it. Pure nodes
//! have zero gain and stay terminal.

use crate::error::{Result, WordspaceError};
use crate::kernel::matrix::Matrix;
use crate::learn::tree::{branch_index, DecisionTree, Split, TreeBuilder};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tracing::debug;

/// How each axis is divided into branches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Branching {
    /// `n` evenly spaced thresholds across every axis's observed range.
    Uniform(usize),
    /// Evenly spaced thresholds, count given per axis. `0` disables an axis.
    PerAxis(Vec<usize>),
    /// Explicit ascending thresholds per axis.
    Thresholds(Vec<Vec<f64>>),
}

impl Default for Branching {
    fn default() -> Self {
        Branching::Uniform(1)
    }
}

impl Branching {
    /// Expand into one ascending threshold list per axis of `points`.
    pub fn normalize(&self, points: &Matrix) -> Result<Vec<Vec<f64>>> {
        let dims = points.cols();
        match self {
            Branching::Uniform(n) => Ok((0..dims).map(|d| spaced(points, d, *n)).collect()),
            Branching::PerAxis(counts) => {
                if counts.len() != dims {
                    return Err(WordspaceError::InvalidArgument(format!(
                        "branch counts given for {} axes, points have {}",
                        counts.len(),
                        dims
                    )));
                }
                Ok(counts
                    .iter()
                    .enumerate()
                    .map(|(d, &n)| spaced(points, d, n))
                    .collect())
            }
            Branching::Thresholds(lists) => {
                if lists.len() != dims {
                    return Err(WordspaceError::InvalidArgument(format!(
                        "thresholds given for {} axes, points have {}",
                        lists.len(),
                        dims
                    )));
                }
                for (d, list) in lists.iter().enumerate() {
                    if list.iter().any(|t| !t.is_finite())
                        || list.windows(2).any(|w| w[0] >= w[1])
                    {
                        return Err(WordspaceError::InvalidArgument(format!(
                            "thresholds for axis {} must be finite and strictly ascending",
                            d
                        )));
                    }
                }
                Ok(lists.clone())
            }
        }
    }
}

/// `n` interior points dividing the observed range of axis `d` evenly.
fn spaced(points: &Matrix, d: usize, n: usize) -> Vec<f64> {
    if n == 0 || points.is_empty() {
        return Vec::new();
    }
    let (lo, hi) = points
        .iter_rows()
        .map(|row| row[d])
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), x| {
            (lo.min(x), hi.max(x))
        });
    let step = (hi - lo) / (n + 1) as f64;
    let mut thresholds: Vec<f64> = (1..=n).map(|j| lo + step * j as f64).collect();
    // a constant axis collapses to a single threshold
    thresholds.dedup();
    thresholds
}

/// Configuration for [`DecisionTreeLearner`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    pub branching: Branching,
    /// Gains at or below this count as no gain.
    pub min_gain: f64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            branching: Branching::default(),
            min_gain: 1e-12,
        }
    }
}

struct Pending<L> {
    indices: Vec<usize>,
    id: usize,
    parent: Option<usize>,
    splittable: Vec<usize>,
    /// Parent's table, used when no training point reaches this node
    inherited: Vec<(L, f64)>,
}

struct Candidate {
    axis: usize,
    gain: f64,
    partitions: Vec<Vec<usize>>,
}

#[derive(Clone, Debug, Default)]
pub struct DecisionTreeLearner {
    config: TreeConfig,
}

impl DecisionTreeLearner {
    pub fn new(config: TreeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// Build a tree from labeled points (one per row).
    pub fn fit<L: Clone + Ord>(&self, points: &Matrix, labels: &[L]) -> Result<DecisionTree<L>> {
        if points.is_empty() {
            return Err(WordspaceError::EmptyInput("no points to learn from".to_string()));
        }
        if labels.len() != points.rows() {
            return Err(WordspaceError::DimensionMismatch {
                expected: points.rows(),
                got: labels.len(),
            });
        }

        let thresholds = self.config.branching.normalize(points)?;
        let mut builder = TreeBuilder::new();
        let mut queue = VecDeque::new();
        queue.push_back(Pending {
            indices: (0..points.rows()).collect(),
            id: 0,
            parent: None,
            splittable: (0..points.cols())
                .filter(|&d| !thresholds[d].is_empty())
                .collect(),
            inherited: Vec::new(),
        });
        let mut next_id = 1;

        while let Some(pending) = queue.pop_front() {
            if pending.indices.is_empty() {
                builder.add_node(pending.id, pending.parent, None, pending.inherited);
                continue;
            }

            let table = probabilities(&pending.indices, labels);
            let parent_entropy = entropy(&table);
            let size = pending.indices.len() as f64;

            let mut best: Option<Candidate> = None;
            for &axis in &pending.splittable {
                let partitions = partition(points, &pending.indices, axis, &thresholds[axis]);
                let child_entropy: f64 = partitions
                    .iter()
                    .filter(|p| !p.is_empty())
                    .map(|p| entropy(&probabilities(p, labels)) * p.len() as f64 / size)
                    .sum();
                let gain = parent_entropy - child_entropy;
                if gain > self.config.min_gain && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(Candidate {
                        axis,
                        gain,
                        partitions,
                    });
                }
            }

            match best {
                None => builder.add_node(pending.id, pending.parent, None, table),
                Some(best) => {
                    let splittable: Vec<usize> = pending
                        .splittable
                        .iter()
                        .copied()
                        .filter(|&d| d != best.axis)
                        .collect();
                    for indices in best.partitions {
                        queue.push_back(Pending {
                            indices,
                            id: next_id,
                            parent: Some(pending.id),
                            splittable: splittable.clone(),
                            inherited: table.clone(),
                        });
                        next_id += 1;
                    }
                    builder.add_node(
                        pending.id,
                        pending.parent,
                        Some(Split::new(best.axis, thresholds[best.axis].clone())),
                        table,
                    );
                }
            }
        }

        let tree = builder.finalize()?;
        debug!(
            nodes = tree.len(),
            points = points.rows(),
            "decision tree built"
        );
        Ok(tree)
    }
}

/// `(label, frequency)` over the labels of `indices`, in label order.
fn probabilities<L: Clone + Ord>(indices: &[usize], labels: &[L]) -> Vec<(L, f64)> {
    let mut counts: BTreeMap<&L, usize> = BTreeMap::new();
    for &i in indices {
        *counts.entry(&labels[i]).or_insert(0) += 1;
    }
    let size = indices.len() as f64;
    counts
        .into_iter()
        .map(|(label, count)| (label.clone(), count as f64 / size))
        .collect()
}

/// `-Σ p·ln p`
fn entropy<L>(table: &[(L, f64)]) -> f64 {
    table
        .iter()
        .filter(|(_, p)| *p > 0.0)
        .map(|(_, p)| -p * p.ln())
        .sum()
}

/// Disjoint branches of `indices` on `axis`, one per threshold plus one.
fn partition(points: &Matrix, indices: &[usize], axis: usize, thresholds: &[f64]) -> Vec<Vec<usize>> {
    let mut branches = vec![Vec::new(); thresholds.len() + 1];
    for &i in indices {
        branches[branch_index(thresholds, points.get(i, axis))].push(i);
    }
    branches
}
