//! Stateful learner that keeps fitted axes and models between calls and
//! delegates to the [`learn`](crate::learn) layer.
//!
//! For full control, import from [`kernel`](crate::kernel) and
//! [`learn`](crate::learn) directly.

use crate::error::{Result, WordspaceError};
use crate::kernel::{ContentSource, Corpus, Matrix, WordCountOptions, WordVectorSource, WordWeightVector};
use crate::learn::{
    assign, Axes, Branching, ClusterState, DecisionTree, DecisionTreeLearner, KMeans,
    KMeansConfig, LinearModel, LogisticModel, TreeConfig,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for [`Learner`]. Every field falls back to its default when
/// missing from JSON.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerConfig {
    pub kmeans: KMeansConfig,
    pub tree: TreeConfig,
}

impl LearnerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Serializable fitted state of a [`Learner`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LearnerSnapshot<L> {
    pub config: LearnerConfig,
    pub axes: Option<Axes>,
    pub clusters: Option<ClusterState>,
    pub linear: Option<LinearModel>,
    pub logistic: Option<LogisticModel>,
    pub tree: Option<DecisionTree<L>>,
}

/// Keeps axes, cluster centers, regression models and a decision tree
/// together.
///
/// Operations that need fitted state fail with
/// [`PreconditionNotMet`](WordspaceError::PreconditionNotMet) until that
/// state exists, unless the caller supplies a replacement explicitly.
///
/// # Example
///
/// ```rust
/// use wordspace::highlevel::Learner;
/// use wordspace::kernel::{Corpus, Document, WordWeightVector};
///
/// let mut corpus = Corpus::new(vec![
///     Document::new(WordWeightVector::from_pairs([("cat", 3.0), ("dog", 1.0)])),
///     Document::new(WordWeightVector::from_pairs([("cat", 1.0), ("dog", 4.0)])),
///     Document::new(WordWeightVector::from_pairs([("cat", 2.0), ("bird", 2.0)])),
/// ]);
/// corpus.consolidate::<&str>(None, false).unwrap();
///
/// let mut learner: Learner = Learner::new();
/// learner.derive_axes(&corpus, Some(2)).unwrap();
/// let points = learner.project_corpus(&corpus).unwrap();
/// assert_eq!(points.rows(), 3);
/// assert_eq!(points.cols(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct Learner<L = i64> {
    config: LearnerConfig,
    axes: Option<Axes>,
    clusters: Option<ClusterState>,
    linear: Option<LinearModel>,
    logistic: Option<LogisticModel>,
    tree: Option<DecisionTree<L>>,
}

impl<L> Default for Learner<L> {
    fn default() -> Self {
        Self::with_config(LearnerConfig::default())
    }
}

fn missing(what: &str) -> WordspaceError {
    WordspaceError::PreconditionNotMet(format!("{} not available", what))
}

impl<L> Learner<L> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LearnerConfig) -> Self {
        Self {
            config,
            axes: None,
            clusters: None,
            linear: None,
            logistic: None,
            tree: None,
        }
    }

    pub fn config(&self) -> &LearnerConfig {
        &self.config
    }

    // =========================================================================
    // Axes
    // =========================================================================

    pub fn axes(&self) -> Option<&Axes> {
        self.axes.as_ref()
    }

    /// The axis vocabulary.
    pub fn words(&self) -> Result<&[String]> {
        Ok(self.require_axes()?.words())
    }

    pub fn set_axes(&mut self, axes: Axes) {
        self.axes = Some(axes);
    }

    /// Replace the axes with caller-supplied word vectors, one per axis.
    pub fn set_axis_vectors(
        &mut self,
        vectors: &[WordWeightVector],
        consolidated: bool,
    ) -> Result<&Axes> {
        let axes = Axes::from_vectors(vectors, consolidated)?;
        Ok(&*self.axes.insert(axes))
    }

    /// Derive principal axes from a consolidated corpus and keep them.
    pub fn derive_axes<T: WordVectorSource>(
        &mut self,
        corpus: &Corpus<T>,
        n: Option<usize>,
    ) -> Result<&Axes> {
        let axes = Axes::derive(corpus, n)?;
        Ok(&*self.axes.insert(axes))
    }

    /// Derive axes from the comment threads of a single item and keep them.
    pub fn comment_axes<S: ContentSource + ?Sized>(
        &mut self,
        source: &S,
        options: &WordCountOptions,
    ) -> Result<&Axes> {
        let axes = Axes::from_content(source, options)?;
        Ok(&*self.axes.insert(axes))
    }

    pub fn load_axes<P: AsRef<Path>>(&mut self, path: P) -> Result<&Axes> {
        let axes = Axes::load(path)?;
        Ok(&*self.axes.insert(axes))
    }

    pub fn save_axes<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.require_axes()?.save(path)
    }

    fn require_axes(&self) -> Result<&Axes> {
        self.axes.as_ref().ok_or_else(|| missing("axes"))
    }

    // =========================================================================
    // Projection
    // =========================================================================

    /// Coordinates of one word vector on the current axes.
    pub fn project(&self, source: &WordWeightVector) -> Result<Vec<f64>> {
        self.require_axes()?.project(source)
    }

    /// One row of coordinates per word vector.
    pub fn project_all<'s, I>(&self, sources: I) -> Result<Matrix>
    where
        I: IntoIterator<Item = &'s WordWeightVector>,
    {
        self.require_axes()?.projector().project_batch(sources)
    }

    /// One row of coordinates per corpus item.
    pub fn project_corpus<T: WordVectorSource>(&self, corpus: &Corpus<T>) -> Result<Matrix> {
        self.require_axes()?.projector().project_items(corpus.items())
    }

    // =========================================================================
    // Clustering
    // =========================================================================

    pub fn clusters(&self) -> Option<&ClusterState> {
        self.clusters.as_ref()
    }

    /// Run k-means on `points` and keep the resulting centers.
    pub fn k_means_cluster(&mut self, points: &Matrix, k: usize) -> Result<&ClusterState> {
        let state = KMeans::new(self.config.kmeans.clone()).fit(points, k)?;
        Ok(&*self.clusters.insert(state))
    }

    /// Nearest-center labels, against `centers` or the kept ones.
    pub fn assign_to_cluster(&self, points: &Matrix, centers: Option<&Matrix>) -> Result<Vec<usize>> {
        let centers = match centers {
            Some(centers) => centers,
            None => &self.clusters.as_ref().ok_or_else(|| missing("cluster centers"))?.centers,
        };
        assign(points, centers)
    }

    // =========================================================================
    // Regression
    // =========================================================================

    pub fn linear_model(&self) -> Option<&LinearModel> {
        self.linear.as_ref()
    }

    /// Fit `targets` on `points`; keep the model when `store` is set.
    pub fn linear_regression(
        &mut self,
        points: &Matrix,
        targets: &[f64],
        store: bool,
    ) -> Result<LinearModel> {
        let model = LinearModel::fit(points, targets)?;
        if store {
            self.linear = Some(model.clone());
        }
        Ok(model)
    }

    pub fn linear_prediction(
        &self,
        points: &Matrix,
        model: Option<&LinearModel>,
    ) -> Result<Vec<f64>> {
        let model = match model {
            Some(model) => model,
            None => self.linear.as_ref().ok_or_else(|| missing("linear model"))?,
        };
        model.predict(points)
    }

    pub fn logistic_model(&self) -> Option<&LogisticModel> {
        self.logistic.as_ref()
    }

    /// Fit and keep a logistic classifier for 0/1 labels.
    pub fn logistic_regression(&mut self, points: &Matrix, labels: &[u8]) -> Result<&LogisticModel> {
        let model = LogisticModel::fit(points, labels)?;
        Ok(&*self.logistic.insert(model))
    }

    pub fn logistic_prediction(
        &self,
        points: &Matrix,
        model: Option<&LogisticModel>,
    ) -> Result<Vec<u8>> {
        let model = match model {
            Some(model) => model,
            None => self.logistic.as_ref().ok_or_else(|| missing("logistic model"))?,
        };
        model.predict(points)
    }

    // =========================================================================
    // Decision tree
    // =========================================================================

    pub fn tree(&self) -> Option<&DecisionTree<L>> {
        self.tree.as_ref()
    }

    /// Build and keep a decision tree with the configured branching.
    pub fn decision_tree(&mut self, points: &Matrix, labels: &[L]) -> Result<&DecisionTree<L>>
    where
        L: Clone + Ord,
    {
        let tree = DecisionTreeLearner::new(self.config.tree.clone()).fit(points, labels)?;
        Ok(&*self.tree.insert(tree))
    }

    /// Build and keep a decision tree with explicit branching.
    pub fn decision_tree_with(
        &mut self,
        points: &Matrix,
        labels: &[L],
        branching: Branching,
    ) -> Result<&DecisionTree<L>>
    where
        L: Clone + Ord,
    {
        let config = TreeConfig {
            branching,
            ..self.config.tree.clone()
        };
        let tree = DecisionTreeLearner::new(config).fit(points, labels)?;
        Ok(&*self.tree.insert(tree))
    }

    /// Label-probability table per row of `points`.
    pub fn decision_prediction(&self, points: &Matrix) -> Result<Vec<&[(L, f64)]>> {
        self.tree
            .as_ref()
            .ok_or_else(|| missing("decision tree"))?
            .classify_batch(points)
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    pub fn snapshot(&self) -> LearnerSnapshot<L>
    where
        L: Clone,
    {
        LearnerSnapshot {
            config: self.config.clone(),
            axes: self.axes.clone(),
            clusters: self.clusters.clone(),
            linear: self.linear.clone(),
            logistic: self.logistic.clone(),
            tree: self.tree.clone(),
        }
    }

    pub fn from_snapshot(snapshot: LearnerSnapshot<L>) -> Self {
        Self {
            config: snapshot.config,
            axes: snapshot.axes,
            clusters: snapshot.clusters,
            linear: snapshot.linear,
            logistic: snapshot.logistic,
            tree: snapshot.tree,
        }
    }

    pub fn to_json(&self) -> Result<String>
    where
        L: Clone + Serialize,
    {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    /// Restore a learner from [`Learner::to_json`] output.
    ///
    /// Axes, matrices, models and trees are checked as they are read; a
    /// snapshot that would leave them inconsistent fails with
    /// [`WordspaceError::Json`].
    pub fn from_json(json: &str) -> Result<Self>
    where
        L: DeserializeOwned,
    {
        Ok(Self::from_snapshot(serde_json::from_str(json)?))
    }
}
