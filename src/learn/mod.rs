//! Learning layer: axes, projection, clustering, regression, decision trees.
//!
//! Everything here consumes the [`kernel`](crate::kernel) types and holds no
//! state beyond the models it returns. For a stateful wrapper that keeps the
//! fitted axes and models together, see [`highlevel`](crate::highlevel).

pub mod axes;
pub mod cluster;
pub mod decision;
pub mod projection;
pub mod regression;
pub mod tree;

pub use axes::Axes;
pub use cluster::{assign, ClusterState, KMeans, KMeansConfig};
pub use decision::{Branching, DecisionTreeLearner, TreeConfig};
pub use projection::Projector;
pub use regression::{sigmoid, LinearModel, LogisticModel};
pub use tree::{DecisionTree, Node, Split, TreeBuilder};
