//! # Wordspace: feature spaces from word frequencies
//!
//! Wordspace turns sparse per-item word-weight vectors (typically built from
//! discussion threads) into a shared numeric space and learns on it:
//! principal axes, projection, k-means clustering, linear and logistic
//! regression, and multi-way decision trees.
//!
//! ## Quick Start
//!
//! ```rust
//! use wordspace::kernel::{Comment, Corpus, Populate, Post, WordCountOptions};
//! use wordspace::highlevel::Learner;
//!
//! let options = WordCountOptions::default();
//! let mut posts = vec![
//!     Post::new("p1", 10.0).with_comments(vec![Comment::new("ann", "cats cats dogs", 3.0)]),
//!     Post::new("p2", 4.0).with_comments(vec![Comment::new("bob", "dogs birds", 1.0)]),
//!     Post::new("p3", 7.0).with_comments(vec![Comment::new("cy", "cats birds birds", 2.0)]),
//! ];
//! for post in &mut posts {
//!     post.populate(&options);
//! }
//!
//! // Align every post onto one vocabulary
//! let mut corpus = Corpus::new(posts);
//! corpus.consolidate::<&str>(None, false)?;
//!
//! // Principal axes, then coordinates of every post
//! let mut learner: Learner = Learner::new();
//! learner.derive_axes(&corpus, Some(2))?;
//! let points = learner.project_corpus(&corpus)?;
//!
//! let clusters = learner.k_means_cluster(&points, 2)?;
//! assert_eq!(clusters.assignments.len(), 3);
//! # Ok::<(), wordspace::WordspaceError>(())
//! ```
//!
//! ## Layers
//!
//! - [`kernel`]: word-weight vectors, item capabilities, dense matrices and
//!   vocabulary consolidation
//! - [`learn`]: axes, projection, clustering, regression and decision trees
//! - [`highlevel`]: [`Learner`](highlevel::Learner), which keeps fitted state
//!   between calls
//!
//! ## Logging
//!
//! Stage summaries are emitted through [`tracing`]. The crate never installs
//! a subscriber.

pub mod error;
pub mod highlevel;
pub mod kernel;
pub mod learn;

// Re-exports for convenience
pub use error::{Result, WordspaceError};
pub use highlevel::{Learner, LearnerConfig};
pub use kernel::{Corpus, Matrix, WordWeightVector};
pub use learn::{Axes, DecisionTree, KMeans, LinearModel, LogisticModel};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{Comment, Populate, Post, User, WordCountOptions, WordVectorSource};

    fn posts() -> Vec<Post> {
        vec![
            Post::new("p1", 10.0).with_comments(vec![
                Comment::new("ann", "cats are great cats", 3.0)
                    .with_replies(vec![Comment::new("bob", "dogs are better", 1.0)]),
                Comment::new("cy", "cats cats cats", 2.0),
            ]),
            Post::new("p2", 2.0).with_comments(vec![
                Comment::new("bob", "dogs dogs", 5.0),
                Comment::new("dee", "dogs and birds", 1.0),
            ]),
            Post::new("p3", 6.0).with_comments(vec![Comment::new("ann", "birds and cats", 4.0)]),
        ]
    }

    #[test]
    fn test_posts_to_points() {
        let options = WordCountOptions::default().with_child_comments(true);
        let mut items = posts();
        for post in &mut items {
            post.populate(&options);
        }
        let mut corpus = Corpus::new(items);
        corpus.consolidate::<&str>(None, false).unwrap();

        let mut learner: Learner = Learner::new();
        let axes = learner.derive_axes(&corpus, None).unwrap();
        assert_eq!(axes.words().len(), corpus.words().unwrap().len());

        let points = learner.project_corpus(&corpus).unwrap();
        assert_eq!(points.rows(), 3);

        // Projecting the consolidated wordcount directly gives the same row
        let first = corpus.items()[0].wordcount().unwrap();
        assert_eq!(learner.project(first).unwrap(), points.row(0));
    }

    #[test]
    fn test_weight_hook_sees_votes_and_levels() {
        let options = WordCountOptions::default()
            .with_child_comments(true)
            .with_weight(|_, votes, level| votes * level as f64);
        let mut post = posts().remove(0);
        post.populate(&options);
        let wc = post.wordcount().unwrap();
        // "dogs" only appears in a level-2 reply with 1 vote
        assert_eq!(wc.get("dogs"), Some(2.0));
        // "cats": 2 * 3 votes at level 1, 3 * 2 votes at level 1
        assert_eq!(wc.get("cats"), Some(12.0));
    }

    #[test]
    fn test_user_word_counts_ignore_replies() {
        let mut user = User::new("ann", 1.0).with_comments(vec![Comment::new(
            "ann",
            "top words",
            1.0,
        )
        .with_replies(vec![Comment::new("zed", "hidden reply", 1.0)])]);
        user.populate(&WordCountOptions::default().with_child_comments(true));
        let wc = user.wordcount().unwrap();
        assert!(wc.contains("top"));
        assert!(!wc.contains("hidden"));
    }
}
