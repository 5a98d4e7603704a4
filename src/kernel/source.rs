//! Item capabilities: owning a word vector, and owning raw content.
//!
//! Items are opaque to the learning layer beyond two capabilities:
//!
//! - [`WordVectorSource`]: the item owns one [`WordWeightVector`] (its
//!   "wordcount").
//! - [`ContentSource`]: the item owns a forest of [`Comment`]s from which a
//!   wordcount can be generated.
//!
//! # Example
//!
//! ```rust
//! use wordspace::kernel::{Comment, ContentSource, WordCountOptions};
//! use wordspace::kernel::item::Post;
//!
//! let post = Post::new("p1", 10.0).with_comments(vec![
//!     Comment::new("alice", "Nice cat", 3.0).with_replies(vec![
//!         Comment::new("bob", "nice indeed", 1.0),
//!     ]),
//! ]);
//!
//! let levels: Vec<usize> = post.flatten().map(|(_, level)| level).collect();
//! assert_eq!(levels, vec![1, 2]);
//!
//! let wc = post.generate_word_counts(&WordCountOptions::default().with_child_comments(true));
//! assert_eq!(wc.get("nice"), Some(2.0));
//! ```

use crate::kernel::word::WordWeightVector;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Anything owning exactly one word vector.
pub trait WordVectorSource {
    /// The item's wordcount, `None` until populated.
    fn wordcount(&self) -> Option<&WordWeightVector>;

    fn wordcount_mut(&mut self) -> Option<&mut WordWeightVector>;

    fn set_wordcount(&mut self, wordcount: WordWeightVector);
}

/// A node of nested discussion content.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub text: String,
    /// Net votes on this comment
    pub points: f64,
    pub replies: Vec<Comment>,
}

impl Comment {
    pub fn new(author: &str, text: &str, points: f64) -> Self {
        Self {
            author: author.to_string(),
            text: text.to_string(),
            points,
            replies: Vec::new(),
        }
    }

    pub fn with_replies(mut self, replies: Vec<Comment>) -> Self {
        self.replies = replies;
        self
    }
}

/// Depth-first, pre-order traversal of a comment forest yielding
/// `(comment, level)`; top-level comments have level 1.
///
/// Uses an explicit stack, so arbitrarily deep threads cannot overflow.
pub struct Flatten<'a> {
    stack: Vec<(&'a Comment, usize)>,
}

impl<'a> Flatten<'a> {
    pub fn new(forest: &'a [Comment]) -> Self {
        Self {
            stack: forest.iter().rev().map(|c| (c, 1)).collect(),
        }
    }
}

impl<'a> Iterator for Flatten<'a> {
    type Item = (&'a Comment, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (comment, level) = self.stack.pop()?;
        self.stack
            .extend(comment.replies.iter().rev().map(|c| (c, level + 1)));
        Some((comment, level))
    }
}

/// Flatten a comment forest. See [`Flatten`].
pub fn flatten(forest: &[Comment]) -> Flatten<'_> {
    Flatten::new(forest)
}

/// Lower-case a sentence and split it on whitespace.
pub fn sanitize(sentence: &str) -> Vec<String> {
    sentence
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Weight hook: `(item_score, comment_score, nesting_level) -> weight` added
/// for every token occurrence.
pub type WeightFn = Arc<dyn Fn(f64, f64, usize) -> f64 + Send + Sync>;

/// Options for [`ContentSource::generate_word_counts`].
#[derive(Clone)]
pub struct WordCountOptions {
    /// Include replies (at their nesting level), not only top-level comments
    pub child_comments: bool,
    /// Pass comment votes to the hook; otherwise 1.0
    pub comment_votes: bool,
    /// Pass the nesting level to the hook; otherwise 1
    pub comment_level: bool,
    pub weight: WeightFn,
}

impl WordCountOptions {
    pub fn with_child_comments(mut self, on: bool) -> Self {
        self.child_comments = on;
        self
    }

    pub fn with_comment_votes(mut self, on: bool) -> Self {
        self.comment_votes = on;
        self
    }

    pub fn with_comment_level(mut self, on: bool) -> Self {
        self.comment_level = on;
        self
    }

    pub fn with_weight<F>(mut self, weight: F) -> Self
    where
        F: Fn(f64, f64, usize) -> f64 + Send + Sync + 'static,
    {
        self.weight = Arc::new(weight);
        self
    }
}

impl Default for WordCountOptions {
    /// Top-level comments only, every occurrence weighted 1 (word frequency).
    fn default() -> Self {
        Self {
            child_comments: false,
            comment_votes: true,
            comment_level: true,
            weight: Arc::new(|_, _, _| 1.0),
        }
    }
}

impl fmt::Debug for WordCountOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WordCountOptions")
            .field("child_comments", &self.child_comments)
            .field("comment_votes", &self.comment_votes)
            .field("comment_level", &self.comment_level)
            .finish_non_exhaustive()
    }
}

/// Anything owning raw discussion content.
pub trait ContentSource {
    /// Score of the item itself (post points, user reputation).
    fn score(&self) -> f64;

    /// Top-level comments.
    fn content(&self) -> &[Comment];

    /// Lazily flattened content with nesting levels. Restartable: every call
    /// starts a fresh traversal.
    fn flatten(&self) -> Flatten<'_> {
        flatten(self.content())
    }

    /// Build a wordcount from the content.
    fn generate_word_counts(&self, options: &WordCountOptions) -> WordWeightVector {
        word_counts(self.score(), self.content(), options)
    }
}

/// Shared word-count builder behind [`ContentSource::generate_word_counts`].
pub fn word_counts(score: f64, forest: &[Comment], options: &WordCountOptions) -> WordWeightVector {
    let iter: Box<dyn Iterator<Item = (&Comment, usize)>> = if options.child_comments {
        Box::new(flatten(forest))
    } else {
        Box::new(forest.iter().map(|c| (c, 1)))
    };

    let mut words: BTreeMap<String, f64> = BTreeMap::new();
    for (comment, level) in iter {
        let votes = if options.comment_votes { comment.points } else { 1.0 };
        let level = if options.comment_level { level } else { 1 };
        let weight = (options.weight)(score, votes, level);
        for token in sanitize(&comment.text) {
            *words.entry(token).or_insert(0.0) += weight;
        }
    }
    WordWeightVector::from_pairs(words)
}

/// Populate an item's own wordcount from its content.
pub trait Populate: ContentSource + WordVectorSource {
    fn populate(&mut self, options: &WordCountOptions) {
        let wordcount = self.generate_word_counts(options);
        self.set_wordcount(wordcount);
    }
}

impl<T: ContentSource + WordVectorSource> Populate for T {}
