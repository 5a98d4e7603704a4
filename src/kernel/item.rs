//! Concrete item kinds.
//!
//! These hold already-retrieved data; fetching them from a remote API is
//! outside this crate.

use crate::error::{Result, WordspaceError};
use crate::kernel::source::{
    flatten, word_counts, Comment, ContentSource, WordCountOptions, WordVectorSource,
};
use crate::kernel::word::WordWeightVector;
use serde::{Deserialize, Serialize};

/// Relations between items and the accounts around them.
pub trait Network {
    /// Authors of the comments on this item. With `replies`, authors of
    /// nested replies are included.
    fn commenter_ids(&self, replies: bool) -> Result<Vec<String>>;

    /// Ids of posts submitted by this item's account.
    fn post_ids(&self) -> Result<Vec<String>>;
}

/// A bare word vector with no content behind it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    wordcount: Option<WordWeightVector>,
}

impl Document {
    pub fn new(wordcount: WordWeightVector) -> Self {
        Self {
            wordcount: Some(wordcount),
        }
    }

    /// A document whose wordcount has not been populated yet.
    pub fn empty() -> Self {
        Self { wordcount: None }
    }

    pub fn into_wordcount(self) -> Option<WordWeightVector> {
        self.wordcount
    }
}

impl From<WordWeightVector> for Document {
    fn from(wordcount: WordWeightVector) -> Self {
        Self::new(wordcount)
    }
}

impl WordVectorSource for Document {
    fn wordcount(&self) -> Option<&WordWeightVector> {
        self.wordcount.as_ref()
    }

    fn wordcount_mut(&mut self) -> Option<&mut WordWeightVector> {
        self.wordcount.as_mut()
    }

    fn set_wordcount(&mut self, wordcount: WordWeightVector) {
        self.wordcount = Some(wordcount);
    }
}

/// A gallery post and its comment threads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author: Option<String>,
    pub points: f64,
    pub comments: Vec<Comment>,
    wordcount: Option<WordWeightVector>,
}

impl Post {
    pub fn new(id: &str, points: f64) -> Self {
        Self {
            id: id.to_string(),
            author: None,
            points,
            comments: Vec::new(),
            wordcount: None,
        }
    }

    pub fn with_author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    pub fn with_comments(mut self, comments: Vec<Comment>) -> Self {
        self.comments = comments;
        self
    }
}

impl WordVectorSource for Post {
    fn wordcount(&self) -> Option<&WordWeightVector> {
        self.wordcount.as_ref()
    }

    fn wordcount_mut(&mut self) -> Option<&mut WordWeightVector> {
        self.wordcount.as_mut()
    }

    fn set_wordcount(&mut self, wordcount: WordWeightVector) {
        self.wordcount = Some(wordcount);
    }
}

impl ContentSource for Post {
    fn score(&self) -> f64 {
        self.points
    }

    fn content(&self) -> &[Comment] {
        &self.comments
    }
}

impl Network for Post {
    fn commenter_ids(&self, replies: bool) -> Result<Vec<String>> {
        let ids = if replies {
            flatten(&self.comments).map(|(c, _)| c.author.clone()).collect()
        } else {
            self.comments.iter().map(|c| c.author.clone()).collect()
        };
        Ok(ids)
    }

    fn post_ids(&self) -> Result<Vec<String>> {
        Err(WordspaceError::NotApplicable(
            "a post has no submissions; use commenter_ids()".to_string(),
        ))
    }
}

/// An account: the comments it wrote and the posts it submitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub reputation: f64,
    pub comments: Vec<Comment>,
    pub submissions: Vec<String>,
    wordcount: Option<WordWeightVector>,
}

impl User {
    pub fn new(username: &str, reputation: f64) -> Self {
        Self {
            username: username.to_string(),
            reputation,
            comments: Vec::new(),
            submissions: Vec::new(),
            wordcount: None,
        }
    }

    pub fn with_comments(mut self, comments: Vec<Comment>) -> Self {
        self.comments = comments;
        self
    }

    pub fn with_submissions(mut self, ids: Vec<String>) -> Self {
        self.submissions = ids;
        self
    }
}

impl WordVectorSource for User {
    fn wordcount(&self) -> Option<&WordWeightVector> {
        self.wordcount.as_ref()
    }

    fn wordcount_mut(&mut self) -> Option<&mut WordWeightVector> {
        self.wordcount.as_mut()
    }

    fn set_wordcount(&mut self, wordcount: WordWeightVector) {
        self.wordcount = Some(wordcount);
    }
}

impl ContentSource for User {
    fn score(&self) -> f64 {
        self.reputation
    }

    fn content(&self) -> &[Comment] {
        &self.comments
    }

    /// A user's comments are all weighted as top-level: replies and nesting
    /// level are ignored regardless of `options`.
    fn generate_word_counts(&self, options: &WordCountOptions) -> WordWeightVector {
        let options = options
            .clone()
            .with_child_comments(false)
            .with_comment_level(false);
        word_counts(self.reputation, &self.comments, &options)
    }
}

impl Network for User {
    fn commenter_ids(&self, _replies: bool) -> Result<Vec<String>> {
        Err(WordspaceError::NotApplicable(
            "users have no commenters; use post_ids()".to_string(),
        ))
    }

    fn post_ids(&self) -> Result<Vec<String>> {
        Ok(self.submissions.clone())
    }
}
