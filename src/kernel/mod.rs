//! Kernel layer: word vectors, items, dense math and consolidation.
//!
//! - Word-weight vectors ([`WordWeightVector`])
//! - Item capabilities ([`WordVectorSource`], [`ContentSource`]) and the
//!   concrete item kinds in [`item`]
//! - Dense matrices and decompositions ([`Matrix`])
//! - Vocabulary consolidation ([`Corpus`])
//!
//! This layer has no dependencies on [`learn`](crate::learn) or
//! [`highlevel`](crate::highlevel).

pub mod corpus;
pub mod item;
pub mod matrix;
pub mod source;
pub mod word;

pub use corpus::Corpus;
pub use item::{Document, Network, Post, User};
pub use matrix::Matrix;
pub use source::{
    flatten, sanitize, Comment, ContentSource, Flatten, Populate, WeightFn, WordCountOptions,
    WordVectorSource,
};
pub use word::{SortOrder, WordWeight, WordWeightVector, MAX_WORD_LENGTH};
