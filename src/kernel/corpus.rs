//! Corpus: a collection of items aligned onto one shared vocabulary.
//!
//! Consolidation makes every item's wordcount contain exactly the corpus
//! vocabulary, in canonical word order, zero-filling words an item never
//! used. Only then can weights be compared positionally across items.
//!
//! # Example
//!
//! ```rust
//! use wordspace::kernel::{Corpus, Document, WordWeightVector};
//!
//! let mut corpus = Corpus::new(vec![
//!     Document::new(WordWeightVector::from_pairs([("a", 1.0), ("b", 2.0)])),
//!     Document::new(WordWeightVector::from_pairs([("b", 1.0), ("c", 3.0)])),
//! ]);
//! corpus.consolidate::<&str>(None, false).unwrap();
//!
//! assert_eq!(corpus.words().unwrap(), vec!["a", "b", "c"]);
//! assert_eq!(corpus.aggregate().unwrap().weights(), vec![1.0, 3.0, 3.0]);
//! ```

use crate::error::{Result, WordspaceError};
use crate::kernel::matrix::Matrix;
use crate::kernel::source::{Comment, ContentSource, WordVectorSource};
use crate::kernel::word::{truncate_word, SortOrder, WordWeightVector};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;
use tracing::debug;

/// A collection of items plus their consolidated vocabulary.
#[derive(Clone, Debug)]
pub struct Corpus<T> {
    items: Vec<T>,
    /// Per-word sum of weights across items, set by `consolidate`
    aggregate: Option<WordWeightVector>,
    consolidated: bool,
}

impl<T> Default for Corpus<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            aggregate: None,
            consolidated: false,
        }
    }
}

impl<T: WordVectorSource> Corpus<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            aggregate: None,
            consolidated: false,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Mutable access to the items. Invalidates consolidation.
    pub fn items_mut(&mut self) -> &mut Vec<T> {
        self.consolidated = false;
        &mut self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    /// Add an item. Invalidates consolidation.
    pub fn push(&mut self, item: T) {
        self.consolidated = false;
        self.items.push(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_consolidated(&self) -> bool {
        self.consolidated
    }

    /// The aggregate wordcount from the last consolidation.
    pub fn aggregate(&self) -> Option<&WordWeightVector> {
        self.aggregate.as_ref()
    }

    /// The consolidated vocabulary, in canonical order.
    pub fn words(&self) -> Option<Vec<&str>> {
        self.aggregate.as_ref().map(|a| a.words())
    }

    /// Align every item onto a shared vocabulary.
    ///
    /// - `words = Some(w)`, `reverse = false`: the vocabulary is exactly `w`;
    ///   other words are removed from every item.
    /// - `words = Some(w)`, `reverse = true`: the words in `w` are removed and
    ///   the vocabulary is the union of what remains.
    /// - `words = None`: the vocabulary is the union of all words.
    ///
    /// Every item is then zero-filled to the full vocabulary and sorted by
    /// word. Returns the aggregate (per-word weight sum).
    pub fn consolidate<S: AsRef<str>>(
        &mut self,
        words: Option<&[S]>,
        reverse: bool,
    ) -> Result<&WordWeightVector> {
        if self.items.is_empty() {
            return Err(WordspaceError::PreconditionNotMet(
                "no items to consolidate".to_string(),
            ));
        }
        if self.items.iter().any(|item| item.wordcount().is_none()) {
            return Err(WordspaceError::PreconditionNotMet(
                "generate wordcounts first".to_string(),
            ));
        }

        let mut vocabulary: BTreeMap<String, f64> = BTreeMap::new();
        let strict = words.is_some() && !reverse;
        if let Some(words) = words {
            if !reverse {
                for w in words {
                    vocabulary.insert(truncate_word(w.as_ref()).to_string(), 0.0);
                }
            }
            for item in self.items.iter_mut() {
                if let Some(wc) = item.wordcount_mut() {
                    wc.filter_by_word(words, reverse);
                }
            }
        }

        for item in &self.items {
            let Some(wc) = item.wordcount() else { continue };
            for entry in wc {
                match vocabulary.get_mut(entry.word()) {
                    Some(total) => *total += entry.weight(),
                    None if !strict => {
                        vocabulary.insert(entry.word().to_string(), entry.weight());
                    }
                    None => {}
                }
            }
        }

        let aggregate = WordWeightVector::from_sorted_map(vocabulary);
        let vocab_words = aggregate.words();
        for item in self.items.iter_mut() {
            if let Some(wc) = item.wordcount_mut() {
                wc.extend_zeros(&vocab_words);
                wc.sort(SortOrder::Word);
            }
        }

        debug!(
            items = self.items.len(),
            vocabulary = aggregate.len(),
            "consolidated corpus"
        );
        self.consolidated = true;
        Ok(&*self.aggregate.insert(aggregate))
    }

    /// The consolidated `[items × vocabulary]` weight matrix.
    pub fn weight_matrix(&self) -> Result<Matrix> {
        self.require_consolidated()?;
        let rows: Vec<Vec<f64>> = self
            .items
            .iter()
            .map(|item| item.wordcount().map(|wc| wc.weights()).unwrap_or_default())
            .collect();
        Matrix::from_rows(&rows)
    }

    /// Per-word mean weight and population variance across items, in
    /// vocabulary order.
    pub fn baseline(&self) -> Result<(Vec<f64>, Vec<f64>)> {
        let matrix = self.weight_matrix()?;
        Ok((matrix.column_means(), matrix.column_variances()))
    }

    /// Vocabulary words by descending variance / mean ratio.
    ///
    /// Words that vary a lot relative to how common they are come first;
    /// re-consolidating with the head of this list prunes the vocabulary.
    pub fn rank_by_dispersion(&self) -> Result<Vec<(String, f64)>> {
        let (means, variances) = self.baseline()?;
        let words = self.words().unwrap_or_default();
        let mut ranked: Vec<(String, f64)> = words
            .into_iter()
            .zip(means.iter().zip(&variances))
            .map(|(w, (&m, &v))| {
                let ratio = if m == 0.0 { 0.0 } else { v / m };
                (w.to_string(), ratio)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(ranked)
    }

    /// Randomly partition the items: `fraction` of them (rounded down) in the
    /// first group, the rest in the second.
    pub fn split<R: Rng + ?Sized>(&self, fraction: f64, rng: &mut R) -> Result<(Vec<&T>, Vec<&T>)> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(WordspaceError::InvalidArgument(format!(
                "split fraction {} outside [0, 1]",
                fraction
            )));
        }
        let mut shuffled: Vec<&T> = self.items.iter().collect();
        shuffled.shuffle(rng);
        let n1 = (self.items.len() as f64 * fraction).floor() as usize;
        let second = shuffled.split_off(n1);
        Ok((shuffled, second))
    }

    fn require_consolidated(&self) -> Result<()> {
        if self.consolidated {
            Ok(())
        } else {
            Err(WordspaceError::PreconditionNotMet(
                "consolidate first".to_string(),
            ))
        }
    }
}

impl<T: WordVectorSource + ContentSource> Corpus<T> {
    /// Flattened content of every item, in item order.
    pub fn content(&self) -> impl Iterator<Item = (&Comment, usize)> {
        self.items.iter().flat_map(|item| item.flatten())
    }
}
