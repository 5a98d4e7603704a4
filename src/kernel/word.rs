//! Word-weight vectors: the per-item feature representation.
//!
//! A [`WordWeightVector`] is an ordered list of unique `(word, weight)` pairs.
//! Canonical order is by word; every operation that compares two vectors
//! positionally relies on it.

use crate::error::{Result, WordspaceError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::ops::Index;

/// Maximum number of characters kept from a word. Longer words are truncated.
pub const MAX_WORD_LENGTH: usize = 32;

/// Truncate a word to [`MAX_WORD_LENGTH`] characters.
pub fn truncate_word(word: &str) -> &str {
    match word.char_indices().nth(MAX_WORD_LENGTH) {
        Some((end, _)) => &word[..end],
        None => word,
    }
}

/// Ordering applied by [`WordWeightVector::sort`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    /// Lexicographic by word (canonical)
    #[default]
    Word,
    /// Ascending by weight
    Weight,
}

/// A single word and its weight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WordWeight {
    word: String,
    weight: f64,
}

impl WordWeight {
    pub fn new(word: &str, weight: f64) -> Self {
        Self {
            word: truncate_word(word).to_string(),
            weight,
        }
    }

    pub fn word(&self) -> &str {
        &self.word
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

/// Ordered collection of unique `(word, weight)` pairs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WordWeightVector {
    entries: Vec<WordWeight>,
}

impl WordWeightVector {
    /// Create an empty vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a vector from `(word, weight)` pairs, summing the weights of
    /// repeated words. The result is in canonical (word) order.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut merged: BTreeMap<String, f64> = BTreeMap::new();
        for (word, weight) in pairs {
            *merged
                .entry(truncate_word(word.as_ref()).to_string())
                .or_insert(0.0) += weight;
        }
        Self::from_sorted_map(merged)
    }

    pub(crate) fn from_sorted_map(map: BTreeMap<String, f64>) -> Self {
        Self {
            entries: map
                .into_iter()
                .map(|(word, weight)| WordWeight { word, weight })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WordWeight> {
        self.entries.iter()
    }

    /// Words in current order.
    pub fn words(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.word.as_str()).collect()
    }

    /// Weights in current order.
    pub fn weights(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.weight).collect()
    }

    /// Weight of `word`, if present.
    pub fn get(&self, word: &str) -> Option<f64> {
        let word = truncate_word(word);
        self.entries
            .iter()
            .find(|e| e.word == word)
            .map(|e| e.weight)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.get(word).is_some()
    }

    /// Sum of all weights.
    pub fn total(&self) -> f64 {
        self.entries.iter().map(|e| e.weight).sum()
    }

    pub fn sort_by_word(&mut self) {
        self.entries.sort_by(|a, b| a.word.cmp(&b.word));
    }

    pub fn sort_by_weight(&mut self) {
        self.entries.sort_by(|a, b| a.weight.total_cmp(&b.weight));
    }

    pub fn sort(&mut self, order: SortOrder) {
        match order {
            SortOrder::Word => self.sort_by_word(),
            SortOrder::Weight => self.sort_by_weight(),
        }
    }

    /// True if the entries are in canonical order.
    pub fn is_canonical(&self) -> bool {
        self.entries.windows(2).all(|w| w[0].word < w[1].word)
    }

    /// Keep words with `minimum <= weight <= maximum`.
    ///
    /// With `reverse`, keep words with `weight < minimum` or `weight > maximum`
    /// instead.
    pub fn filter_by_weight(&mut self, minimum: f64, maximum: f64, reverse: bool) -> Result<()> {
        if minimum > maximum {
            return Err(WordspaceError::InvalidArgument(format!(
                "minimum {} exceeds maximum {}",
                minimum, maximum
            )));
        }
        self.entries.retain(|e| {
            let inside = e.weight >= minimum && e.weight <= maximum;
            inside != reverse
        });
        Ok(())
    }

    /// Keep only `words`, or with `reverse` drop them and keep everything else.
    pub fn filter_by_word<S: AsRef<str>>(&mut self, words: &[S], reverse: bool) {
        let set: HashSet<&str> = words.iter().map(|w| truncate_word(w.as_ref())).collect();
        self.entries
            .retain(|e| set.contains(e.word.as_str()) != reverse);
    }

    /// Append zero-weight entries for every word of `vocabulary` not already
    /// present. Order is left untouched; call [`sort`](Self::sort) afterwards.
    pub fn extend_zeros<S: AsRef<str>>(&mut self, vocabulary: &[S]) {
        let present: HashSet<String> = self.entries.iter().map(|e| e.word.clone()).collect();
        for word in vocabulary {
            let word = truncate_word(word.as_ref());
            if !present.contains(word) {
                self.entries.push(WordWeight::new(word, 0.0));
            }
        }
    }

    /// Scale weights into [-1, 1] by the largest absolute weight.
    ///
    /// A zero maximum uses a denominator of 1.
    pub fn scaled_to_max(&self) -> Self {
        let max = self
            .entries
            .iter()
            .map(|e| e.weight.abs())
            .fold(0.0f64, f64::max);
        let denom = if max == 0.0 { 1.0 } else { max };
        Self {
            entries: self
                .entries
                .iter()
                .map(|e| WordWeight {
                    word: e.word.clone(),
                    weight: e.weight / denom,
                })
                .collect(),
        }
    }
}

impl Index<usize> for WordWeightVector {
    type Output = WordWeight;

    fn index(&self, index: usize) -> &Self::Output {
        &self.entries[index]
    }
}

impl<'a> IntoIterator for &'a WordWeightVector {
    type Item = &'a WordWeight;
    type IntoIter = std::slice::Iter<'a, WordWeight>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<S: AsRef<str>> FromIterator<(S, f64)> for WordWeightVector {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_sorts_and_merges() {
        let v = WordWeightVector::from_pairs([("b", 1.0), ("a", 2.0), ("b", 3.0)]);
        assert_eq!(v.words(), vec!["a", "b"]);
        assert_eq!(v.weights(), vec![2.0, 4.0]);
        assert!(v.is_canonical());
    }

    #[test]
    fn test_truncation_is_consistent() {
        let long = "x".repeat(MAX_WORD_LENGTH + 8);
        let v = WordWeightVector::from_pairs([(long.as_str(), 1.0)]);
        assert_eq!(v[0].word().chars().count(), MAX_WORD_LENGTH);
        assert_eq!(v.get(&long), Some(1.0));
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let word = "é".repeat(40);
        assert_eq!(truncate_word(&word).chars().count(), MAX_WORD_LENGTH);
    }

    #[test]
    fn test_sort_by_weight_then_word() {
        let mut v = WordWeightVector::from_pairs([("a", 3.0), ("b", 1.0), ("c", 2.0)]);
        v.sort(SortOrder::Weight);
        assert_eq!(v.words(), vec!["b", "c", "a"]);
        assert!(!v.is_canonical());
        v.sort(SortOrder::default());
        assert_eq!(v.words(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_filter_by_weight() {
        let mut v = WordWeightVector::from_pairs([("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)]);
        v.filter_by_weight(2.0, 3.0, false).unwrap();
        assert_eq!(v.words(), vec!["b", "c"]);

        let mut v = WordWeightVector::from_pairs([("a", 1.0), ("b", 2.0), ("c", 3.0), ("d", 4.0)]);
        v.filter_by_weight(2.0, 3.0, true).unwrap();
        assert_eq!(v.words(), vec!["a", "d"]);
    }

    #[test]
    fn test_filter_by_weight_rejects_inverted_range() {
        let mut v = WordWeightVector::from_pairs([("a", 1.0)]);
        let err = v.filter_by_weight(3.0, 2.0, false).unwrap_err();
        assert!(matches!(err, WordspaceError::InvalidArgument(_)));
    }

    #[test]
    fn test_filter_by_word() {
        let mut keep = WordWeightVector::from_pairs([("a", 1.0), ("b", 2.0), ("c", 3.0)]);
        keep.filter_by_word(&["a", "c", "z"], false);
        assert_eq!(keep.words(), vec!["a", "c"]);

        let mut drop = WordWeightVector::from_pairs([("a", 1.0), ("b", 2.0), ("c", 3.0)]);
        drop.filter_by_word(&["a", "c"], true);
        assert_eq!(drop.words(), vec!["b"]);
    }

    #[test]
    fn test_extend_zeros() {
        let mut v = WordWeightVector::from_pairs([("b", 2.0)]);
        v.extend_zeros(&["a", "b", "c"]);
        v.sort_by_word();
        assert_eq!(v.words(), vec!["a", "b", "c"]);
        assert_eq!(v.weights(), vec![0.0, 2.0, 0.0]);
    }

    #[test]
    fn test_scaled_to_max() {
        let v = WordWeightVector::from_pairs([("a", 2.0), ("b", -4.0)]);
        assert_eq!(v.scaled_to_max().weights(), vec![0.5, -1.0]);

        let zeros = WordWeightVector::from_pairs([("a", 0.0)]);
        assert_eq!(zeros.scaled_to_max().weights(), vec![0.0]);
    }
}
