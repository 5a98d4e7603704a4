//! Projection of word vectors onto axes.
//!
//! A source vector need not share the axis vocabulary: words only in the
//! source are ignored, axis words missing from the source count as 0, and
//! the result is re-ordered to match the axis vocabulary before the dot
//! product.

use crate::error::{Result, WordspaceError};
use crate::kernel::matrix::Matrix;
use crate::kernel::source::WordVectorSource;
use crate::kernel::word::WordWeightVector;
use crate::learn::axes::Axes;
use std::collections::HashMap;

/// Projects word vectors onto a fixed set of axes.
pub struct Projector<'a> {
    axes: &'a Axes,
    /// Axis word -> row in the axis matrix
    index: HashMap<&'a str, usize>,
}

impl<'a> Projector<'a> {
    pub fn new(axes: &'a Axes) -> Self {
        let index = axes
            .words()
            .iter()
            .enumerate()
            .map(|(i, w)| (w.as_str(), i))
            .collect();
        Self { axes, index }
    }

    /// Re-express `source` in axis-vocabulary order.
    pub fn align(&self, source: &WordWeightVector) -> Vec<f64> {
        let mut aligned = vec![0.0; self.axes.words().len()];
        for entry in source {
            if let Some(&i) = self.index.get(entry.word()) {
                aligned[i] = entry.weight();
            }
        }
        aligned
    }

    /// Coordinates of `source` on every axis: `aligned(source) · axes`.
    pub fn project(&self, source: &WordWeightVector) -> Result<Vec<f64>> {
        self.axes.matrix().left_multiply(&self.align(source))
    }

    /// One row of coordinates per source.
    pub fn project_batch<'s, I>(&self, sources: I) -> Result<Matrix>
    where
        I: IntoIterator<Item = &'s WordWeightVector>,
    {
        let rows = sources
            .into_iter()
            .map(|s| self.project(s))
            .collect::<Result<Vec<_>>>()?;
        if rows.is_empty() {
            return Ok(Matrix::zeros(0, self.axes.len()));
        }
        Matrix::from_rows(&rows)
    }

    /// One row of coordinates per item. Every item must have a wordcount.
    pub fn project_items<T: WordVectorSource>(&self, items: &[T]) -> Result<Matrix> {
        let sources = items
            .iter()
            .map(|item| {
                item.wordcount().ok_or_else(|| {
                    WordspaceError::PreconditionNotMet("generate wordcounts first".to_string())
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.project_batch(sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::item::Document;

    fn wv(pairs: &[(&str, f64)]) -> WordWeightVector {
        WordWeightVector::from_pairs(pairs.iter().copied())
    }

    fn axes() -> Axes {
        Axes::from_vectors(
            &[
                wv(&[("a", 1.0), ("b", 2.0), ("c", 3.0)]),
                wv(&[("a", 2.0), ("b", 4.0), ("d", 1.0)]),
            ],
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_align_zero_fills_and_ignores_foreign_words() {
        let axes = axes();
        let projector = axes.projector();
        let aligned = projector.align(&wv(&[("d", 5.0), ("zebra", 9.0), ("a", 1.0)]));
        assert_eq!(aligned, vec![1.0, 0.0, 0.0, 5.0]);
    }

    #[test]
    fn test_unaligned_source_matches_aligned_source() {
        let axes = axes();
        let projector = axes.projector();
        let sparse = projector.project(&wv(&[("b", 1.0), ("extra", 100.0)])).unwrap();
        let full = projector
            .project(&wv(&[("a", 0.0), ("b", 1.0), ("c", 0.0), ("d", 0.0)]))
            .unwrap();
        assert_eq!(sparse, full);
        assert_eq!(sparse, vec![2.0, 4.0]);
    }

    #[test]
    fn test_batch_preserves_order() {
        let axes = axes();
        let sources = [wv(&[("c", 1.0)]), wv(&[("d", 1.0)]), wv(&[])];
        let m = axes.projector().project_batch(sources.iter()).unwrap();
        assert_eq!(m.rows(), 3);
        assert_eq!(m.row(0), &[3.0, 0.0]);
        assert_eq!(m.row(1), &[0.0, 1.0]);
        assert_eq!(m.row(2), &[0.0, 0.0]);
    }

    #[test]
    fn test_project_items_requires_wordcounts() {
        let axes = axes();
        let items = vec![Document::new(wv(&[("a", 1.0)])), Document::empty()];
        assert!(matches!(
            axes.projector().project_items(&items),
            Err(WordspaceError::PreconditionNotMet(_))
        ));
        let m = axes.projector().project_items(&items[..1]).unwrap();
        assert_eq!(m.row(0), &[1.0, 2.0]);
    }
}
