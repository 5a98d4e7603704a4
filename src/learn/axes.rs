//! Principal axes in word-weight space.
//!
//! An [`Axes`] value is a `[|vocabulary| × k]` matrix whose column `i` is axis
//! `i`, together with the axis vocabulary its rows refer to. Projections
//! against the matrix must use that vocabulary, never the caller's.
//!
//! Axes come from three places:
//!
//! 1. [`Axes::derive`]: eigenvectors of the covariance of a consolidated
//!    corpus, largest variance first.
//! 2. [`Axes::from_vectors`]: caller-supplied word vectors, one per axis.
//! 3. [`Axes::load`]: a file written by [`Axes::save`].
//!
//! # File format
//!
//! Comma-separated text. The first record is the axis vocabulary; every
//! following record is one axis, its weights aligned with the vocabulary.

use crate::error::{Result, WordspaceError};
use crate::kernel::corpus::Corpus;
use crate::kernel::item::Document;
use crate::kernel::matrix::Matrix;
use crate::kernel::source::{word_counts, ContentSource, WordCountOptions, WordVectorSource};
use crate::kernel::word::{truncate_word, WordWeightVector};
use crate::learn::projection::Projector;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

/// A set of axes and the vocabulary they are expressed in.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AxesData")]
pub struct Axes {
    words: Vec<String>,
    /// Rows follow `words`, one column per axis.
    matrix: Matrix,
    /// Variance along each axis, when derived from data.
    eigenvalues: Option<Vec<f64>>,
}

#[derive(Deserialize)]
struct AxesData {
    words: Vec<String>,
    matrix: Matrix,
    eigenvalues: Option<Vec<f64>>,
}

impl TryFrom<AxesData> for Axes {
    type Error = WordspaceError;

    fn try_from(raw: AxesData) -> Result<Self> {
        let mut axes = Self::new(raw.words, raw.matrix)?;
        if let Some(values) = raw.eigenvalues {
            if values.len() != axes.len() {
                return Err(WordspaceError::DimensionMismatch {
                    expected: axes.len(),
                    got: values.len(),
                });
            }
            axes.eigenvalues = Some(values);
        }
        Ok(axes)
    }
}

impl Axes {
    /// Wrap an axis matrix. `matrix` must have one row per word.
    pub fn new(words: Vec<String>, matrix: Matrix) -> Result<Self> {
        if matrix.rows() != words.len() {
            return Err(WordspaceError::DimensionMismatch {
                expected: words.len(),
                got: matrix.rows(),
            });
        }
        Ok(Self {
            words,
            matrix,
            eigenvalues: None,
        })
    }

    /// Principal components of a consolidated corpus.
    ///
    /// Weights are mean-centered per word before the covariance is taken.
    /// Axes are ordered by descending eigenvalue; `n` keeps only the first
    /// `n`.
    pub fn derive<T: WordVectorSource>(corpus: &Corpus<T>, n: Option<usize>) -> Result<Self> {
        if !corpus.is_consolidated() {
            return Err(WordspaceError::PreconditionNotMet(
                "consolidate the corpus before deriving axes".to_string(),
            ));
        }
        let weights = corpus.weight_matrix()?;
        if weights.cols() == 0 {
            return Err(WordspaceError::EmptyInput(
                "corpus vocabulary is empty".to_string(),
            ));
        }

        let (mut values, mut vectors) = weights.covariance().symmetric_eigen()?;
        if let Some(n) = n {
            values.truncate(n);
            vectors = vectors.truncate_columns(n);
        }
        let words = corpus
            .words()
            .unwrap_or_default()
            .into_iter()
            .map(str::to_string)
            .collect();

        debug!(
            vocabulary = weights.cols(),
            items = weights.rows(),
            axes = vectors.cols(),
            "derived principal axes"
        );
        Ok(Self {
            words,
            matrix: vectors,
            eigenvalues: Some(values),
        })
    }

    /// Axes from caller-supplied word vectors, one vector per axis.
    ///
    /// Unless `consolidated` is set, the vectors are first aligned onto the
    /// union of their vocabularies (missing words weigh 0). With
    /// `consolidated`, every vector must already list the same words in the
    /// same order.
    pub fn from_vectors(axes: &[WordWeightVector], consolidated: bool) -> Result<Self> {
        let first = axes
            .first()
            .ok_or_else(|| WordspaceError::EmptyInput("no axis vectors".to_string()))?;

        if consolidated {
            let words = first.words();
            if let Some(bad) = axes.iter().find(|a| a.words() != words) {
                return Err(WordspaceError::InvalidArgument(format!(
                    "axis vocabularies differ ({} vs {} words); pass consolidated = false",
                    words.len(),
                    bad.len()
                )));
            }
            let columns: Vec<Vec<f64>> = axes.iter().map(|a| a.weights()).collect();
            let words = words.into_iter().map(str::to_string).collect();
            return Self::new(words, Matrix::from_columns(&columns)?);
        }

        let mut corpus = Corpus::new(axes.iter().cloned().map(Document::new).collect());
        corpus.consolidate::<&str>(None, false)?;
        let columns: Vec<Vec<f64>> = corpus
            .items()
            .iter()
            .map(|d| d.wordcount().map(|wc| wc.weights()).unwrap_or_default())
            .collect();
        let words = corpus
            .words()
            .unwrap_or_default()
            .into_iter()
            .map(str::to_string)
            .collect();
        Self::new(words, Matrix::from_columns(&columns)?)
    }

    /// Principal components of the individual comment threads of one item.
    ///
    /// Every top-level comment (with its replies, if `options.child_comments`)
    /// becomes one document; the documents are consolidated and their axes
    /// derived. Each thread is counted as a standalone item of score 1, so
    /// the weight hook never sees `source.score()`.
    pub fn from_content<S: ContentSource + ?Sized>(
        source: &S,
        options: &WordCountOptions,
    ) -> Result<Self> {
        let threads = source.content();
        if threads.is_empty() {
            return Err(WordspaceError::EmptyInput(
                "source has no comments".to_string(),
            ));
        }
        let documents = threads
            .iter()
            .map(|thread| {
                Document::new(word_counts(1.0, std::slice::from_ref(thread), options))
            })
            .collect();
        let mut corpus = Corpus::new(documents);
        corpus.consolidate::<&str>(None, false)?;
        Self::derive(&corpus, None)
    }

    /// The axis vocabulary, in row order.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// The `[|vocabulary| × k]` axis matrix.
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn eigenvalues(&self) -> Option<&[f64]> {
        self.eigenvalues.as_deref()
    }

    /// Number of axes.
    pub fn len(&self) -> usize {
        self.matrix.cols()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.cols() == 0
    }

    /// Axis `i` as a word vector.
    pub fn axis(&self, i: usize) -> Option<WordWeightVector> {
        if i >= self.len() {
            return None;
        }
        Some(WordWeightVector::from_pairs(
            self.words
                .iter()
                .zip(self.matrix.column(i))
                .map(|(w, x)| (w.as_str(), x)),
        ))
    }

    pub fn projector(&self) -> Projector<'_> {
        Projector::new(self)
    }

    /// Project one word vector. See [`Projector::project`].
    pub fn project(&self, source: &WordWeightVector) -> Result<Vec<f64>> {
        self.projector().project(source)
    }

    /// Write the axes as CSV to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.write_to(File::create(path)?)
    }

    /// Read axes written by [`save`](Self::save).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::read_from(File::open(path)?)
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut w = csv::Writer::from_writer(writer);
        w.write_record(&self.words)?;
        for c in 0..self.matrix.cols() {
            w.write_record(self.matrix.column(c).iter().map(|x| x.to_string()))?;
        }
        w.flush()?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: R) -> Result<Self> {
        let mut r = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(reader);
        let mut records = r.records();

        let header = records.next().ok_or_else(|| {
            WordspaceError::EmptyInput("axis file has no vocabulary record".to_string())
        })??;
        let words: Vec<String> = header
            .iter()
            .map(|w| truncate_word(w).to_string())
            .collect();

        let mut rows: Vec<Vec<f64>> = Vec::new();
        for (line, record) in records.enumerate() {
            let record = record?;
            let row = record
                .iter()
                .map(|v| {
                    v.trim().parse::<f64>().map_err(|e| {
                        WordspaceError::InvalidArgument(format!(
                            "axis {}: bad weight {:?}: {}",
                            line, v, e
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            rows.push(row);
        }

        let matrix = if rows.is_empty() {
            Matrix::zeros(words.len(), 0)
        } else {
            Matrix::from_columns(&rows)?
        };
        Self::new(words, matrix)
    }
}
