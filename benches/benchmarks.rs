//! Benchmarks for wordspace operations.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use wordspace::kernel::{Corpus, Document, Matrix, WordWeightVector};
use wordspace::learn::{Axes, DecisionTreeLearner, KMeans, KMeansConfig};

// =============================================================================
// Synthetic corpus
// =============================================================================

/// `items` documents, each using a random subset of a `vocabulary`-word pool.
fn synthetic_corpus(items: usize, vocabulary: usize) -> Corpus<Document> {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let docs = (0..items)
        .map(|_| {
            let mut pairs: Vec<(String, f64)> = Vec::new();
            for w in 0..vocabulary {
                if rng.gen_bool(0.3) {
                    pairs.push((format!("word{}", w), rng.gen_range(1..20) as f64));
                }
            }
            Document::new(WordWeightVector::from_pairs(pairs))
        })
        .collect();
    Corpus::new(docs)
}

fn consolidated(items: usize, vocabulary: usize) -> Corpus<Document> {
    let mut corpus = synthetic_corpus(items, vocabulary);
    corpus
        .consolidate::<&str>(None, false)
        .expect("consolidate");
    corpus
}

fn random_points(n: usize, dims: usize) -> Matrix {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let data = (0..n * dims).map(|_| rng.gen_range(-10.0..10.0)).collect();
    Matrix::from_vec(n, dims, data).unwrap_or_else(|_| Matrix::zeros(n, dims))
}

fn benchmark_consolidate(c: &mut Criterion) {
    c.bench_function("consolidate_200x100", |b| {
        b.iter_batched(
            || synthetic_corpus(200, 100),
            |mut corpus| {
                corpus
                    .consolidate::<&str>(None, false)
                    .expect("consolidate");
                corpus
            },
            BatchSize::SmallInput,
        )
    });
}

fn benchmark_derive_axes(c: &mut Criterion) {
    let corpus = consolidated(200, 60);

    c.bench_function("derive_axes_200x60", |b| {
        b.iter(|| Axes::derive(black_box(&corpus), Some(5)))
    });
}

fn benchmark_projection(c: &mut Criterion) {
    let corpus = consolidated(200, 60);
    let axes = match Axes::derive(&corpus, Some(5)) {
        Ok(axes) => axes,
        Err(_) => return,
    };
    let source = synthetic_corpus(1, 80).into_items().remove(0);
    let Some(wordcount) = source.into_wordcount() else {
        return;
    };

    c.bench_function("project", |b| {
        b.iter(|| axes.project(black_box(&wordcount)))
    });
}

fn benchmark_kmeans(c: &mut Criterion) {
    let points = random_points(500, 5);
    let kmeans = KMeans::new(KMeansConfig {
        seed: Some(1),
        ..KMeansConfig::default()
    });

    c.bench_function("kmeans_500x5_k4", |b| {
        b.iter(|| kmeans.fit(black_box(&points), 4))
    });
}

fn benchmark_decision_tree(c: &mut Criterion) {
    let points = random_points(500, 5);
    let labels: Vec<u8> = points
        .iter_rows()
        .map(|p| u8::from(p[0] + p[2] > 0.0) + u8::from(p[1] > 5.0))
        .collect();
    let learner = DecisionTreeLearner::default();

    c.bench_function("decision_tree_500x5", |b| {
        b.iter(|| learner.fit(black_box(&points), black_box(&labels)))
    });
}

criterion_group!(
    benches,
    benchmark_consolidate,
    benchmark_derive_axes,
    benchmark_projection,
    benchmark_kmeans,
    benchmark_decision_tree,
);

criterion_main!(benches);
