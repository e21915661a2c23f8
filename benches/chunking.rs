use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use docs_qa::embeddings::ChunkingConfig;
use docs_qa::embeddings::chunking::{chunk_document, split_text_into_chunks};
use std::hint::black_box;

const VOCABULARY: &[&str] = &[
    "retrieval", "vector", "document", "answer", "question", "context", "chunk", "overlap",
    "embedding", "model", "folder", "search", "index", "report", "pdf", "text",
];

fn synthetic_text(words: usize) -> String {
    (0..words)
        .map(|i| VOCABULARY[(i * 7 + i / 3) % VOCABULARY.len()])
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let config = ChunkingConfig::default();
    let mut group = c.benchmark_group("split_text_into_chunks");
    for words in [1_000, 10_000, 100_000] {
        let text = synthetic_text(words);
        group.bench_with_input(BenchmarkId::from_parameter(words), &text, |b, text| {
            b.iter(|| split_text_into_chunks(black_box(text), black_box(&config)));
        });
    }
    group.finish();

    let text = synthetic_text(10_000);
    c.bench_function("chunk_document", |b| {
        b.iter(|| chunk_document(black_box("handbook.md"), black_box(&text), black_box(&config)));
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
