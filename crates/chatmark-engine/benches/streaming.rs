use chatmark_engine::{Document, ParseOptions, Reconciler};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
mod common;

fn bench_full_reparse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    group.sample_size(10);
    let options = ParseOptions::default();

    for size in [10, 100] {
        let content = common::generate_markdown_content(size);
        group.bench_with_input(BenchmarkId::new("document", size), &content, |b, content| {
            b.iter(|| Document::parse(std::hint::black_box(content), &options));
        });
    }

    group.finish();
}

fn bench_streamed_reconcile(c: &mut Criterion) {
    let mut group = c.benchmark_group("stream");
    group.sample_size(10);
    let options = ParseOptions::default();
    let content = common::generate_markdown_content(20);
    let prefixes = common::stream_prefixes(&content, 64);

    group.bench_function("parse_and_reconcile_prefixes", |b| {
        b.iter(|| {
            let mut reconciler = Reconciler::new();
            for prefix in &prefixes {
                let doc = Document::parse(prefix, &options);
                std::hint::black_box(reconciler.reconcile_document(&doc));
            }
        });
    });

    let final_doc = Document::parse(&content, &options);
    group.bench_function("reconcile_unchanged", |b| {
        let mut reconciler = Reconciler::new();
        reconciler.reconcile_document(&final_doc);
        b.iter(|| std::hint::black_box(reconciler.reconcile_document(&final_doc)));
    });

    group.finish();
}

criterion_group!(benches, bench_full_reparse, bench_streamed_reconcile);
criterion_main!(benches);
