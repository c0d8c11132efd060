use chatmark_engine::{Document, OutputFormat, ParseOptions};
use criterion::{Criterion, criterion_group, criterion_main};
mod common;

fn bench_serializers(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialize");
    group.sample_size(10);

    let content = common::generate_markdown_content(100);
    let doc = Document::parse(&content, &ParseOptions::default());

    for format in [
        OutputFormat::Markdown,
        OutputFormat::PlainUnicode,
        OutputFormat::Html,
    ] {
        group.bench_function(format.to_string(), |b| {
            b.iter(|| std::hint::black_box(&doc).to_string(format));
        });
    }

    group.bench_function("coalesce", |b| {
        b.iter(|| std::hint::black_box(&doc).coalesce().into_owned());
    });

    group.finish();
}

criterion_group!(benches, bench_serializers);
criterion_main!(benches);
